pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the public façade. Wraps the core/db crates' own
/// error types plus the APK (zip) I/O this layer owns (spec.md §9 "the
/// `libdetect` façade's APK handling is a thin wrapper over
/// `zip::ZipArchive`").
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] libdetect_core::Error),

    #[error(transparent)]
    Db(#[from] libdetect_db::Error),

    #[error("io error reading apk: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open apk as a zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("apk contains no classes.dex entry")]
    NoDexEntries,
}

/// One failed DEX within an otherwise-succeeding APK scan (spec.md §7: the
/// core reports rather than retries, but "higher layers ... may wrap
/// per-APK calls and continue on failure").
#[derive(Debug)]
pub struct DexFailure {
    pub entry_name: String,
    pub error: Error,
}

/// The result of scanning every `classes*.dex` entry in an APK: successful
/// per-DEX results unioned together, plus a record of any entry that failed
/// to parse or analyze rather than aborting the whole APK.
#[derive(Debug)]
pub struct ApkOutcome<T> {
    pub result: T,
    pub failures: Vec<DexFailure>,
}
