use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by a [`crate::PackageDatabase`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error reading/writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line_no} in {path}: {content:?}")]
    MalformedLine {
        path: PathBuf,
        line_no: usize,
        content: String,
    },

    #[error("invalid hash on line {line_no} in {path}: {source}")]
    InvalidHash {
        path: PathBuf,
        line_no: usize,
        #[source]
        source: hex::FromHexError,
    },

    #[error("dump is not supported by this database backend")]
    DumpUnsupported,

    #[error("load is not supported by this database backend")]
    LoadUnsupported,

    #[error("preload is not supported by this database backend")]
    PreloadUnsupported,
}
