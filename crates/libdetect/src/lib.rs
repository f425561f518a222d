//! Third-party library detection for Android DEX bytecode via structural
//! fingerprinting of package subtrees.
//!
//! This crate is the public façade: it wires [`libdetect_core`]'s
//! fingerprinting engine, [`libdetect_db`]'s storage abstraction, and
//! [`libdetect_corpus`]'s ingestion/distillation pipeline together behind
//! the operations spec.md §6 names, and adds APK (zip) iteration over
//! `classes.dex`, `classes2.dex`, … DEX parsing itself is out of scope
//! (spec.md §9 Non-goals); callers inject a [`analyzer::DexParser`].

mod analyzer;
mod apk;
mod context;
mod error;

pub use analyzer::{
    add_apk_to_database, add_dex_to_database, detect_apk_libraries, detect_dex_libraries, detect_exact_apk_libraries,
    detect_exact_dex_libraries, dump_database, load_database, remove_apk_from_database, remove_dex_from_database,
    run_update_library_database, DexParser,
};
pub use apk::read_dex_entries;
pub use context::AnalysisContext;
pub use error::{ApkOutcome, DexFailure, Error, Result};

pub use libdetect_core::{parse_allowlist, Dex, DexClass, DexMethod, PackageName, PkgResult, Thresholds};
pub use libdetect_db::{InMemoryDatabase, LibInfo, PackageDatabase, PkgInfo};

/// The bundled default API allowlist (spec.md §6 "Resources bundled with
/// the implementation"). This is a small illustrative seed set; a real
/// deployment ships its own `apis.txt` derived from the framework API
/// surface and calls [`parse_allowlist`] on its contents instead.
pub const DEFAULT_API_ALLOWLIST: &str = include_str!("../resources/apis.txt");

/// The bundled optional pre-seeded canonical library name set (spec.md §6).
pub const DEFAULT_LIB_NAMES: &str = include_str!("../resources/libs.txt");
