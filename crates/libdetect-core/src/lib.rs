//! Structural fingerprinting engine for third-party library detection in
//! Android DEX bytecode.
//!
//! This crate owns the hard part: building a [`tree::PackageTree`] from a
//! DEX's classes, fingerprinting it in a way that survives renaming, and
//! matching it (exactly or partially) against a reference set of known
//! library fingerprints. DEX parsing, APK containers, persistence backends
//! and orchestration live one layer up, in `libdetect-db`, `libdetect-corpus`
//! and `libdetect`.

mod allowlist;
mod dex;
mod error;
mod hash;
mod matcher;
mod package_name;
mod thresholds;
mod tree;

pub use allowlist::parse_allowlist;
pub use dex::{Dex, DexClass, DexMethod};
pub use error::{Error, Result};
pub use hash::{Fingerprint, Hasher};
pub use matcher::{apply_exact_matches, detect_exact_libs, detect_libs, propagate_partial_matches, PkgResult};
pub use package_name::PackageName;
pub use thresholds::Thresholds;
pub use tree::{PackageTree, TreeNode};
