//! The abstract database contract (spec.md §4.4 "Database abstraction",
//! §5 concurrency contract). Relational and in-memory backends both
//! implement this trait; only the in-memory one is provided here (spec.md
//! §1: "Database backends ... Only the abstract contract is specified").

use std::collections::{HashMap, HashSet};

use libdetect_core::Fingerprint;

use crate::error::Result;
use crate::types::{LibInfo, PkgInfo};

/// Logical `packages`/`libraries` tables plus the allowlist/lib-name sets a
/// backend owns (spec.md §3 "Database logical schema", §9 supplemented
/// feature: `api_set`/`lib_set` live on the database, not a free global).
pub trait PackageDatabase {
    /// The fixed set of framework API signatures used to build package
    /// trees against this database's reference data.
    fn api_allowlist(&self) -> &HashSet<String>;

    /// Canonical library names known to this database, used to break
    /// certain naming ties (spec.md §9 supplemented feature).
    fn lib_set(&self) -> &HashSet<String>;

    /// Every `(hash, name)` pair in the `libraries` table matching any of
    /// `hashes`. A read; multiple concurrent readers are allowed (spec.md §5).
    fn match_libs(&self, hashes: &[Fingerprint]) -> Result<HashMap<Fingerprint, Vec<String>>>;

    /// Insert-or-increment-count each package observation. Must be atomic
    /// per batch (spec.md §5).
    fn add_pkgs(&mut self, pkgs: &[PkgInfo]) -> Result<()>;

    /// Decrement the observation count for each package (symmetric with
    /// [`Self::add_pkgs`], used when replacing an older APK version).
    fn remove_pkgs(&mut self, pkgs: &[PkgInfo]) -> Result<()>;

    /// All `(hash, name, weight)` triples observed at least `threshold` times.
    fn get_pkgs(&self, threshold: u32) -> Result<Vec<PkgInfo>>;

    /// Insert canonical library records.
    fn add_libs(&mut self, libs: &[LibInfo]) -> Result<()>;

    /// Bulk-load the libraries table into memory for faster subsequent
    /// `match_libs` calls (spec.md §5, §9 supplemented feature). Backends
    /// for which this is meaningless (e.g. an already-resident in-memory
    /// store) may no-op.
    fn preload(&mut self) -> Result<()> {
        Ok(())
    }

    /// Persist in-memory state to durable storage. Relational backends
    /// should return [`crate::error::Error::DumpUnsupported`] rather than
    /// silently doing nothing (spec.md §7).
    fn dump(&self) -> Result<()>;

    /// Load durable state into memory.
    fn load(&mut self) -> Result<()>;
}
