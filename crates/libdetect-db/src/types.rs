//! Observation records exchanged between the fingerprinting engine, the
//! corpus pipeline, and the database (spec.md §3 `PkgInfo`/`LibInfo`).

use libdetect_core::Fingerprint;
use serde::{Deserialize, Serialize};

/// A per-package observation extracted from one DEX.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PkgInfo {
    pub hash: Fingerprint,
    pub name: String,
    pub weight: u32,
}

/// A canonical library record in the `libraries` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibInfo {
    pub hash: Fingerprint,
    pub name: String,
}
