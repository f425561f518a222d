//! Observation storage for the libdetect fingerprint database.
//!
//! This crate is the Rust analogue of the reference implementation's
//! `db.py`/`memdb.py`/`sqldb.py`: an abstract [`PackageDatabase`] contract
//! plus a concrete in-memory backend. A relational backend is out of scope
//! (spec.md §1 Non-goals) but would implement the same trait.

mod database;
mod error;
mod memory;
mod types;

pub use database::PackageDatabase;
pub use error::{Error, Result};
pub use memory::InMemoryDatabase;
pub use types::{LibInfo, PkgInfo};
