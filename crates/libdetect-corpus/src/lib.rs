//! Ingestion (clustering) and distillation pipeline: turns per-DEX
//! observations into the canonical `libraries` table consumed by the
//! matcher (spec.md §4.6, §4.7).

mod clusterer;
mod distiller;

pub use clusterer::extract_pkgs;
pub use distiller::{distill, filter_best_names, name_better, update_library_database};
