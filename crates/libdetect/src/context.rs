//! Process-wide collaborators frozen during analysis (spec.md §9 "state
//! lifecycle": "the database handle and thresholds are process-wide
//! collaborators initialized at startup, frozen during analysis").

use libdetect_core::Thresholds;
use libdetect_db::PackageDatabase;

/// Holds the active database backend and thresholds, passed into every
/// analyzer operation rather than read from hidden globals.
///
/// `set_database`/`set_thresholds` correspond to spec.md §6's operations of
/// the same name; per spec.md, calling them while an analysis is in flight
/// has undefined effect, so callers should treat this as single-threaded
/// setup followed by read-mostly use.
pub struct AnalysisContext {
    db: Box<dyn PackageDatabase>,
    thresholds: Thresholds,
    include_subpkgs: bool,
}

impl AnalysisContext {
    #[must_use]
    pub fn new(db: Box<dyn PackageDatabase>, thresholds: Thresholds) -> Self {
        thresholds.warn_if_inconsistent();
        Self {
            db,
            thresholds,
            include_subpkgs: true,
        }
    }

    pub fn set_database(&mut self, db: Box<dyn PackageDatabase>) {
        self.db = db;
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        thresholds.warn_if_inconsistent();
        self.thresholds = thresholds;
    }

    /// Whether a subpackage's own match is suppressed when it names the
    /// same library as an ancestor's chosen match (spec.md §4.5 "subpackage
    /// filter"). Defaults to `true` (subpackages are reported).
    pub fn set_include_subpkgs(&mut self, include: bool) {
        self.include_subpkgs = include;
    }

    #[must_use]
    pub fn database(&self) -> &dyn PackageDatabase {
        self.db.as_ref()
    }

    pub fn database_mut(&mut self) -> &mut dyn PackageDatabase {
        self.db.as_mut()
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn include_subpkgs(&self) -> bool {
        self.include_subpkgs
    }
}
