//! Distillation: promote frequently-observed packages into canonical
//! library records (spec.md §4.7).

use std::collections::HashMap;

use libdetect_core::{Fingerprint, Thresholds};
use libdetect_db::{LibInfo, PackageDatabase, PkgInfo};

/// `name_better(a, b)`: true iff `a` strictly dominates `b` as a candidate
/// library identifier.
///
/// Segments are compared right-to-left. Rule O favors a name with at least
/// one unobfuscated segment over one that is entirely single-letter
/// segments; Rule D favors fewer path segments; Rule P allows `a` to win
/// even when a segment differs, as long as the corresponding segment of `b`
/// is a single letter (an obfuscated segment of `b` that `a` resolved).
#[must_use]
pub fn name_better(a: &str, b: &str) -> bool {
    let parts_a = reversed_segments(a);
    let parts_b = reversed_segments(b);

    let max_len_a = parts_a.iter().map(|p| p.len()).max().unwrap_or(0);
    let max_len_b = parts_b.iter().map(|p| p.len()).max().unwrap_or(0);

    if max_len_a > 1 && max_len_b <= 1 {
        return true;
    }
    if max_len_b > 1 && max_len_a <= 1 {
        return false;
    }
    if parts_a.len() > parts_b.len() {
        return false;
    }

    for i in 0..parts_a.len() {
        if parts_a[i] == parts_b[i] {
            continue;
        }
        if parts_b[i].len() == 1 {
            continue;
        }
        return false;
    }
    true
}

/// `L`-prefixed descriptor, split on `/` and reversed, per spec.md §4.7.
fn reversed_segments(name: &str) -> Vec<&str> {
    let stripped = name.strip_prefix('L').unwrap_or(name);
    let mut parts: Vec<&str> = stripped.split('/').collect();
    parts.reverse();
    parts
}

/// Keep only the names in `names` not dominated by any other name in the
/// group.
///
/// spec.md §9 flags that mutating the working set mid-sweep makes the
/// result order-dependent; this computes every "dominated" flag against the
/// original set first, then filters in a second pass, so the surviving set
/// does not depend on iteration order.
#[must_use]
pub fn filter_best_names(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    let dominated: Vec<bool> = names
        .iter()
        .enumerate()
        .map(|(i, ni)| names.iter().enumerate().any(|(j, nj)| i != j && name_better(nj, ni)))
        .collect();
    names
        .into_iter()
        .zip(dominated)
        .filter_map(|(name, is_dominated)| if is_dominated { None } else { Some(name) })
        .collect()
}

/// Read every package observed at least `MinLibCount` times, group by hash,
/// keep only the surviving names per group, and insert them into the
/// database's `libraries` table.
pub fn update_library_database(db: &mut dyn PackageDatabase, thresholds: &Thresholds) -> libdetect_db::Result<()> {
    let observed = db.get_pkgs(thresholds.min_lib_count)?;
    tracing::debug!(target = "libdetect.corpus", observed = observed.len(), "distilling observed packages");

    let mut names_by_hash: HashMap<Fingerprint, Vec<String>> = HashMap::new();
    for pkg in observed {
        let names = names_by_hash.entry(pkg.hash).or_default();
        if !names.contains(&pkg.name) {
            names.push(pkg.name);
        }
    }

    let mut libs = Vec::new();
    for (hash, names) in names_by_hash {
        for name in filter_best_names(names) {
            libs.push(LibInfo { hash, name });
        }
    }
    tracing::debug!(target = "libdetect.corpus", groups = libs.len(), "distilled library records");

    db.add_libs(&libs)
}

/// Re-export for callers that already have a grouped batch of observations
/// (e.g. a test harness) and don't want to go through a live database.
#[must_use]
pub fn distill(pkgs: Vec<PkgInfo>) -> Vec<LibInfo> {
    let mut names_by_hash: HashMap<Fingerprint, Vec<String>> = HashMap::new();
    for pkg in pkgs {
        let names = names_by_hash.entry(pkg.hash).or_default();
        if !names.contains(&pkg.name) {
            names.push(pkg.name);
        }
    }
    let mut libs = Vec::new();
    for (hash, names) in names_by_hash {
        for name in filter_best_names(names) {
            libs.push(LibInfo { hash, name });
        }
    }
    libs
}
