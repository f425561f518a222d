//! Ingestion: extract candidate `(hash, name, weight)` observations from a
//! built [`PackageTree`] (spec.md §4.6).

use libdetect_core::{PackageTree, Thresholds, TreeNode};
use libdetect_db::PkgInfo;

/// Every internal node of `tree` that is eligible to be recorded as a
/// package observation: `weight >= MinApiWeight`, printable name longer
/// than two characters (rejects `L` + a single obfuscated letter), and not
/// on the blacklist.
///
/// Mirrors the reference implementation's `db.add_pkg`: leaves (classes)
/// are never emitted, and ineligible names are silently dropped rather than
/// erroring (spec.md §9 "blacklist semantics" — ingestion-time filtering
/// only).
#[must_use]
pub fn extract_pkgs(tree: &PackageTree, thresholds: &Thresholds) -> Vec<PkgInfo> {
    let mut out = Vec::new();
    walk(tree.root(), thresholds, &mut out);
    out
}

fn walk(node: &TreeNode, thresholds: &Thresholds, out: &mut Vec<PkgInfo>) {
    let Some(children) = node.children() else {
        return;
    };

    let name = node.name().as_str();
    if node.weight() >= thresholds.min_api_weight && name.len() > 2 {
        if thresholds.is_blacklisted(name) {
            tracing::debug!(target = "libdetect.corpus", name, "skipped package name during ingestion: blacklisted");
        } else {
            out.push(PkgInfo {
                hash: node.hash(),
                name: name.to_string(),
                weight: node.weight(),
            });
        }
    }

    for child in children.values() {
        walk(child, thresholds, out);
    }
}
