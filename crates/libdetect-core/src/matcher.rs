//! Exact-match application, partial-match propagation, and report selection
//! (spec.md §4.3–§4.5).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::hash::Fingerprint;
use crate::package_name::{drop_last_segment, PackageName};
use crate::tree::{PackageTree, TreeNode};

/// One detected library, as returned by [`detect_libs`] (spec.md §3 `PkgResult`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PkgResult {
    pub hash: Fingerprint,
    pub name: PackageName,
    pub lib_name: String,
    pub similarity: f64,
}

/// Load exact fingerprint hits into the tree's `match_libs` maps (spec.md §4.3).
///
/// `matches` maps a fingerprint to every candidate library name sharing it.
/// Per spec.md §9's fingerprint-index fidelity note, every tree node sharing
/// a matched fingerprint receives the match, not only one arbitrary node.
pub fn apply_exact_matches(tree: &mut PackageTree, matches: &HashMap<Fingerprint, Vec<String>>) {
    let targets: Vec<(PackageName, Vec<String>)> = matches
        .iter()
        .filter(|(_, names)| !names.is_empty())
        .flat_map(|(hash, names)| {
            tree.paths_with_fingerprint(*hash)
                .into_iter()
                .map(|path| (path, names.clone()))
        })
        .collect();

    for (path, names) in targets {
        if let Some(node) = tree.node_mut(&path) {
            let weight = node.weight();
            let libs: HashMap<String, u32> = names.into_iter().map(|n| (n, weight)).collect();
            node.set_match_libs(libs);
        }
    }
}

/// Post-order partial-match propagation (spec.md §4.4).
pub fn propagate_partial_matches(tree: &mut PackageTree) {
    propagate(tree.root_mut());
}

fn propagate(node: &mut TreeNode) {
    if node.is_leaf() || !node.match_libs().is_empty() {
        return;
    }

    let Some(children) = node.children_mut() else {
        return;
    };

    let mut accumulated: HashMap<String, u32> = HashMap::new();
    for child in children.values_mut() {
        propagate(child);

        // Collapse this child's matches by one level, taking the max across
        // sibling-under-this-child candidates that collapse to the same
        // parent package (spec.md §4.4 step 2b / "Special case #1").
        let mut per_child_max: HashMap<String, u32> = HashMap::new();
        for (child_pkg, weight) in child.match_libs() {
            let parent_pkg = drop_last_segment(child_pkg);
            let entry = per_child_max.entry(parent_pkg).or_insert(0);
            if *weight > *entry {
                *entry = *weight;
            }
        }
        for (pkg, weight) in per_child_max {
            *accumulated.entry(pkg).or_insert(0) += weight;
        }
    }

    // Cap matched weight at this node's own weight ("Special case #2").
    let cap = node.weight();
    for weight in accumulated.values_mut() {
        if *weight > cap {
            *weight = cap;
        }
    }

    node.set_match_libs(accumulated);
}

/// Exact-only report selection (spec.md §4.5 `detect_exact_libs`).
#[must_use]
pub fn detect_exact_libs(tree: &PackageTree) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    walk_exact(tree.root(), &mut out);
    out
}

fn walk_exact(node: &TreeNode, out: &mut BTreeMap<String, String>) {
    if node.is_leaf() {
        return;
    }
    if !node.match_libs().is_empty() {
        let name = node.name().as_str();
        let chosen = if node.match_libs().contains_key(name) {
            name.to_string()
        } else {
            node.match_libs().keys().min().cloned().expect("non-empty")
        };
        out.insert(name.to_string(), chosen);
        return;
    }
    if let Some(children) = node.children() {
        for child in children.values() {
            walk_exact(child, out);
        }
    }
}

/// Partial-aware report selection (spec.md §4.5 `detect_libs`).
#[must_use]
pub fn detect_libs(tree: &PackageTree, lib_match_rate: f64, include_subpkgs: bool) -> Vec<PkgResult> {
    let mut out = Vec::new();
    walk_partial(tree.root(), lib_match_rate, include_subpkgs, None, &mut out);
    out
}

fn walk_partial(
    node: &TreeNode,
    lib_match_rate: f64,
    include_subpkgs: bool,
    ancestor_chosen: Option<&str>,
    out: &mut Vec<PkgResult>,
) {
    if node.is_leaf() {
        return;
    }

    if node.match_libs().is_empty() {
        for_each_child(node, |child| {
            walk_partial(child, lib_match_rate, include_subpkgs, ancestor_chosen, out);
        });
        return;
    }

    let max_w = *node.match_libs().values().max().expect("non-empty");
    let best: Vec<&String> = node
        .match_libs()
        .iter()
        .filter(|(_, &w)| w == max_w)
        .map(|(k, _)| k)
        .collect();

    // Ambiguity gate: more candidate names than matched APIs.
    if best.len() as u32 > max_w {
        for_each_child(node, |child| {
            walk_partial(child, lib_match_rate, include_subpkgs, ancestor_chosen, out);
        });
        return;
    }

    let name = node.name().as_str();
    let chosen: String = if best.iter().any(|b| b.as_str() == name) {
        name.to_string()
    } else {
        (*best.iter().min().expect("non-empty")).clone()
    };

    let emits = f64::from(max_w) >= f64::from(node.weight()) * lib_match_rate;
    let mut next_ancestor_chosen = ancestor_chosen.map(str::to_string);

    if emits {
        let suppressed =
            !include_subpkgs && ancestor_chosen.is_some_and(|anc| is_package_prefix(&chosen, anc));
        if !suppressed {
            out.push(PkgResult {
                hash: node.hash(),
                name: node.name().clone(),
                lib_name: chosen.clone(),
                similarity: f64::from(max_w) / f64::from(node.weight().max(1)),
            });
        }
        next_ancestor_chosen = Some(chosen);
    }

    // Completeness rule: a perfect fit stops descent regardless of emission.
    if max_w == node.weight() {
        return;
    }

    for_each_child(node, |child| {
        walk_partial(
            child,
            lib_match_rate,
            include_subpkgs,
            next_ancestor_chosen.as_deref(),
            out,
        );
    });
}

fn for_each_child<'a>(node: &'a TreeNode, mut f: impl FnMut(&'a TreeNode)) {
    if let Some(children) = node.children() {
        for child in children.values() {
            f(child);
        }
    }
}

/// True if `prefix` is `name` itself or a `/`-delimited ancestor of it.
fn is_package_prefix(prefix: &str, name: &str) -> bool {
    name == prefix || name.starts_with(&format!("{prefix}/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::{Dex, DexClass, DexMethod};
    use std::collections::HashSet;

    struct FakeMethod(Vec<String>);
    impl DexMethod for FakeMethod {
        fn invoked_methods(&self) -> Box<dyn Iterator<Item = &str> + '_> {
            Box::new(self.0.iter().map(String::as_str))
        }
    }
    struct FakeClass {
        name: String,
        methods: Vec<FakeMethod>,
    }
    impl DexClass for FakeClass {
        fn name(&self) -> &str {
            &self.name
        }
        fn methods(&self) -> Box<dyn Iterator<Item = &dyn DexMethod> + '_> {
            Box::new(self.methods.iter().map(|m| m as &dyn DexMethod))
        }
    }
    struct FakeDex(Vec<FakeClass>);
    impl Dex for FakeDex {
        fn classes(&self) -> Box<dyn Iterator<Item = &dyn DexClass> + '_> {
            Box::new(self.0.iter().map(|c| c as &dyn DexClass))
        }
    }

    fn allow(apis: &[&str]) -> HashSet<String> {
        apis.iter().map(|s| s.to_string()).collect()
    }

    fn two_child_tree() -> PackageTree {
        let dex = FakeDex(vec![
            FakeClass {
                name: "Lorg/lib/a".to_string(),
                methods: vec![FakeMethod(vec!["A".into(), "B".into(), "C".into(), "D".into()])],
            },
            FakeClass {
                name: "Lorg/lib/b".to_string(),
                methods: vec![FakeMethod(vec![
                    "E".into(),
                    "F".into(),
                    "G".into(),
                    "H".into(),
                    "I".into(),
                    "J".into(),
                ])],
            },
        ]);
        let allowlist = allow(&["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]);
        PackageTree::build(&dex, &allowlist).unwrap()
    }

    /// S3: exact match on `Lorg/lib` itself; no descent.
    #[test]
    fn s3_exact_match_does_not_descend() {
        let mut tree = two_child_tree();
        let lib_hash = tree.node(&PackageName::from_full("Lorg/lib")).unwrap().hash();
        let mut matches = HashMap::new();
        matches.insert(lib_hash, vec!["Lorg/lib".to_string()]);
        apply_exact_matches(&mut tree, &matches);
        propagate_partial_matches(&mut tree);

        let results = detect_libs(&tree, 0.9, true);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name.as_str(), "Lorg/lib");
        assert_eq!(results[0].lib_name, "Lorg/lib");
    }

    /// S4: children match distinct libs, propagation sums their weight onto the parent.
    #[test]
    fn s4_partial_propagation_sums_children() {
        let mut tree = two_child_tree();
        let a_hash = tree
            .node(&PackageName::from_full("Lorg/lib/a"))
            .unwrap()
            .hash();
        let b_hash = tree
            .node(&PackageName::from_full("Lorg/lib/b"))
            .unwrap()
            .hash();
        let mut matches = HashMap::new();
        matches.insert(a_hash, vec!["Lorg/lib/a".to_string()]);
        matches.insert(b_hash, vec!["Lorg/lib/b".to_string()]);
        apply_exact_matches(&mut tree, &matches);
        propagate_partial_matches(&mut tree);

        let org_lib = tree.node(&PackageName::from_full("Lorg/lib")).unwrap();
        assert_eq!(org_lib.match_libs().get("Lorg/lib"), Some(&10));

        let results = detect_libs(&tree, 0.9, true);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name.as_str(), "Lorg/lib");
    }

    /// S5: one child matches two sibling libraries; only the stronger branch counts.
    #[test]
    fn s5_sibling_libs_under_one_child_take_max_not_sum() {
        let mut tree = two_child_tree();
        let a_node = tree.node_mut(&PackageName::from_full("Lorg/lib/a")).unwrap();
        let mut libs = HashMap::new();
        libs.insert("Lx/foo1".to_string(), 10);
        libs.insert("Lx/foo2".to_string(), 8);
        a_node.set_match_libs(libs);

        propagate_partial_matches(&mut tree);

        let org_lib = tree.node(&PackageName::from_full("Lorg/lib")).unwrap();
        // "Lx/foo1" and "Lx/foo2" both collapse to "Lx"; max(10, 8) = 10, not 18.
        assert_eq!(org_lib.match_libs().get("Lx"), Some(&10));
    }

    /// `detect_exact_libs`'s naming rule: self-name preferred when present
    /// among the matched keys, otherwise the lexicographically smallest key.
    #[test]
    fn detect_exact_libs_prefers_self_name_else_lexicographically_smallest() {
        let dex = FakeDex(vec![
            FakeClass {
                name: "Lp/one/A".to_string(),
                methods: vec![FakeMethod(vec!["A".into(), "B".into()])],
            },
            FakeClass {
                name: "Lp/two/B".to_string(),
                methods: vec![FakeMethod(vec!["C".into(), "D".into()])],
            },
        ]);
        let allowlist = allow(&["A", "B", "C", "D"]);
        let mut tree = PackageTree::build(&dex, &allowlist).unwrap();

        let one = tree.node_mut(&PackageName::from_full("Lp/one")).unwrap();
        let mut one_libs = HashMap::new();
        one_libs.insert("Lp/one".to_string(), 2);
        one.set_match_libs(one_libs);

        let two = tree.node_mut(&PackageName::from_full("Lp/two")).unwrap();
        let mut two_libs = HashMap::new();
        two_libs.insert("Bbb".to_string(), 2);
        two_libs.insert("Aaa".to_string(), 2);
        two.set_match_libs(two_libs);

        let report = detect_exact_libs(&tree);
        assert_eq!(report.get("Lp/one"), Some(&"Lp/one".to_string()));
        assert_eq!(report.get("Lp/two"), Some(&"Aaa".to_string()));
        // Classes never appear as reported packages.
        assert!(!report.contains_key("Lp/one/A"));
    }

    /// `detect_libs`'s ambiguity gate: more candidate names than matched
    /// APIs means the node is treated as unmatched and descent continues.
    #[test]
    fn ambiguity_gate_descends_when_more_candidates_than_weight() {
        let dex = FakeDex(vec![
            FakeClass {
                name: "Lorg/lib/a/X".to_string(),
                methods: vec![FakeMethod(vec!["A".into(), "B".into(), "C".into(), "D".into()])],
            },
            FakeClass {
                name: "Lorg/lib/b/Y".to_string(),
                methods: vec![FakeMethod(vec![
                    "E".into(),
                    "F".into(),
                    "G".into(),
                    "H".into(),
                    "I".into(),
                    "J".into(),
                ])],
            },
        ]);
        let allowlist = allow(&["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]);
        let mut tree = PackageTree::build(&dex, &allowlist).unwrap();

        // Two candidates at weight 1 each: more names than matched APIs.
        let lib = tree.node_mut(&PackageName::from_full("Lorg/lib")).unwrap();
        let mut ambiguous = HashMap::new();
        ambiguous.insert("X".to_string(), 1);
        ambiguous.insert("Y".to_string(), 1);
        lib.set_match_libs(ambiguous);

        // A perfect-fit match one level down, so descent is observable.
        let lib_a = tree.node_mut(&PackageName::from_full("Lorg/lib/a")).unwrap();
        let mut a_libs = HashMap::new();
        a_libs.insert("Lorg/lib/a".to_string(), 4);
        lib_a.set_match_libs(a_libs);

        let results = detect_libs(&tree, 0.9, true);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name.as_str(), "Lorg/lib/a");
        assert_eq!(results[0].lib_name, "Lorg/lib/a");
    }

    /// `include_subpkgs = false` suppresses a descendant whose chosen name is
    /// a prefix of its ancestor's chosen name.
    #[test]
    fn subpackage_suppression_drops_descendant_when_disabled() {
        let dex = FakeDex(vec![FakeClass {
            name: "Lx/foo/sub/Leaf".to_string(),
            methods: vec![FakeMethod(
                (0..10).map(|i| format!("API{i}")).collect::<Vec<_>>(),
            )],
        }]);
        let allowlist: HashSet<String> = (0..10).map(|i| format!("API{i}")).collect();
        let mut tree = PackageTree::build(&dex, &allowlist).unwrap();

        // "Lx/foo" emits "Lx/foo/bar" (not a perfect fit, so descent continues).
        let foo = tree.node_mut(&PackageName::from_full("Lx/foo")).unwrap();
        let mut foo_libs = HashMap::new();
        foo_libs.insert("Lx/foo/bar".to_string(), 9);
        foo.set_match_libs(foo_libs);

        // "Lx/foo/sub" emits "Lx/foo", a prefix of the ancestor's "Lx/foo/bar".
        let sub = tree.node_mut(&PackageName::from_full("Lx/foo/sub")).unwrap();
        let mut sub_libs = HashMap::new();
        sub_libs.insert("Lx/foo".to_string(), 10);
        sub.set_match_libs(sub_libs);

        let with_subpkgs = detect_libs(&tree, 0.8, true);
        assert_eq!(with_subpkgs.len(), 2);

        let without_subpkgs = detect_libs(&tree, 0.8, false);
        assert_eq!(without_subpkgs.len(), 1);
        assert_eq!(without_subpkgs[0].name.as_str(), "Lx/foo");
        assert_eq!(without_subpkgs[0].lib_name, "Lx/foo/bar");
    }
}
