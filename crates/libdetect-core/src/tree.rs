//! Package-tree construction (spec.md §4.2).

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::dex::Dex;
use crate::error::{Error, Result};
use crate::hash::{Fingerprint, Hasher};
use crate::package_name::PackageName;

/// Either a `ClassLeaf` or a `PackageInternal` node, per spec.md §3.
pub struct TreeNode {
    name: PackageName,
    hash: Fingerprint,
    weight: u32,
    /// `None` for a leaf (class), `Some` for an internal (package) node.
    children: Option<BTreeMap<String, TreeNode>>,
    /// Candidate library name → accumulated matched weight.
    match_libs: std::collections::HashMap<String, u32>,
}

impl TreeNode {
    fn new_internal(name: PackageName) -> Self {
        Self {
            name,
            hash: Fingerprint::from_bytes([0; 32]),
            weight: 0,
            children: Some(BTreeMap::new()),
            match_libs: std::collections::HashMap::new(),
        }
    }

    fn new_leaf(name: PackageName, hash: Fingerprint, weight: u32) -> Self {
        Self {
            name,
            hash,
            weight,
            children: None,
            match_libs: std::collections::HashMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    #[must_use]
    pub fn hash(&self) -> Fingerprint {
        self.hash
    }

    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    #[must_use]
    pub fn children(&self) -> Option<&BTreeMap<String, TreeNode>> {
        self.children.as_ref()
    }

    #[must_use]
    pub fn match_libs(&self) -> &std::collections::HashMap<String, u32> {
        &self.match_libs
    }

    pub fn match_libs_mut(&mut self) -> &mut std::collections::HashMap<String, u32> {
        &mut self.match_libs
    }

    pub fn children_mut(&mut self) -> Option<&mut BTreeMap<String, TreeNode>> {
        self.children.as_mut()
    }

    pub fn set_match_libs(&mut self, libs: std::collections::HashMap<String, u32>) {
        self.match_libs = libs;
    }
}

/// A package tree built from one DEX file (spec.md §4.2).
pub struct PackageTree {
    root: TreeNode,
}

impl PackageTree {
    /// Build a tree from a DEX's classes, keeping only classes that invoke at
    /// least one allowlisted API (spec.md §4.2 step 2).
    pub fn build(dex: &dyn Dex, allowlist: &HashSet<String>) -> Result<Self> {
        let mut root = TreeNode::new_internal(PackageName::root());

        for class in dex.classes() {
            let name = class.name();
            if !name.starts_with('L') {
                return Err(Error::InvalidClassName(name.to_string()));
            }
            if name == "L" {
                return Err(Error::BareRootClassName(name.to_string()));
            }

            let mut apis: Vec<String> = Vec::new();
            for method in class.methods() {
                for invoked in method.invoked_methods() {
                    if allowlist.contains(invoked) {
                        apis.push(invoked.to_string());
                    }
                }
            }
            apis.sort();
            apis.dedup();
            if apis.is_empty() {
                continue;
            }

            let hash = Hasher::digest(apis.iter().map(String::as_bytes));
            let weight = apis.len() as u32;
            insert_leaf(&mut root, name, hash, weight)?;
        }

        finish(&mut root);
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut TreeNode {
        &mut self.root
    }

    /// Every distinct fingerprint present in the tree (internal and leaf
    /// nodes), for querying the database's exact-match table (spec.md §4.3).
    #[must_use]
    pub fn fingerprints(&self) -> Vec<Fingerprint> {
        let mut out = Vec::new();
        collect_hashes(&self.root, &mut out);
        let set: HashSet<Fingerprint> = out.into_iter().collect();
        set.into_iter().collect()
    }

    /// All node paths sharing a given fingerprint.
    ///
    /// spec.md §9 notes that a single `hash -> node` index can collide when
    /// two distinct packages share a fingerprint, and that a faithful
    /// implementation should index *all* matching nodes rather than just the
    /// last-visited one; this is that fix.
    #[must_use]
    pub fn paths_with_fingerprint(&self, fp: Fingerprint) -> Vec<PackageName> {
        let mut out = Vec::new();
        collect_paths(&self.root, fp, &mut out);
        out
    }

    #[must_use]
    pub fn node(&self, path: &PackageName) -> Option<&TreeNode> {
        if path.is_root() {
            return Some(&self.root);
        }
        let mut current = &self.root;
        for seg in path.as_str()[1..].split('/') {
            current = current.children()?.get(seg)?;
        }
        Some(current)
    }

    pub fn node_mut(&mut self, path: &PackageName) -> Option<&mut TreeNode> {
        if path.is_root() {
            return Some(&mut self.root);
        }
        let mut current = &mut self.root;
        for seg in path.as_str()[1..].split('/') {
            current = current.children.as_mut()?.get_mut(seg)?;
        }
        Some(current)
    }
}

fn collect_hashes(node: &TreeNode, out: &mut Vec<Fingerprint>) {
    out.push(node.hash);
    if let Some(children) = &node.children {
        for child in children.values() {
            collect_hashes(child, out);
        }
    }
}

fn collect_paths(node: &TreeNode, fp: Fingerprint, out: &mut Vec<PackageName>) {
    if node.hash == fp {
        out.push(node.name.clone());
    }
    if let Some(children) = &node.children {
        for child in children.values() {
            collect_paths(child, fp, out);
        }
    }
}

/// Insert a leaf, creating missing internal nodes along its path.
///
/// Mirrors the reference implementation's `_TreeNode.add_leaf`: path
/// segments are consumed one at a time, creating internal nodes as needed,
/// with the leaf attached under its final segment.
fn insert_leaf(root: &mut TreeNode, full_name: &str, hash: Fingerprint, weight: u32) -> Result<()> {
    let stripped = &full_name[1..];
    let parts: Vec<&str> = stripped.split('/').collect();

    let mut current = root;
    let mut current_path = PackageName::root();
    for seg in &parts[..parts.len() - 1] {
        current_path = current_path.child(seg);
        let children = current
            .children
            .as_mut()
            .ok_or_else(|| Error::ClassNameIsPackagePrefix(full_name.to_string()))?;
        current = children
            .entry((*seg).to_string())
            .or_insert_with(|| TreeNode::new_internal(current_path.clone()));
    }

    let last = parts[parts.len() - 1];
    let children = current
        .children
        .as_mut()
        .ok_or_else(|| Error::ClassNameIsPackagePrefix(full_name.to_string()))?;
    if children.contains_key(last) {
        return Err(Error::DuplicateClassName(full_name.to_string()));
    }
    children.insert(
        last.to_string(),
        TreeNode::new_leaf(PackageName::from_full(full_name.to_string()), hash, weight),
    );
    Ok(())
}

/// Post-order pass computing `hash` and `weight` for every internal node
/// (spec.md §4.2 step 4).
fn finish(node: &mut TreeNode) {
    let Some(children) = node.children.as_mut() else {
        return;
    };
    for child in children.values_mut() {
        finish(child);
    }
    let hashes: Vec<[u8; 32]> = children.values().map(|c| *c.hash.as_bytes()).collect();
    node.hash = Hasher::digest(hashes);
    node.weight = children.values().map(TreeNode::weight).sum();
}
