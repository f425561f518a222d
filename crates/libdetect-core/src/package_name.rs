//! Package path names in DEX descriptor syntax (`Lcom/google/gson`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A slash-separated package path, prefixed with `L`.
///
/// The root package is the empty string — see spec.md §4.2's edge cases:
/// "The root's printable name is the empty string; all other nodes' names
/// start with `L`."
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a child name by appending one path segment.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        if self.is_root() {
            Self(format!("L{segment}"))
        } else {
            Self(format!("{}/{segment}", self.0))
        }
    }

    /// Construct a name directly from a full descriptor string (e.g. a class name).
    #[must_use]
    pub fn from_full(full: impl Into<String>) -> Self {
        Self(full.into())
    }

    /// Drop the last `/`-separated segment.
    ///
    /// Mirrors the reference implementation's `name.rsplit('/', 1)[0]`: if
    /// there is no `/` in the name, the name is returned unchanged (a
    /// single-segment top-level package has no parent to collapse into).
    #[must_use]
    pub fn drop_last_segment(&self) -> Self {
        Self(drop_last_segment(&self.0))
    }

    /// Number of `/`-separated segments under `L`, reversed, used by
    /// `name_better` (spec.md §4.7).
    #[must_use]
    pub fn segments_reversed(&self) -> Vec<&str> {
        let trimmed = self.0.strip_prefix('L').unwrap_or(&self.0);
        let mut parts: Vec<&str> = trimmed.split('/').collect();
        parts.reverse();
        parts
    }
}

/// Drop the last `/`-separated segment of a name; unchanged if there is none.
///
/// Used both by [`PackageName::drop_last_segment`] and directly by the
/// matcher, whose `match_libs` keys are free-form candidate library name
/// strings rather than `PackageName`s.
#[must_use]
pub fn drop_last_segment(s: &str) -> String {
    match s.rfind('/') {
        Some(idx) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

impl fmt::Debug for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageName({:?})", self.0)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_of_root_gets_l_prefix() {
        assert_eq!(PackageName::root().child("com").as_str(), "Lcom");
    }

    #[test]
    fn child_of_package_appends_slash() {
        let com = PackageName::root().child("com");
        assert_eq!(com.child("google").as_str(), "Lcom/google");
    }

    #[test]
    fn drop_last_segment_multi_level() {
        let name = PackageName::from_full("Lx/foo1".to_string());
        assert_eq!(name.drop_last_segment().as_str(), "Lx");
    }

    #[test]
    fn drop_last_segment_single_level_is_unchanged() {
        let name = PackageName::from_full("Lcom".to_string());
        assert_eq!(name.drop_last_segment().as_str(), "Lcom");
    }

    #[test]
    fn segments_reversed() {
        let name = PackageName::from_full("Lcom/google/gson".to_string());
        assert_eq!(name.segments_reversed(), vec!["gson", "google", "com"]);
    }
}
