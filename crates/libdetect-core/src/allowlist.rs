//! The fixed set of framework method signatures considered "stable
//! landmarks" (spec.md §2 component 1).

use std::collections::HashSet;

/// Parse an `apis.txt`-shaped allowlist: one signature per line, blank lines
/// ignored (spec.md §6).
#[must_use]
pub fn parse_allowlist(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        let set = parse_allowlist("A\n\nB\n  \nC\n");
        assert_eq!(set.len(), 3);
        assert!(set.contains("A"));
        assert!(set.contains("C"));
    }
}
