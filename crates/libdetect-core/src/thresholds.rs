//! Tunable thresholds (spec.md §3 "Thresholds").

/// Configuration knobs governing matching and ingestion.
///
/// Mirrors the reference implementation's `Thresholds` named tuple, passed
/// explicitly through analysis calls rather than read from hidden module
/// globals (spec.md §9 "State lifecycle").
#[derive(Clone, Debug, PartialEq)]
pub struct Thresholds {
    /// Minimum `matched-weight / node-weight` fraction to report a partial match.
    pub lib_match_rate: f64,
    /// Minimum node weight to be considered during ingestion.
    pub min_api_weight: u32,
    /// Minimum observation count for a package to be promoted into distillation.
    pub min_lib_count: u32,
    /// Top-level prefixes too generic to be library identifiers.
    pub pkg_name_blacklist: Vec<String>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lib_match_rate: 0.9,
            min_api_weight: 3,
            min_lib_count: 5,
            pkg_name_blacklist: vec!["Lcom".to_string(), "Lorg".to_string(), "Lcn".to_string()],
        }
    }
}

impl Thresholds {
    /// spec.md §7: "the core does not validate but must remain internally
    /// consistent". Misconfiguration is the caller's responsibility; this is
    /// a best-effort diagnostic, not a rejection.
    pub fn warn_if_inconsistent(&self) {
        if !(0.0..=1.0).contains(&self.lib_match_rate) {
            tracing::warn!(
                target = "libdetect.thresholds",
                lib_match_rate = self.lib_match_rate,
                "LibMatchRate is outside [0, 1]; matches will rarely or always emit"
            );
        }
    }

    #[must_use]
    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.pkg_name_blacklist.iter().any(|p| p == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let t = Thresholds::default();
        assert_eq!(t.lib_match_rate, 0.9);
        assert_eq!(t.min_api_weight, 3);
        assert_eq!(t.min_lib_count, 5);
        assert!(t.is_blacklisted("Lcom"));
        assert!(!t.is_blacklisted("Lcom/google"));
    }
}
