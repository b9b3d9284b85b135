//! Change-driven matrix optimization rules.
//!
//! Rules are evaluated in order; the first whose predicate matches the change
//! counts decides which entries survive. When none matches, the matrix is
//! returned unfiltered.

use sslci_core::{ChangeCounts, MatrixEntry};
use std::fmt;

type Predicate = Box<dyn Fn(&ChangeCounts) -> bool + Send + Sync>;
type Retain = Box<dyn Fn(&MatrixEntry) -> bool + Send + Sync>;

/// A named (predicate, filter) pair.
pub struct OptimizationRule {
    name: String,
    predicate: Predicate,
    retain: Retain,
}

impl OptimizationRule {
    pub fn new<P, R>(name: impl Into<String>, predicate: P, retain: R) -> Self
    where
        P: Fn(&ChangeCounts) -> bool + Send + Sync + 'static,
        R: Fn(&MatrixEntry) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            retain: Box::new(retain),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, changes: &ChangeCounts) -> bool {
        (self.predicate)(changes)
    }

    pub fn keeps(&self, entry: &MatrixEntry) -> bool {
        (self.retain)(entry)
    }
}

impl fmt::Debug for OptimizationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered rule list, first match wins.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<OptimizationRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The OpenSSL CI policy.
    ///
    /// `provider_platforms` is the allow-list kept for provider-only changes.
    pub fn standard(provider_platforms: Vec<String>) -> Self {
        Self::new()
            .with_rule(OptimizationRule::new(
                "test-only",
                |c| c.test > 0 && c.core == 0 && c.config == 0,
                |e| e.profile.contains("debug"),
            ))
            .with_rule(OptimizationRule::new(
                "provider-only",
                |c| c.provider > 0 && c.core == 0,
                move |e| provider_platforms.iter().any(|p| *p == e.platform),
            ))
            .with_rule(OptimizationRule::new(
                "config-only",
                |c| c.config > 0 && c.core == 0,
                |e| e.profile.contains("release"),
            ))
            // Core changes need full validation, FIPS builds included.
            .with_rule(OptimizationRule::new("core", |c| c.core > 0, |_| true))
    }

    pub fn with_rule(mut self, rule: OptimizationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[OptimizationRule] {
        &self.rules
    }

    /// First rule matching `changes`, if any.
    pub fn select(&self, changes: &ChangeCounts) -> Option<&OptimizationRule> {
        self.rules.iter().find(|rule| rule.matches(changes))
    }

    /// Filter `entries` with the first matching rule.
    ///
    /// Returns the surviving entries and the name of the rule applied.
    pub fn apply<'a>(
        &'a self,
        changes: &ChangeCounts,
        entries: Vec<MatrixEntry>,
    ) -> (Vec<MatrixEntry>, Option<&'a str>) {
        match self.select(changes) {
            Some(rule) => {
                let kept = entries.into_iter().filter(|e| rule.keeps(e)).collect();
                (kept, Some(rule.name()))
            }
            None => (entries, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(platform: &str, profile: &str) -> MatrixEntry {
        MatrixEntry {
            platform: platform.to_string(),
            profile: profile.to_string(),
            compiler: None,
            options: vec![],
            matrix_key: format!("{}-{}", platform, profile),
            source_repo: "openssl/openssl".to_string(),
            source_sha: "0123456789".to_string(),
            build_scope: "full".to_string(),
            test_enabled: true,
        }
    }

    fn sample() -> Vec<MatrixEntry> {
        vec![
            entry("ubuntu-22.04", "linux-gcc-release"),
            entry("ubuntu-22.04", "linux-gcc-debug"),
            entry("ubuntu-22.04", "linux-fips"),
            entry("windows-2022", "windows-msvc"),
            entry("macos-12", "macos-clang"),
        ]
    }

    fn standard() -> RuleSet {
        RuleSet::standard(vec!["ubuntu-22.04".to_string(), "windows-2022".to_string()])
    }

    #[test]
    fn test_rule_order() {
        let rule_set = standard();
        let names: Vec<&str> = rule_set.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["test-only", "provider-only", "config-only", "core"]);
    }

    #[test]
    fn test_no_changes_matches_nothing() {
        let rules = standard();
        let (kept, applied) = rules.apply(&ChangeCounts::default(), sample());
        assert_eq!(kept.len(), 5);
        assert_eq!(applied, None);
    }

    #[test]
    fn test_test_only_keeps_debug() {
        let rules = standard();
        let (kept, applied) = rules.apply(&ChangeCounts::new(0, 0, 2, 0), sample());
        assert_eq!(applied, Some("test-only"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].profile, "linux-gcc-debug");
    }

    #[test]
    fn test_test_changes_beat_provider_changes() {
        let rules = standard();
        let (_, applied) = rules.apply(&ChangeCounts::new(0, 0, 1, 1), sample());
        assert_eq!(applied, Some("test-only"));
    }

    #[test]
    fn test_provider_only_keeps_allow_list() {
        let rules = standard();
        let (kept, applied) = rules.apply(&ChangeCounts::new(0, 0, 0, 3), sample());
        assert_eq!(applied, Some("provider-only"));
        assert!(kept.iter().all(|e| e.platform != "macos-12"));
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_provider_with_config_prefers_provider() {
        let rules = standard();
        let (_, applied) = rules.apply(&ChangeCounts::new(0, 1, 0, 1), sample());
        assert_eq!(applied, Some("provider-only"));
    }

    #[test]
    fn test_config_only_keeps_release() {
        let rules = standard();
        let (kept, applied) = rules.apply(&ChangeCounts::new(0, 2, 0, 0), sample());
        assert_eq!(applied, Some("config-only"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].profile, "linux-gcc-release");
    }

    #[test]
    fn test_core_keeps_everything() {
        let rules = standard();
        let (kept, applied) = rules.apply(&ChangeCounts::new(1, 1, 1, 1), sample());
        assert_eq!(applied, Some("core"));
        assert_eq!(kept, sample());
    }

    #[test]
    fn test_custom_rule_set() {
        let rules = RuleSet::new().with_rule(OptimizationRule::new(
            "macos-off",
            |_| true,
            |e| e.platform != "macos-12",
        ));
        let (kept, applied) = rules.apply(&ChangeCounts::default(), sample());
        assert_eq!(applied, Some("macos-off"));
        assert_eq!(kept.len(), 4);
    }
}
