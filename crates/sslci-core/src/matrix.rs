//! Build matrix request and output types.
//!
//! These types form the JSON/YAML document handed to the CI runner.

use crate::changes::ChangeCounts;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inputs of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRequest {
    pub source_repo: String,
    pub source_sha: String,
    pub build_scope: String,
    pub changes: ChangeCounts,
}

impl MatrixRequest {
    /// Create a request, rejecting a blank repository or revision.
    pub fn new(
        source_repo: impl Into<String>,
        source_sha: impl Into<String>,
        build_scope: impl Into<String>,
        changes: ChangeCounts,
    ) -> Result<Self> {
        let source_repo = source_repo.into();
        let source_sha = source_sha.into();
        if source_repo.trim().is_empty() {
            return Err(Error::InvalidInput("source repository is empty".to_string()));
        }
        if source_sha.trim().is_empty() {
            return Err(Error::InvalidInput("source revision is empty".to_string()));
        }
        Ok(Self {
            source_repo,
            source_sha,
            build_scope: build_scope.into(),
            changes,
        })
    }
}

/// One concrete CI job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub platform: String,
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,
    /// Package options in resolution order; later keys win for the consumer.
    pub options: Vec<String>,
    pub matrix_key: String,
    pub source_repo: String,
    pub source_sha: String,
    pub build_scope: String,
    pub test_enabled: bool,
}

impl MatrixEntry {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Last value assigned to `key`, the way the consumer reads the list.
    pub fn effective_option(&self, key: &str) -> Option<&str> {
        self.options.iter().rev().find_map(|option| {
            option
                .split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmingPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmingFrequency {
    Daily,
    Weekly,
    Monthly,
}

/// A cache pre-population directive for the runner's caching layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmingDirective {
    pub profile: String,
    pub priority: WarmingPriority,
    pub frequency: WarmingFrequency,
}

/// Cache configuration derived from a generated matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStrategy {
    pub cache_keys: Vec<String>,
    pub retention_policies: BTreeMap<String, String>,
    pub warming_strategies: Vec<WarmingDirective>,
}

/// Result of a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMatrix {
    pub include: Vec<MatrixEntry>,
    pub total_jobs: usize,
    pub build_scope: String,
    pub optimization_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_strategy: Option<CacheStrategy>,
}

impl BuildMatrix {
    pub fn empty(build_scope: impl Into<String>) -> Self {
        Self {
            include: vec![],
            total_jobs: 0,
            build_scope: build_scope.into(),
            optimization_applied: false,
            cache_strategy: None,
        }
    }

    pub fn with_cache_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.cache_strategy = Some(strategy);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
