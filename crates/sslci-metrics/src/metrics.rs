//! Build metrics record.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Timed phases of an OpenSSL build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
    Configure,
    Compile,
    Link,
    Test,
    Package,
}

impl BuildPhase {
    pub const ALL: [BuildPhase; 5] = [
        BuildPhase::Configure,
        BuildPhase::Compile,
        BuildPhase::Link,
        BuildPhase::Test,
        BuildPhase::Package,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPhase::Configure => "configure",
            BuildPhase::Compile => "compile",
            BuildPhase::Link => "link",
            BuildPhase::Test => "test",
            BuildPhase::Package => "package",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildPhase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BuildPhase::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown build phase: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    #[default]
    Unknown,
    Success,
    Failure,
    Cancelled,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStatus::Unknown => "unknown",
            BuildStatus::Success => "success",
            BuildStatus::Failure => "failure",
            BuildStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Everything measured about one build.
///
/// Times are seconds, sizes are megabytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMetrics {
    pub timestamp: DateTime<Utc>,
    pub build_id: String,
    pub source_repo: String,
    pub source_sha: String,
    pub platform: String,
    pub profile: String,
    pub build_scope: String,

    // Performance
    #[serde(default)]
    pub total_build_time: f64,
    #[serde(default)]
    pub configure_time: f64,
    #[serde(default)]
    pub compile_time: f64,
    #[serde(default)]
    pub link_time: f64,
    #[serde(default)]
    pub test_time: f64,
    #[serde(default)]
    pub package_time: f64,

    // Resources
    #[serde(default)]
    pub peak_memory_mb: f64,
    #[serde(default)]
    pub avg_cpu_percent: f64,
    #[serde(default)]
    pub peak_cpu_percent: f64,
    #[serde(default)]
    pub disk_io_read_mb: f64,
    #[serde(default)]
    pub disk_io_write_mb: f64,

    // Cache
    #[serde(default)]
    pub cache_hit_rate: f64,
    #[serde(default)]
    pub cache_miss_count: u64,
    #[serde(default)]
    pub cache_size_mb: f64,

    #[serde(default)]
    pub build_status: BuildStatus,
    #[serde(default)]
    pub test_passed: u64,
    #[serde(default)]
    pub test_failed: u64,
    #[serde(default)]
    pub test_skipped: u64,

    #[serde(default)]
    pub artifact_count: u64,
    #[serde(default)]
    pub artifact_size_mb: f64,

    #[serde(default)]
    pub warnings_count: u64,
    #[serde(default)]
    pub errors_count: u64,
}

impl BuildMetrics {
    /// Empty metrics for a build starting now.
    pub fn new(
        build_id: impl Into<String>,
        source_repo: impl Into<String>,
        source_sha: impl Into<String>,
        platform: impl Into<String>,
        profile: impl Into<String>,
        build_scope: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            build_id: build_id.into(),
            source_repo: source_repo.into(),
            source_sha: source_sha.into(),
            platform: platform.into(),
            profile: profile.into(),
            build_scope: build_scope.into(),
            total_build_time: 0.0,
            configure_time: 0.0,
            compile_time: 0.0,
            link_time: 0.0,
            test_time: 0.0,
            package_time: 0.0,
            peak_memory_mb: 0.0,
            avg_cpu_percent: 0.0,
            peak_cpu_percent: 0.0,
            disk_io_read_mb: 0.0,
            disk_io_write_mb: 0.0,
            cache_hit_rate: 0.0,
            cache_miss_count: 0,
            cache_size_mb: 0.0,
            build_status: BuildStatus::Unknown,
            test_passed: 0,
            test_failed: 0,
            test_skipped: 0,
            artifact_count: 0,
            artifact_size_mb: 0.0,
            warnings_count: 0,
            errors_count: 0,
        }
    }

    /// Load metrics saved by [`crate::MetricsCollector::save`].
    ///
    /// Sample and phase detail in the file is ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn phase_time(&self, phase: BuildPhase) -> f64 {
        match phase {
            BuildPhase::Configure => self.configure_time,
            BuildPhase::Compile => self.compile_time,
            BuildPhase::Link => self.link_time,
            BuildPhase::Test => self.test_time,
            BuildPhase::Package => self.package_time,
        }
    }

    pub fn set_phase_time(&mut self, phase: BuildPhase, seconds: f64) {
        let slot = match phase {
            BuildPhase::Configure => &mut self.configure_time,
            BuildPhase::Compile => &mut self.compile_time,
            BuildPhase::Link => &mut self.link_time,
            BuildPhase::Test => &mut self.test_time,
            BuildPhase::Package => &mut self.package_time,
        };
        *slot = seconds;
    }

    /// First eight characters of the source revision.
    pub fn short_sha(&self) -> &str {
        match self.source_sha.char_indices().nth(8) {
            Some((idx, _)) => &self.source_sha[..idx],
            None => &self.source_sha,
        }
    }
}
