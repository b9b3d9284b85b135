//! Build reports with cache and performance figures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache operations a hit count is measured against.
pub const TOTAL_CACHE_OPERATIONS: u32 = 100;

/// Build time, in minutes, at which the time score reaches zero.
const MAX_BUILD_MINUTES: f64 = 30.0;

/// Inputs of a build report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReportRequest {
    pub package_name: String,
    pub version: String,
    pub platform: String,
    pub profile: String,
    /// Build duration in seconds.
    pub build_time: f64,
    pub cache_hits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheEfficiency {
    High,
    Medium,
    Low,
}

impl CacheEfficiency {
    pub fn from_hits(cache_hits: u32) -> Self {
        if cache_hits > 80 {
            CacheEfficiency::High
        } else if cache_hits > 50 {
            CacheEfficiency::Medium
        } else {
            CacheEfficiency::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub build_time_minutes: f64,
    pub cache_efficiency: CacheEfficiency,
    pub optimization_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub timestamp: DateTime<Utc>,
    pub package_name: String,
    pub version: String,
    pub platform: String,
    pub profile: String,
    pub build_time: f64,
    pub cache_hits: u32,
    pub cache_misses: u32,
    pub cache_hit_rate: f64,
    pub build_success: bool,
    pub artifactory_url: String,
    pub performance: PerformanceSummary,
}

impl BuildReport {
    /// Build a report for a package stored under `package_root`.
    pub fn new(package_root: &str, request: &BuildReportRequest) -> Self {
        let cache_hit_rate = f64::from(request.cache_hits) / f64::from(TOTAL_CACHE_OPERATIONS);
        let build_success = true;

        let performance = PerformanceSummary {
            build_time_minutes: request.build_time / 60.0,
            cache_efficiency: CacheEfficiency::from_hits(request.cache_hits),
            optimization_score: optimization_score(cache_hit_rate, request.build_time, build_success),
        };

        Self {
            timestamp: Utc::now(),
            package_name: request.package_name.clone(),
            version: request.version.clone(),
            platform: request.platform.clone(),
            profile: request.profile.clone(),
            build_time: request.build_time,
            cache_hits: request.cache_hits,
            cache_misses: TOTAL_CACHE_OPERATIONS.saturating_sub(request.cache_hits),
            cache_hit_rate,
            build_success,
            artifactory_url: format!(
                "{}/{}/{}",
                package_root.trim_end_matches('/'),
                request.package_name,
                request.version
            ),
            performance,
        }
    }
}

/// Weighted score in `[0, 1]`: 40% cache hit rate, 30% build time, 30% success.
pub fn optimization_score(cache_hit_rate: f64, build_time_secs: f64, success: bool) -> f64 {
    let time_score = (1.0 - (build_time_secs / 60.0) / MAX_BUILD_MINUTES).max(0.0);
    let success_score = if success { 1.0 } else { 0.0 };

    (cache_hit_rate * 0.4 + time_score * 0.3 + success_score * 0.3).min(1.0)
}
