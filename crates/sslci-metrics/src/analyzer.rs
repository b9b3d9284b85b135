//! Performance analysis of finished builds.

use crate::metrics::BuildMetrics;
use serde::{Deserialize, Serialize};

const COMPILE_SHARE_LIMIT: f64 = 0.7;
const TEST_SHARE_LIMIT: f64 = 0.3;
const HIGH_MEMORY_MB: f64 = 8000.0;
const LOW_HIT_RATE: f64 = 0.7;

const SLOW_BUILD_SECS: f64 = 600.0;
const SCORE_HIT_RATE: f64 = 0.8;
const SCORE_MEMORY_MB: f64 = 4000.0;

/// Build time change, in percent, that counts as an improvement or regression.
const BUILD_TIME_THRESHOLD_PERCENT: f64 = 5.0;
/// Hit rate change that counts as an improvement or regression.
const HIT_RATE_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    /// 0 to 100.
    pub performance_score: u32,
    pub bottlenecks: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub absolute: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsComparison {
    pub improvements: Vec<String>,
    pub regressions: Vec<String>,
    pub build_time: MetricChange,
    pub cache_hit_rate: f64,
}

pub struct MetricsAnalyzer;

impl MetricsAnalyzer {
    pub fn analyze(metrics: &BuildMetrics) -> PerformanceAnalysis {
        let mut bottlenecks = Vec::new();
        let mut recommendations = Vec::new();

        let total = metrics.total_build_time;
        if total > 0.0 {
            if metrics.compile_time / total > COMPILE_SHARE_LIMIT {
                bottlenecks.push("Compilation time is high".to_string());
                recommendations.push("Consider enabling more parallelization".to_string());
            }
            if metrics.test_time / total > TEST_SHARE_LIMIT {
                bottlenecks.push("Test time is high".to_string());
                recommendations.push("Consider optimizing test suite".to_string());
            }
        }

        if metrics.peak_memory_mb > HIGH_MEMORY_MB {
            bottlenecks.push("High memory usage".to_string());
            recommendations.push("Consider reducing parallel jobs".to_string());
        }

        if metrics.cache_hit_rate < LOW_HIT_RATE {
            bottlenecks.push("Low cache hit rate".to_string());
            recommendations.push("Improve cache warming strategy".to_string());
        }

        let mut score: i32 = 100;
        if total > SLOW_BUILD_SECS {
            score -= 20;
        }
        if metrics.cache_hit_rate < SCORE_HIT_RATE {
            score -= 15;
        }
        if metrics.peak_memory_mb > SCORE_MEMORY_MB {
            score -= 10;
        }

        PerformanceAnalysis {
            performance_score: score.max(0) as u32,
            bottlenecks,
            recommendations,
        }
    }

    /// Compare `current` against `baseline`.
    ///
    /// A baseline without build time yields a 0% build time change.
    pub fn compare(current: &BuildMetrics, baseline: &BuildMetrics) -> MetricsComparison {
        let mut improvements = Vec::new();
        let mut regressions = Vec::new();

        let absolute = current.total_build_time - baseline.total_build_time;
        let percent = if baseline.total_build_time > 0.0 {
            absolute / baseline.total_build_time * 100.0
        } else {
            0.0
        };

        if percent < -BUILD_TIME_THRESHOLD_PERCENT {
            improvements.push(format!("Build time improved by {:.1}%", percent.abs()));
        } else if percent > BUILD_TIME_THRESHOLD_PERCENT {
            regressions.push(format!("Build time regressed by {:.1}%", percent));
        }

        let hit_rate_change = current.cache_hit_rate - baseline.cache_hit_rate;
        if hit_rate_change > HIT_RATE_THRESHOLD {
            improvements.push(format!(
                "Cache hit rate improved by {:.1}%",
                hit_rate_change * 100.0
            ));
        } else if hit_rate_change < -HIT_RATE_THRESHOLD {
            regressions.push(format!(
                "Cache hit rate regressed by {:.1}%",
                hit_rate_change.abs() * 100.0
            ));
        }

        MetricsComparison {
            improvements,
            regressions,
            build_time: MetricChange { absolute, percent },
            cache_hit_rate: hit_rate_change,
        }
    }
}
