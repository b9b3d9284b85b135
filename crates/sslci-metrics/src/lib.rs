//! Build metrics for OpenSSL CI jobs.
//!
//! A [`MetricsCollector`] times build phases and samples resource usage of the
//! build process while it runs. [`MetricsAnalyzer`] turns the finished
//! [`BuildMetrics`] into bottlenecks, a performance score and comparisons
//! against a baseline build.

pub mod analyzer;
pub mod collector;
pub mod error;
pub mod metrics;
pub mod monitor;

pub use analyzer::{MetricChange, MetricsAnalyzer, MetricsComparison, PerformanceAnalysis};
pub use collector::{BuildIdentity, MetricsCollector, PhaseTiming};
pub use error::{MetricsError, Result};
pub use metrics::{BuildMetrics, BuildPhase, BuildStatus};
pub use monitor::{ResourceMonitor, ResourceProbe, ResourceSample, SysinfoProbe};
