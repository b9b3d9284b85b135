//! Build metrics collection.

use crate::error::Result;
use crate::metrics::{BuildMetrics, BuildPhase, BuildStatus};
use crate::monitor::{ResourceMonitor, ResourceProbe, ResourceSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::time::Duration;
use tracing::{info, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Identity of the build being measured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildIdentity {
    pub build_id: String,
    pub source_repo: String,
    pub source_sha: String,
    pub platform: String,
    pub profile: String,
    pub build_scope: String,
}

/// Wall-clock record of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub started_at: DateTime<Utc>,
    /// Seconds; absent while the phase is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Serialize)]
struct SavedMetrics<'a> {
    #[serde(flatten)]
    metrics: &'a BuildMetrics,
    resource_samples: &'a [ResourceSample],
    phase_times: &'a BTreeMap<String, PhaseTiming>,
}

pub struct MetricsCollector {
    metrics: BuildMetrics,
    started: Instant,
    phase_times: BTreeMap<String, PhaseTiming>,
    phase_starts: HashMap<String, Instant>,
    monitor: Option<ResourceMonitor>,
    samples: Vec<ResourceSample>,
}

impl MetricsCollector {
    pub fn new(identity: BuildIdentity) -> Self {
        Self {
            metrics: BuildMetrics::new(
                identity.build_id,
                identity.source_repo,
                identity.source_sha,
                identity.platform,
                identity.profile,
                identity.build_scope,
            ),
            started: Instant::now(),
            phase_times: BTreeMap::new(),
            phase_starts: HashMap::new(),
            monitor: None,
            samples: Vec::new(),
        }
    }

    pub fn metrics(&self) -> &BuildMetrics {
        &self.metrics
    }

    pub fn phase_times(&self) -> &BTreeMap<String, PhaseTiming> {
        &self.phase_times
    }

    pub fn samples(&self) -> &[ResourceSample] {
        &self.samples
    }

    /// Start sampling with `probe` every `period`. A running monitor is kept.
    pub fn start_monitoring<P: ResourceProbe>(&mut self, probe: P, period: Duration) {
        if self.monitor.is_some() {
            warn!("Resource monitoring already running");
            return;
        }
        self.monitor = Some(ResourceMonitor::start(probe, period));
    }

    pub async fn stop_monitoring(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            self.samples.extend(monitor.stop().await);
        }
    }

    pub fn start_phase(&mut self, name: &str) {
        info!(phase = %name, "Starting phase");
        self.phase_starts.insert(name.to_string(), Instant::now());
        self.phase_times.insert(
            name.to_string(),
            PhaseTiming {
                started_at: Utc::now(),
                duration: None,
            },
        );
    }

    /// Finish a phase and return its duration in seconds.
    ///
    /// Phases outside [`BuildPhase`] are recorded in the phase map only.
    pub fn end_phase(&mut self, name: &str) -> Option<f64> {
        let Some(start) = self.phase_starts.remove(name) else {
            warn!(phase = %name, "Phase was never started");
            return None;
        };

        let duration = start.elapsed().as_secs_f64();
        if let Some(timing) = self.phase_times.get_mut(name) {
            timing.duration = Some(duration);
        }
        if let Ok(phase) = name.parse::<BuildPhase>() {
            self.metrics.set_phase_time(phase, duration);
        }

        info!(phase = %name, duration_secs = duration, "Phase completed");
        Some(duration)
    }

    pub fn record_cache_metrics(&mut self, hit_rate: f64, miss_count: u64, cache_size_mb: f64) {
        info!(hit_rate, misses = miss_count, size_mb = cache_size_mb, "Cache metrics");
        self.metrics.cache_hit_rate = hit_rate;
        self.metrics.cache_miss_count = miss_count;
        self.metrics.cache_size_mb = cache_size_mb;
    }

    pub fn record_test_results(&mut self, passed: u64, failed: u64, skipped: u64) {
        info!(passed, failed, skipped, "Test results");
        self.metrics.test_passed = passed;
        self.metrics.test_failed = failed;
        self.metrics.test_skipped = skipped;
    }

    pub fn record_build_status(&mut self, status: BuildStatus) {
        info!(status = %status, "Build status");
        self.metrics.build_status = status;
    }

    /// Count and size the artifacts that exist. Missing paths are ignored.
    pub fn record_artifacts(&mut self, paths: &[PathBuf]) {
        let mut count = 0;
        let mut bytes = 0u64;

        for path in paths {
            match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() => {
                    count += 1;
                    bytes += meta.len();
                }
                _ => warn!(path = %path.display(), "Artifact not found"),
            }
        }

        self.metrics.artifact_count = count;
        self.metrics.artifact_size_mb = bytes as f64 / BYTES_PER_MB;
        info!(count, size_mb = self.metrics.artifact_size_mb, "Artifacts");
    }

    pub fn record_quality_metrics(&mut self, warnings: u64, errors: u64) {
        info!(warnings, errors, "Quality metrics");
        self.metrics.warnings_count = warnings;
        self.metrics.errors_count = errors;
    }

    /// Stop monitoring and fold the samples and elapsed time into the metrics.
    pub async fn finalize(&mut self) -> BuildMetrics {
        self.stop_monitoring().await;
        self.metrics.total_build_time = self.started.elapsed().as_secs_f64();

        if let Some(last) = self.samples.last() {
            let n = self.samples.len() as f64;
            self.metrics.avg_cpu_percent =
                self.samples.iter().map(|s| s.cpu_percent).sum::<f64>() / n;
            self.metrics.peak_cpu_percent = self
                .samples
                .iter()
                .map(|s| s.cpu_percent)
                .fold(self.metrics.peak_cpu_percent, f64::max);
            self.metrics.peak_memory_mb = self
                .samples
                .iter()
                .map(|s| s.memory_mb)
                .fold(self.metrics.peak_memory_mb, f64::max);
            self.metrics.disk_io_read_mb = last.disk_read_mb;
            self.metrics.disk_io_write_mb = last.disk_write_mb;
        }

        info!(
            build_id = %self.metrics.build_id,
            total_secs = self.metrics.total_build_time,
            "Metrics finalized"
        );
        self.metrics.clone()
    }

    /// Write the metrics with resource samples and phase times as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let saved = SavedMetrics {
            metrics: &self.metrics,
            resource_samples: &self.samples,
            phase_times: &self.phase_times,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(&saved)?)?;
        info!(path = %path.display(), "Metrics saved");
        Ok(())
    }

    pub fn summary_report(&self) -> String {
        let m = &self.metrics;
        let mut out = String::new();

        let _ = writeln!(out, "Build Metrics Summary");
        let _ = writeln!(out, "=====================");
        let _ = writeln!(out);
        let _ = writeln!(out, "Build Information:");
        let _ = writeln!(out, "- Build ID: {}", m.build_id);
        let _ = writeln!(out, "- Source: {}@{}", m.source_repo, m.short_sha());
        let _ = writeln!(out, "- Platform: {}", m.platform);
        let _ = writeln!(out, "- Profile: {}", m.profile);
        let _ = writeln!(out, "- Scope: {}", m.build_scope);
        let _ = writeln!(out, "- Status: {}", m.build_status);
        let _ = writeln!(out);
        let _ = writeln!(out, "Performance:");
        let _ = writeln!(out, "- Total Time: {:.2}s", m.total_build_time);
        for phase in BuildPhase::ALL {
            let label = capitalize(phase.as_str());
            let _ = writeln!(out, "- {}: {:.2}s", label, m.phase_time(phase));
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Resources:");
        let _ = writeln!(out, "- Peak Memory: {:.1}MB", m.peak_memory_mb);
        let _ = writeln!(out, "- Avg CPU: {:.1}%", m.avg_cpu_percent);
        let _ = writeln!(out, "- Peak CPU: {:.1}%", m.peak_cpu_percent);
        let _ = writeln!(out, "- Disk Read: {:.1}MB", m.disk_io_read_mb);
        let _ = writeln!(out, "- Disk Write: {:.1}MB", m.disk_io_write_mb);
        let _ = writeln!(out);
        let _ = writeln!(out, "Cache:");
        let _ = writeln!(out, "- Hit Rate: {:.1}%", m.cache_hit_rate * 100.0);
        let _ = writeln!(out, "- Misses: {}", m.cache_miss_count);
        let _ = writeln!(out, "- Size: {:.1}MB", m.cache_size_mb);
        let _ = writeln!(out);
        let _ = writeln!(out, "Tests:");
        let _ = writeln!(out, "- Passed: {}", m.test_passed);
        let _ = writeln!(out, "- Failed: {}", m.test_failed);
        let _ = writeln!(out, "- Skipped: {}", m.test_skipped);
        let _ = writeln!(out);
        let _ = writeln!(out, "Artifacts:");
        let _ = writeln!(out, "- Count: {}", m.artifact_count);
        let _ = writeln!(out, "- Size: {:.1}MB", m.artifact_size_mb);
        let _ = writeln!(out);
        let _ = writeln!(out, "Quality:");
        let _ = writeln!(out, "- Warnings: {}", m.warnings_count);
        let _ = writeln!(out, "- Errors: {}", m.errors_count);

        out
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
