//! Background resource sampling of a build process.

use crate::error::{MetricsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tracing::{debug, info, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One observation of the monitored process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub timestamp: DateTime<Utc>,
    pub memory_mb: f64,
    pub cpu_percent: f64,
    /// Cumulative bytes read, in megabytes.
    pub disk_read_mb: f64,
    /// Cumulative bytes written, in megabytes.
    pub disk_write_mb: f64,
}

/// Source of resource samples.
pub trait ResourceProbe: Send + 'static {
    fn sample(&mut self) -> Result<ResourceSample>;
}

/// Samples a single process through `sysinfo`.
pub struct SysinfoProbe {
    system: System,
    pid: Pid,
}

impl SysinfoProbe {
    pub fn for_pid(pid: u32) -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(pid),
        }
    }

    /// Probe for the running process.
    pub fn current() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| MetricsError::ProcessNotFound(e.to_string()))?;
        Ok(Self {
            system: System::new(),
            pid,
        })
    }
}

impl ResourceProbe for SysinfoProbe {
    fn sample(&mut self) -> Result<ResourceSample> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let process = self
            .system
            .process(self.pid)
            .ok_or_else(|| MetricsError::ProcessNotFound(self.pid.to_string()))?;
        let disk = process.disk_usage();

        Ok(ResourceSample {
            timestamp: Utc::now(),
            memory_mb: process.memory() as f64 / BYTES_PER_MB,
            cpu_percent: f64::from(process.cpu_usage()),
            disk_read_mb: disk.total_read_bytes as f64 / BYTES_PER_MB,
            disk_write_mb: disk.total_written_bytes as f64 / BYTES_PER_MB,
        })
    }
}

/// Spawned sampling loop. Samples are handed back by [`ResourceMonitor::stop`].
pub struct ResourceMonitor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<Vec<ResourceSample>>,
}

impl ResourceMonitor {
    pub fn start<P: ResourceProbe>(probe: P, period: Duration) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(probe, period, shutdown_rx));
        info!(interval_ms = period.as_millis() as u64, "Starting resource monitoring");
        Self { shutdown, handle }
    }

    /// Stop sampling and return everything collected.
    pub async fn stop(self) -> Vec<ResourceSample> {
        let _ = self.shutdown.send(true);
        match self.handle.await {
            Ok(samples) => {
                info!(samples = samples.len(), "Stopped resource monitoring");
                samples
            }
            Err(e) => {
                warn!(error = %e, "Resource monitor task failed");
                Vec::new()
            }
        }
    }
}

async fn run<P: ResourceProbe>(
    mut probe: P,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Vec<ResourceSample> {
    let mut ticker = interval(period);
    let mut samples = Vec::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match probe.sample() {
                    Ok(sample) => {
                        debug!(memory_mb = sample.memory_mb, cpu = sample.cpu_percent, "Resource sample");
                        samples.push(sample);
                    }
                    Err(e) => warn!(error = %e, "Error sampling resources"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    samples
}
