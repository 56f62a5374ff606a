// CPU usage: counter deltas from /proc/stat, or the load-average estimate where
// no counter source exists.

use futures_util::future::BoxFuture;
use std::sync::{Mutex, PoisonError};
use tokio::sync::OnceCell;
use tokio::time::Instant;

use super::Source;
use crate::error::ProbeError;
use crate::models::{CpuStats, LoadAverage};
use crate::source::procfs::CpuTimes;
use crate::source::{ProcFs, SysinfoRepo};

/// Multiplier turning the 1-minute load average into a pseudo percentage.
/// An approximation kept for compatibility, not a measurement.
pub const LOAD_AVERAGE_SCALE: f64 = 10.0;

/// `min(100, load1 * 10)`
pub fn load_average_estimate(load_one: f64) -> f64 {
    (load_one * LOAD_AVERAGE_SCALE).clamp(0.0, 100.0)
}

/// One reading of the aggregate cumulative tick counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCounterSample {
    pub idle_ticks: u64,
    pub iowait_ticks: u64,
    pub total_ticks: u64,
    pub captured_at: Instant,
}

impl CpuCounterSample {
    pub fn from_times(times: CpuTimes, captured_at: Instant) -> Self {
        Self {
            idle_ticks: times.idle,
            iowait_ticks: times.iowait,
            total_ticks: times.total,
            captured_at,
        }
    }

    fn idle_with_iowait(&self) -> u64 {
        self.idle_ticks.saturating_add(self.iowait_ticks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuUsage {
    pub percent: f64,
    /// Load-average estimate rather than a counter delta.
    pub estimated: bool,
}

impl CpuUsage {
    fn estimate(load_one: f64) -> Self {
        Self {
            percent: load_average_estimate(load_one),
            estimated: true,
        }
    }
}

/// Turns successive cumulative samples into a usage rate.
///
/// Uninitialized until the first sample, which yields the load-average
/// estimate. From then on every sample is compared against the stored one
/// and replaces it. Failed reads never reach the tracker, so they leave the
/// stored sample alone.
#[derive(Debug, Default)]
pub struct CpuDeltaTracker {
    last: Option<CpuCounterSample>,
}

impl CpuDeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seeded(&self) -> bool {
        self.last.is_some()
    }

    pub fn last_sample(&self) -> Option<&CpuCounterSample> {
        self.last.as_ref()
    }

    /// A sample older than the stored one (an overlapping read that finished
    /// late) gets the estimate and is dropped, so the tracker never moves back.
    pub fn observe(&mut self, sample: CpuCounterSample, load_one: f64) -> CpuUsage {
        if let Some(prev) = &self.last
            && sample.captured_at < prev.captured_at
        {
            tracing::debug!("discarding out-of-order cpu sample");
            return CpuUsage::estimate(load_one);
        }
        let usage = self
            .last
            .as_ref()
            .and_then(|prev| delta_usage(prev, &sample))
            .map(|percent| CpuUsage {
                percent,
                estimated: false,
            })
            .unwrap_or_else(|| CpuUsage::estimate(load_one));
        self.last = Some(sample);
        usage
    }
}

/// `100 * (1 - idleDelta / totalDelta)`, or None when the pair cannot give a rate
/// (no ticks elapsed, counters reset).
fn delta_usage(prev: &CpuCounterSample, next: &CpuCounterSample) -> Option<f64> {
    let total = next.total_ticks.checked_sub(prev.total_ticks)?;
    let idle = next
        .idle_with_iowait()
        .checked_sub(prev.idle_with_iowait())?;
    if total == 0 {
        return None;
    }
    Some((100.0 * (1.0 - idle as f64 / total as f64)).clamp(0.0, 100.0))
}

/// Assembles the payload. An aggregate of exactly 0 next to busy cores is
/// replaced by the per-core mean.
pub fn cpu_stats(
    model: String,
    usage: CpuUsage,
    per_core: Vec<f64>,
    load_average: LoadAverage,
) -> CpuStats {
    let mut usage_percent = usage.percent;
    if usage_percent == 0.0 && per_core.iter().any(|c| *c > 0.0) {
        usage_percent = per_core.iter().sum::<f64>() / per_core.len() as f64;
    }
    CpuStats {
        model,
        cores: per_core.len().min(u32::MAX as usize) as u32,
        usage_percent,
        estimated: usage.estimated,
        per_core,
        load_average,
    }
}

/// Counter-based strategy for hosts with a readable `/proc/stat`.
pub struct ProcStatCpuSource {
    procfs: ProcFs,
    model: OnceCell<String>,
    tracker: Mutex<CpuDeltaTracker>,
}

impl ProcStatCpuSource {
    pub fn new(procfs: ProcFs) -> Self {
        Self {
            procfs,
            model: OnceCell::new(),
            tracker: Mutex::new(CpuDeltaTracker::new()),
        }
    }

    async fn read_stats(&self) -> Result<CpuStats, ProbeError> {
        let started = Instant::now();
        let (stat, load) = tokio::join!(self.procfs.stat(), self.procfs.loadavg());
        let stat = stat?;
        let load = load?;
        let sample = CpuCounterSample::from_times(stat.aggregate, started);

        let usage = self
            .tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(sample, load.one);

        let model = self
            .model
            .get_or_init(|| async {
                self.procfs
                    .cpu_model()
                    .await
                    .unwrap_or_else(|| "Unknown".into())
            })
            .await
            .clone();
        let per_core = stat.cores.iter().map(CpuTimes::usage_since_boot).collect();

        Ok(cpu_stats(model, usage, per_core, load))
    }
}

impl Source<CpuStats> for ProcStatCpuSource {
    fn read(&self) -> BoxFuture<'_, Result<CpuStats, ProbeError>> {
        Box::pin(self.read_stats())
    }
}

/// Strategy for hosts without a tick counter source: load-average estimate plus
/// sysinfo's per-core figures.
pub struct LoadAverageCpuSource {
    repo: SysinfoRepo,
}

impl LoadAverageCpuSource {
    pub fn new(repo: SysinfoRepo) -> Self {
        Self { repo }
    }

    async fn read_stats(&self) -> Result<CpuStats, ProbeError> {
        let reading = self.repo.cpu_reading().await?;
        let usage = CpuUsage::estimate(reading.load_average.one);
        Ok(cpu_stats(
            reading.model,
            usage,
            reading.per_core,
            reading.load_average,
        ))
    }
}

impl Source<CpuStats> for LoadAverageCpuSource {
    fn read(&self) -> BoxFuture<'_, Result<CpuStats, ProbeError>> {
        Box::pin(self.read_stats())
    }
}
