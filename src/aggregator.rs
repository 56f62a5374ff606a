// Fans out to every probe, joins, and builds the snapshot.

use anyhow::Context;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tracing::instrument;

use crate::config::ProbeConfig;
use crate::models::{
    AndroidStatus, CpuStats, DiskVolume, Domain, HostInfo, MemoryStats, NetworkStats,
    ProbeFailure, ServerMeta, Snapshot, SnapshotMeta, Status,
};
use crate::probe::android::AndroidSource;
use crate::probe::cpu::{LoadAverageCpuSource, ProcStatCpuSource};
use crate::probe::disk::DfSource;
use crate::probe::network::{ProcNetDevSource, SysinfoNetworkSource};
use crate::probe::system::{HostSource, MemorySource};
use crate::probe::{Probe, Source};
use crate::source::{Capabilities, CommandRunner, ProcFs, SysinfoRepo, SystemCommandRunner};
use crate::version::{NAME, VERSION};

/// One probe per domain, each owning its cache for the aggregator's lifetime.
pub struct ProbeSet {
    pub host: Probe<HostInfo>,
    pub memory: Probe<MemoryStats>,
    pub cpu: Probe<CpuStats>,
    pub disk: Probe<Vec<DiskVolume>>,
    pub network: Probe<NetworkStats>,
    pub android: Probe<AndroidStatus>,
}

impl ProbeSet {
    /// Probes for this host, with strategies chosen from what it offers.
    pub fn detect(config: &ProbeConfig) -> Self {
        let caps = Capabilities::detect(&config.proc_root);
        Self::for_capabilities(config, caps, Arc::new(SystemCommandRunner))
    }

    pub fn for_capabilities(
        config: &ProbeConfig,
        caps: Capabilities,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        tracing::info!(
            platform = caps.platform.as_str(),
            procfs = caps.procfs,
            "selecting probe strategies"
        );
        let procfs = ProcFs::new(&config.proc_root, config.file_timeout());

        let cpu: Box<dyn Source<CpuStats>> = if caps.procfs {
            Box::new(ProcStatCpuSource::new(procfs.clone()))
        } else {
            Box::new(LoadAverageCpuSource::new(SysinfoRepo::new()))
        };
        let network: Box<dyn Source<NetworkStats>> = if caps.procfs {
            Box::new(ProcNetDevSource::new(procfs))
        } else {
            Box::new(SysinfoNetworkSource::new(SysinfoRepo::new()))
        };

        let ttl = |d: Domain| config.ttl(d);
        let timeout = |d: Domain| config.probe_timeout(d);
        Self {
            host: Probe::new(
                Domain::Host,
                HostSource::new(SysinfoRepo::new(), caps.platform),
                ttl(Domain::Host),
                timeout(Domain::Host),
            ),
            memory: Probe::new(
                Domain::Memory,
                MemorySource::new(SysinfoRepo::new()),
                ttl(Domain::Memory),
                timeout(Domain::Memory),
            ),
            cpu: Probe::boxed(Domain::Cpu, cpu, ttl(Domain::Cpu), timeout(Domain::Cpu)),
            disk: Probe::new(
                Domain::Disk,
                DfSource::new(runner.clone(), config.command_timeout()),
                ttl(Domain::Disk),
                timeout(Domain::Disk),
            ),
            network: Probe::boxed(
                Domain::Network,
                network,
                ttl(Domain::Network),
                timeout(Domain::Network),
            ),
            android: Probe::new(
                Domain::Android,
                AndroidSource::new(
                    caps.platform,
                    runner,
                    &config.thermal_root,
                    config.command_timeout(),
                    config.file_timeout(),
                ),
                ttl(Domain::Android),
                timeout(Domain::Android),
            ),
        }
    }
}

pub struct Aggregator {
    probes: ProbeSet,
    started_at: Instant,
}

impl Aggregator {
    pub fn new(probes: ProbeSet) -> Self {
        Self {
            probes,
            started_at: Instant::now(),
        }
    }

    /// Runs all probes concurrently and assembles their results.
    ///
    /// Probe failures only mark the snapshot `partial`. An `Err` means the
    /// snapshot's own scaffolding could not be built.
    #[instrument(skip(self))]
    pub async fn collect(&self) -> anyhow::Result<Snapshot> {
        let started = Instant::now();
        let p = &self.probes;
        let (host, memory, cpu, disk, network, android) = tokio::join!(
            p.host.fetch(),
            p.memory.fetch(),
            p.cpu.fetch(),
            p.disk.fetch(),
            p.network.fetch(),
            p.android.fetch(),
        );
        let collection_time_ms = started.elapsed().as_millis() as u64;

        let warnings = failure_warnings([
            (Domain::Host, host.failure()),
            (Domain::Memory, memory.failure()),
            (Domain::Cpu, cpu.failure()),
            (Domain::Disk, disk.failure()),
            (Domain::Network, network.failure()),
            (Domain::Android, android.failure()),
        ]);
        let status = if warnings.is_empty() {
            Status::Ok
        } else {
            Status::Partial
        };

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock is before the Unix epoch")?
            .as_millis() as u64;

        tracing::debug!(
            collection_time_ms,
            warnings = warnings.len(),
            "snapshot collected"
        );

        Ok(Snapshot {
            timestamp,
            collection_time_ms,
            host,
            memory,
            cpu,
            disk,
            network,
            android,
            meta: SnapshotMeta {
                server: self.server_meta(),
                warnings,
                status,
            },
        })
    }

    fn server_meta(&self) -> ServerMeta {
        ServerMeta {
            name: NAME.to_string(),
            version: VERSION.to_string(),
            pid: std::process::id(),
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }
}

/// `"<domain>: <error>"` for each failed slot, in domain order.
fn failure_warnings<const N: usize>(slots: [(Domain, Option<&ProbeFailure>); N]) -> Vec<String> {
    slots
        .into_iter()
        .filter_map(|(domain, failure)| failure.map(|f| format!("{domain}: {}", f.error)))
        .collect()
}
