// Shared test helpers: scripted sources, a fake command runner, fixture payloads.
#![allow(dead_code)]

use futures_util::future::BoxFuture;
use hoststat::aggregator::ProbeSet;
use hoststat::error::ProbeError;
use hoststat::models::*;
use hoststat::probe::{Probe, Source};
use hoststat::source::CommandRunner;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const TEST_TTL: Duration = Duration::from_secs(5);
pub const TEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Always answers with the same outcome and counts reads.
pub struct FixedSource<T> {
    outcome: Result<T, ProbeError>,
    calls: Arc<AtomicUsize>,
}

impl<T> FixedSource<T> {
    pub fn ok(value: T) -> (Self, Arc<AtomicUsize>) {
        Self::new(Ok(value))
    }

    pub fn err(e: ProbeError) -> (Self, Arc<AtomicUsize>) {
        Self::new(Err(e))
    }

    fn new(outcome: Result<T, ProbeError>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                outcome,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl<T: Clone + Send + Sync> Source<T> for FixedSource<T> {
    fn read(&self) -> BoxFuture<'_, Result<T, ProbeError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.clone();
        Box::pin(async move { outcome })
    }
}

/// Returns 1, 2, 3, ... for successive reads; read `n` first sleeps `delays[n]`.
pub struct SequenceSource {
    delays: Vec<Duration>,
    calls: Arc<AtomicUsize>,
}

impl SequenceSource {
    pub fn new(delays: Vec<Duration>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                delays,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl Source<u32> for SequenceSource {
    fn read(&self) -> BoxFuture<'_, Result<u32, ProbeError>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.get(n).copied().unwrap_or_default();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(n as u32 + 1)
        })
    }
}

/// Canned stdout per program; anything unknown is "not found".
#[derive(Default)]
pub struct FakeRunner {
    responses: HashMap<String, Result<String, ProbeError>>,
    calls: AtomicUsize,
}

impl FakeRunner {
    pub fn with(mut self, program: &str, response: Result<&str, ProbeError>) -> Self {
        self.responses
            .insert(program.to_string(), response.map(str::to_string));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        program: &'a str,
        _args: &'a [&'a str],
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<String, ProbeError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .get(program)
            .cloned()
            .unwrap_or_else(|| Err(ProbeError::unavailable(format!("{program} not found"))));
        Box::pin(async move { response })
    }
}

pub fn probe<T: Clone + Send + Sync + 'static>(
    domain: Domain,
    source: impl Source<T> + 'static,
) -> Probe<T> {
    Probe::new(domain, source, TEST_TTL, TEST_TIMEOUT)
}

pub fn host_info() -> HostInfo {
    HostInfo {
        hostname: "testhost".into(),
        os_name: "Linux".into(),
        os_version: "12".into(),
        kernel_version: "6.1.0".into(),
        architecture: "x86_64".into(),
        platform: "linux".into(),
        uptime_secs: 3600,
        boot_time: 1_700_000_000,
        process_count: 123,
    }
}

pub fn memory_stats() -> MemoryStats {
    MemoryStats {
        total: 8 * 1024 * 1024 * 1024,
        used: 2 * 1024 * 1024 * 1024,
        available: 6 * 1024 * 1024 * 1024,
        free: 5 * 1024 * 1024 * 1024,
        usage_percent: 25.0,
        swap: SwapStats {
            total: 0,
            used: 0,
            free: 0,
            usage_percent: 0.0,
        },
    }
}

pub fn cpu_stats() -> CpuStats {
    CpuStats {
        model: "Test CPU".into(),
        cores: 2,
        usage_percent: 12.5,
        estimated: false,
        per_core: vec![10.0, 15.0],
        load_average: LoadAverage {
            one: 0.5,
            five: 0.4,
            fifteen: 0.3,
        },
    }
}

pub fn disk_volumes() -> Vec<DiskVolume> {
    vec![DiskVolume {
        filesystem: "/dev/sda1".into(),
        mountpoint: "/".into(),
        size_bytes: 100 * 1024,
        used_bytes: 40 * 1024,
        available_bytes: 60 * 1024,
        usage_percent: 40.0,
    }]
}

pub fn network_stats() -> NetworkStats {
    NetworkStats::from_interfaces([InterfaceStats {
        name: "eth0".into(),
        rx: TrafficCounters {
            bytes: 1000,
            packets: 10,
            errors: 0,
            dropped: 0,
        },
        tx: TrafficCounters {
            bytes: 500,
            packets: 5,
            errors: 0,
            dropped: 0,
        },
    }])
}

/// Every probe succeeds with fixture data.
pub fn healthy_probes() -> ProbeSet {
    ProbeSet {
        host: probe(Domain::Host, FixedSource::ok(host_info()).0),
        memory: probe(Domain::Memory, FixedSource::ok(memory_stats()).0),
        cpu: probe(Domain::Cpu, FixedSource::ok(cpu_stats()).0),
        disk: probe(Domain::Disk, FixedSource::ok(disk_volumes()).0),
        network: probe(Domain::Network, FixedSource::ok(network_stats()).0),
        android: probe(
            Domain::Android,
            FixedSource::ok(AndroidStatus::unavailable("not an Android host")).0,
        ),
    }
}

/// Every probe fails with `source-unavailable`.
pub fn failing_probes() -> ProbeSet {
    fn failing<T: Clone + Send + Sync + 'static>(domain: Domain) -> Probe<T> {
        probe(
            domain,
            FixedSource::<T>::err(ProbeError::unavailable(format!("{domain} down"))).0,
        )
    }
    ProbeSet {
        host: failing(Domain::Host),
        memory: failing(Domain::Memory),
        cpu: failing(Domain::Cpu),
        disk: failing(Domain::Disk),
        network: failing(Domain::Network),
        android: failing(Domain::Android),
    }
}
