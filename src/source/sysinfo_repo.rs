// Host, memory and fallback CPU/network readings via sysinfo.
// sysinfo calls block, so each one runs on the blocking pool.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use sysinfo::{Networks, ProcessesToUpdate, System};
use tracing::instrument;

use super::Platform;
use crate::error::ProbeError;
use crate::models::{
    HostInfo, InterfaceStats, LoadAverage, MemoryStats, SwapStats, TrafficCounters, percent_of,
};

/// Per-core usage and identity from sysinfo, for hosts without procfs.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuReading {
    pub model: String,
    pub per_core: Vec<f64>,
    pub load_average: LoadAverage,
}

/// One sysinfo reader. Not `Clone`: every source owns its own, so a slow
/// refresh in one probe never holds a lock another probe is waiting on.
pub struct SysinfoRepo {
    sys: Arc<Mutex<System>>,
    networks: Arc<Mutex<Networks>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

// each refresh overwrites what it reads, so a poisoned guard is still usable
fn lock<T>(m: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn joined(e: tokio::task::JoinError) -> ProbeError {
    ProbeError::unavailable(format!("sysinfo task join: {e}"))
}

impl SysinfoRepo {
    pub fn new() -> Self {
        Self {
            sys: Arc::new(Mutex::new(System::new())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "host_info"))]
    pub async fn host_info(&self, platform: Platform) -> Result<HostInfo, ProbeError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || -> Result<HostInfo, ProbeError> {
            let mut sys = lock(&sys);
            sys.refresh_processes(ProcessesToUpdate::All, true);
            Ok(HostInfo {
                hostname: System::host_name().unwrap_or_else(|| "unknown".into()),
                os_name: System::name().unwrap_or_else(|| std::env::consts::OS.into()),
                os_version: System::os_version().unwrap_or_default(),
                kernel_version: System::kernel_version().unwrap_or_default(),
                architecture: std::env::consts::ARCH.to_string(),
                platform: platform.as_str().to_string(),
                uptime_secs: System::uptime(),
                boot_time: System::boot_time(),
                process_count: sys.processes().len().min(u32::MAX as usize) as u32,
            })
        })
        .await
        .map_err(joined)?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "memory_stats"))]
    pub async fn memory_stats(&self) -> Result<MemoryStats, ProbeError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = lock(&sys);
            sys.refresh_memory();

            let total = sys.total_memory();
            if total == 0 {
                return Err(ProbeError::unavailable("sysinfo reported no memory"));
            }
            let available = sys.available_memory();
            let used = total.saturating_sub(available);
            let swap_total = sys.total_swap();
            let swap_used = sys.used_swap();

            Ok(MemoryStats {
                total,
                used,
                available,
                free: sys.free_memory(),
                usage_percent: percent_of(used, total),
                swap: SwapStats {
                    total: swap_total,
                    used: swap_used,
                    free: sys.free_swap(),
                    usage_percent: percent_of(swap_used, swap_total),
                },
            })
        })
        .await
        .map_err(joined)?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "cpu_reading"))]
    pub async fn cpu_reading(&self) -> Result<CpuReading, ProbeError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = lock(&sys);
            sys.refresh_cpu_all();
            let cpus = sys.cpus();
            if cpus.is_empty() {
                return Err(ProbeError::unavailable("sysinfo reported no CPUs"));
            }
            let load = System::load_average();
            Ok(CpuReading {
                model: cpus
                    .first()
                    .map(|c| c.brand().trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "Unknown".into()),
                per_core: cpus.iter().map(|c| c.cpu_usage() as f64).collect(),
                load_average: LoadAverage {
                    one: load.one,
                    five: load.five,
                    fifteen: load.fifteen,
                },
            })
        })
        .await
        .map_err(joined)?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "network_interfaces"))]
    pub async fn network_interfaces(&self) -> Result<Vec<InterfaceStats>, ProbeError> {
        let networks = self.networks.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<InterfaceStats>, ProbeError> {
            let mut networks = lock(&networks);
            networks.refresh(true);
            Ok(networks
                .list()
                .iter()
                .map(|(name, data)| InterfaceStats {
                    name: name.clone(),
                    rx: TrafficCounters {
                        bytes: data.total_received(),
                        packets: data.total_packets_received(),
                        errors: data.total_errors_on_received(),
                        dropped: 0,
                    },
                    tx: TrafficCounters {
                        bytes: data.total_transmitted(),
                        packets: data.total_packets_transmitted(),
                        errors: data.total_errors_on_transmitted(),
                        dropped: 0,
                    },
                })
                .collect())
        })
        .await
        .map_err(joined)?
    }
}
