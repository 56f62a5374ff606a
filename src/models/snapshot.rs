// Aggregated snapshot handed to the transport layer

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AndroidStatus, CpuStats, DiskVolume, HostInfo, MemoryStats, NetworkStats, ProbeResult};

/// Metric domains, one probe each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Host,
    Memory,
    Cpu,
    Disk,
    Network,
    Android,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Host,
        Domain::Memory,
        Domain::Cpu,
        Domain::Disk,
        Domain::Network,
        Domain::Android,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Host => "host",
            Domain::Memory => "memory",
            Domain::Cpu => "cpu",
            Domain::Disk => "disk",
            Domain::Network => "network",
            Domain::Android => "android",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Partial,
}

/// Identity of the serving process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMeta {
    pub name: String,
    pub version: String,
    pub pid: u32,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub server: ServerMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub status: Status,
}

/// One complete aggregation. Built once per collection cycle and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Unix epoch milliseconds.
    pub timestamp: u64,
    pub collection_time_ms: u64,
    pub host: ProbeResult<HostInfo>,
    pub memory: ProbeResult<MemoryStats>,
    pub cpu: ProbeResult<CpuStats>,
    pub disk: ProbeResult<Vec<DiskVolume>>,
    pub network: ProbeResult<NetworkStats>,
    pub android: ProbeResult<AndroidStatus>,
    pub meta: SnapshotMeta,
}
