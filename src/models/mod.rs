// Domain models serialized into the snapshot document

mod android;
mod network;
mod result;
mod snapshot;
mod storage;
mod system;

pub use android::{AndroidStatus, BatteryStatus, DeviceProps, ThermalZone};
pub use network::{InterfaceStats, NetworkStats, TrafficCounters};
pub use result::{ProbeFailure, ProbeResult};
pub use snapshot::{Domain, ServerMeta, Snapshot, SnapshotMeta, Status};
pub use storage::DiskVolume;
pub use system::{CpuStats, HostInfo, LoadAverage, MemoryStats, SwapStats, percent_of};
