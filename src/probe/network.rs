// Interface counters: /proc/net/dev where available, sysinfo otherwise.

use futures_util::future::BoxFuture;

use super::Source;
use crate::error::ProbeError;
use crate::models::NetworkStats;
use crate::source::{ProcFs, SysinfoRepo};

pub struct ProcNetDevSource {
    procfs: ProcFs,
}

impl ProcNetDevSource {
    pub fn new(procfs: ProcFs) -> Self {
        Self { procfs }
    }

    async fn read_stats(&self) -> Result<NetworkStats, ProbeError> {
        Ok(NetworkStats::from_interfaces(self.procfs.net_dev().await?))
    }
}

impl Source<NetworkStats> for ProcNetDevSource {
    fn read(&self) -> BoxFuture<'_, Result<NetworkStats, ProbeError>> {
        Box::pin(self.read_stats())
    }
}

pub struct SysinfoNetworkSource {
    repo: SysinfoRepo,
}

impl SysinfoNetworkSource {
    pub fn new(repo: SysinfoRepo) -> Self {
        Self { repo }
    }

    async fn read_stats(&self) -> Result<NetworkStats, ProbeError> {
        Ok(NetworkStats::from_interfaces(
            self.repo.network_interfaces().await?,
        ))
    }
}

impl Source<NetworkStats> for SysinfoNetworkSource {
    fn read(&self) -> BoxFuture<'_, Result<NetworkStats, ProbeError>> {
        Box::pin(self.read_stats())
    }
}
