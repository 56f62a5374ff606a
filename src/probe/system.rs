// Host identity and memory, both read through sysinfo.

use futures_util::future::BoxFuture;

use super::Source;
use crate::error::ProbeError;
use crate::models::{HostInfo, MemoryStats};
use crate::source::{Platform, SysinfoRepo};

pub struct HostSource {
    repo: SysinfoRepo,
    platform: Platform,
}

impl HostSource {
    pub fn new(repo: SysinfoRepo, platform: Platform) -> Self {
        Self { repo, platform }
    }
}

impl Source<HostInfo> for HostSource {
    fn read(&self) -> BoxFuture<'_, Result<HostInfo, ProbeError>> {
        Box::pin(self.repo.host_info(self.platform))
    }
}

pub struct MemorySource {
    repo: SysinfoRepo,
}

impl MemorySource {
    pub fn new(repo: SysinfoRepo) -> Self {
        Self { repo }
    }
}

impl Source<MemoryStats> for MemorySource {
    fn read(&self) -> BoxFuture<'_, Result<MemoryStats, ProbeError>> {
        Box::pin(self.repo.memory_stats())
    }
}
