use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::Domain;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// When set, `/api/metrics` requires this bearer token.
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Cache lifetimes, external call bounds and source locations. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub host_ttl_ms: u64,
    pub memory_ttl_ms: u64,
    pub cpu_ttl_ms: u64,
    pub disk_ttl_ms: u64,
    pub network_ttl_ms: u64,
    pub android_ttl_ms: u64,
    /// Bound on each subprocess (df, termux-battery-status, getprop).
    pub command_timeout_ms: u64,
    /// Bound on each procfs/sysfs file read.
    pub file_timeout_ms: u64,
    pub proc_root: PathBuf,
    pub thermal_root: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host_ttl_ms: 60_000,
            memory_ttl_ms: 2_000,
            cpu_ttl_ms: 5_000,
            disk_ttl_ms: 30_000,
            network_ttl_ms: 2_000,
            android_ttl_ms: 5_000,
            command_timeout_ms: 5_000,
            file_timeout_ms: 1_000,
            proc_root: PathBuf::from("/proc"),
            thermal_root: PathBuf::from("/sys/class/thermal"),
        }
    }
}

const MAX_TIMEOUT_MS: u64 = 60_000;

impl ProbeConfig {
    pub fn ttl(&self, domain: Domain) -> Duration {
        Duration::from_millis(match domain {
            Domain::Host => self.host_ttl_ms,
            Domain::Memory => self.memory_ttl_ms,
            Domain::Cpu => self.cpu_ttl_ms,
            Domain::Disk => self.disk_ttl_ms,
            Domain::Network => self.network_ttl_ms,
            Domain::Android => self.android_ttl_ms,
        })
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_millis(self.file_timeout_ms)
    }

    /// Outer bound on one probe read. Subprocess-backed probes get a second of
    /// slack so the inner per-call timeout reports first.
    pub fn probe_timeout(&self, domain: Domain) -> Duration {
        match domain {
            Domain::Disk | Domain::Android => self.command_timeout() + Duration::from_secs(1),
            _ => self.command_timeout(),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        for domain in Domain::ALL {
            anyhow::ensure!(
                !self.ttl(domain).is_zero(),
                "probes.{}_ttl_ms must be > 0",
                domain
            );
        }
        anyhow::ensure!(
            (1..=MAX_TIMEOUT_MS).contains(&self.command_timeout_ms),
            "probes.command_timeout_ms must be between 1 and {}, got {}",
            MAX_TIMEOUT_MS,
            self.command_timeout_ms
        );
        anyhow::ensure!(
            (1..=MAX_TIMEOUT_MS).contains(&self.file_timeout_ms),
            "probes.file_timeout_ms must be between 1 and {}, got {}",
            MAX_TIMEOUT_MS,
            self.file_timeout_ms
        );
        anyhow::ensure!(
            !self.proc_root.as_os_str().is_empty(),
            "probes.proc_root must be non-empty"
        );
        anyhow::ensure!(
            !self.thermal_root.as_os_str().is_empty(),
            "probes.thermal_root must be non-empty"
        );
        Ok(())
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        if let Some(token) = &self.server.auth_token {
            anyhow::ensure!(
                !token.trim().is_empty(),
                "server.auth_token must be non-empty when set"
            );
        }
        self.probes.validate()
    }
}
