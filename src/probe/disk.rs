// Mounted volumes from `df -kP`.

use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

use super::Source;
use crate::error::ProbeError;
use crate::models::DiskVolume;
use crate::source::CommandRunner;

pub const DF_PROGRAM: &str = "df";
/// POSIX output in 1 KiB blocks: one line per volume, no wrapping.
pub const DF_ARGS: &[&str] = &["-kP"];

const BLOCK_SIZE: u64 = 1024;

/// Memory-backed, virtual and container-layer filesystems.
const FILESYSTEM_DENYLIST: &[&str] = &[
    "tmpfs",
    "devtmpfs",
    "ramfs",
    "overlay",
    "overlayfs",
    "squashfs",
    "proc",
    "sysfs",
    "cgroup",
    "cgroup2",
    "devpts",
    "devfs",
    "debugfs",
    "tracefs",
    "securityfs",
    "pstore",
    "bpf",
    "configfs",
    "fusectl",
    "mqueue",
    "hugetlbfs",
    "binfmt_misc",
    "efivarfs",
    "nsfs",
    "autofs",
    "shm",
    "udev",
    "none",
    "map",
];

const MOUNTPOINT_DENYLIST: &[&str] = &[
    "/proc",
    "/sys",
    "/dev",
    "/run",
    "/snap",
    "/apex",
    "/System/Volumes/VM",
    "/System/Volumes/Preboot",
    "/System/Volumes/Update",
    "/System/Volumes/xarts",
    "/System/Volumes/iSCPreboot",
    "/System/Volumes/Hardware",
];

pub struct DfSource {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl DfSource {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    async fn read_volumes(&self) -> Result<Vec<DiskVolume>, ProbeError> {
        let output = self.runner.run(DF_PROGRAM, DF_ARGS, self.timeout).await?;
        parse_df(&output)
    }
}

impl Source<Vec<DiskVolume>> for DfSource {
    fn read(&self) -> BoxFuture<'_, Result<Vec<DiskVolume>, ProbeError>> {
        Box::pin(self.read_volumes())
    }
}

pub fn is_denylisted(filesystem: &str, mountpoint: &str) -> bool {
    FILESYSTEM_DENYLIST.contains(&filesystem)
        || MOUNTPOINT_DENYLIST.iter().any(|p| {
            mountpoint == *p
                || mountpoint
                    .strip_prefix(p)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
}

/// Parses POSIX `df -kP` output:
///
/// ```text
/// Filesystem     1024-blocks     Used Available Capacity Mounted on
/// /dev/sda1        102400000 45000000  57400000      44% /
/// ```
///
/// Rows that are not numeric (e.g. a filesystem name with a space in it) or
/// report zero size are skipped, as are denylisted filesystems.
pub fn parse_df(output: &str) -> Result<Vec<DiskVolume>, ProbeError> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| ProbeError::parse("df printed nothing"))?;
    if !header.trim_start().starts_with("Filesystem") {
        return Err(ProbeError::parse(format!(
            "unexpected df header: {:?}",
            header.trim()
        )));
    }

    let mut volumes = Vec::new();
    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            tracing::trace!(line, "df row too short");
            continue;
        }
        let filesystem = parts[0];
        let mountpoint = parts[5..].join(" ");
        if is_denylisted(filesystem, &mountpoint) {
            continue;
        }
        let (Ok(size_kb), Ok(used_kb), Ok(available_kb)) = (
            parts[1].parse::<u64>(),
            parts[2].parse::<u64>(),
            parts[3].parse::<u64>(),
        ) else {
            tracing::trace!(line, "df row not numeric");
            continue;
        };
        if size_kb == 0 {
            continue;
        }

        let size_bytes = size_kb.saturating_mul(BLOCK_SIZE);
        let used_bytes = used_kb.saturating_mul(BLOCK_SIZE);
        let usage_percent = parse_capacity(parts[4]).unwrap_or_else(|| {
            // df rounds its percentage up
            (used_kb as f64 / size_kb as f64 * 100.0).ceil()
        });

        volumes.push(DiskVolume {
            filesystem: filesystem.to_string(),
            mountpoint,
            size_bytes,
            used_bytes,
            available_bytes: available_kb.saturating_mul(BLOCK_SIZE),
            usage_percent,
        });
    }
    Ok(volumes)
}

fn parse_capacity(column: &str) -> Option<f64> {
    column.strip_suffix('%')?.parse().ok()
}
