// Raw source readers: subprocesses, procfs-style files, sysinfo.
// Every external call here is bounded by a timeout and reports a ProbeError.

pub mod procfs;
pub mod sysinfo_repo;

use futures_util::future::BoxFuture;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use crate::error::ProbeError;

pub use procfs::ProcFs;
pub use sysinfo_repo::SysinfoRepo;

/// Host platform, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Android, usually under Termux.
    Android,
    Linux,
    Other,
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(target_os = "android") || is_termux_env() {
            Platform::Android
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Linux => "linux",
            Platform::Other => std::env::consts::OS,
        }
    }
}

/// Termux may run plain linux binaries; its environment gives it away.
fn is_termux_env() -> bool {
    std::env::var_os("TERMUX_VERSION").is_some()
        || std::env::var("PREFIX").is_ok_and(|p| p.contains("com.termux"))
}

/// What the host offers, probed once so strategies are not re-chosen on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub platform: Platform,
    /// `<proc_root>/stat` can be opened. Android 8+ denies it to apps.
    pub procfs: bool,
}

impl Capabilities {
    pub fn detect(proc_root: &Path) -> Self {
        Self {
            platform: Platform::detect(),
            procfs: std::fs::File::open(proc_root.join("stat")).is_ok(),
        }
    }
}

/// Runs an external program and returns its stdout.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
        timeout: Duration,
    ) -> BoxFuture<'a, Result<String, ProbeError>>;
}

/// Spawns real processes with tokio. The child is killed if the timeout fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
        timeout: Duration,
    ) -> BoxFuture<'a, Result<String, ProbeError>> {
        Box::pin(async move {
            let mut cmd = tokio::process::Command::new(program);
            cmd.args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let output = match tokio::time::timeout(timeout, cmd.output()).await {
                Err(_) => return Err(ProbeError::Timeout(timeout)),
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ProbeError::unavailable(format!("{program} not found")));
                }
                Ok(Err(e)) => return Err(ProbeError::unavailable(format!("{program}: {e}"))),
                Ok(Ok(output)) => output,
            };

            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            if !output.status.success() {
                // df exits non-zero when a single mount is unreadable but still lists the rest
                if stdout.trim().is_empty() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(ProbeError::unavailable(format!(
                        "{program} exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )));
                }
                tracing::debug!(program, status = %output.status, "command exited non-zero, using partial output");
            }
            Ok(stdout)
        })
    }
}

/// Reads a whole text file, giving up after `timeout`.
pub async fn read_file(path: &Path, timeout: Duration) -> Result<String, ProbeError> {
    match tokio::time::timeout(timeout, tokio::fs::read_to_string(path)).await {
        Err(_) => Err(ProbeError::Timeout(timeout)),
        Ok(Ok(s)) => Ok(s),
        Ok(Err(e)) => Err(ProbeError::unavailable(format!("{}: {e}", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_file_missing_is_source_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_file(&dir.path().join("nope"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "source-unavailable");
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn missing_program_is_source_unavailable() {
        let err = SystemCommandRunner
            .run(
                "hoststat-definitely-not-installed",
                &[],
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "source-unavailable");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_program_is_killed_at_timeout() {
        let started = std::time::Instant::now();
        let err = SystemCommandRunner
            .run("sleep", &["5"], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_keeps_partial_stdout() {
        let out = SystemCommandRunner
            .run("sh", &["-c", "echo partial; exit 1"], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.trim(), "partial");

        let err = SystemCommandRunner
            .run("sh", &["-c", "echo oops >&2; exit 2"], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "source-unavailable");
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn capabilities_without_stat_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(!Capabilities::detect(dir.path()).procfs);
        std::fs::write(dir.path().join("stat"), "cpu 1 2 3 4\n").unwrap();
        assert!(Capabilities::detect(dir.path()).procfs);
    }
}
