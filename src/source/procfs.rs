// procfs readers and parsers: /proc/stat, /proc/loadavg, /proc/net/dev, /proc/cpuinfo.
// The root is configurable so tests can point at a fake tree.

use std::path::PathBuf;
use std::time::Duration;

use super::read_file;
use crate::error::ProbeError;
use crate::models::{InterfaceStats, LoadAverage, TrafficCounters};

/// Cumulative tick counters for one `cpu` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub iowait: u64,
    /// user + nice + system + idle + iowait + irq + softirq + steal
    pub total: u64,
}

impl CpuTimes {
    /// Busy share since boot. Good enough per core, where no delta is kept.
    pub fn usage_since_boot(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let idle = self.idle.saturating_add(self.iowait) as f64;
        (100.0 * (1.0 - idle / self.total as f64)).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub aggregate: CpuTimes,
    pub cores: Vec<CpuTimes>,
}

#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
    timeout: Duration,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    pub async fn stat(&self) -> Result<ProcStat, ProbeError> {
        let content = read_file(&self.root.join("stat"), self.timeout).await?;
        parse_stat(&content)
    }

    pub async fn loadavg(&self) -> Result<LoadAverage, ProbeError> {
        let content = read_file(&self.root.join("loadavg"), self.timeout).await?;
        parse_loadavg(&content)
    }

    pub async fn net_dev(&self) -> Result<Vec<InterfaceStats>, ProbeError> {
        let content = read_file(&self.root.join("net").join("dev"), self.timeout).await?;
        parse_net_dev(&content)
    }

    /// CPU model, when cpuinfo names one.
    pub async fn cpu_model(&self) -> Option<String> {
        let content = read_file(&self.root.join("cpuinfo"), self.timeout)
            .await
            .ok()?;
        parse_cpu_model(&content)
    }
}

pub fn parse_stat(content: &str) -> Result<ProcStat, ProbeError> {
    let mut aggregate = None;
    let mut cores = Vec::new();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else { continue };
        if !label.starts_with("cpu") {
            continue;
        }
        let times = parse_cpu_fields(label, fields)?;
        if label == "cpu" {
            aggregate = Some(times);
        } else {
            cores.push(times);
        }
    }
    let aggregate = aggregate.ok_or_else(|| ProbeError::parse("no aggregate cpu line in stat"))?;
    Ok(ProcStat { aggregate, cores })
}

fn parse_cpu_fields<'a>(
    label: &str,
    fields: impl Iterator<Item = &'a str>,
) -> Result<CpuTimes, ProbeError> {
    // guest and guest_nice are already folded into user/nice, so only the first 8 count
    let values = fields
        .take(8)
        .map(|f| {
            f.parse::<u64>()
                .map_err(|_| ProbeError::parse(format!("{label}: bad tick value {f:?}")))
        })
        .collect::<Result<Vec<u64>, _>>()?;
    if values.len() < 4 {
        return Err(ProbeError::parse(format!(
            "{label}: expected at least 4 tick columns, got {}",
            values.len()
        )));
    }
    Ok(CpuTimes {
        idle: values[3],
        iowait: values.get(4).copied().unwrap_or(0),
        total: values.iter().fold(0u64, |acc, v| acc.saturating_add(*v)),
    })
}

pub fn parse_loadavg(content: &str) -> Result<LoadAverage, ProbeError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ProbeError::parse(format!(
            "loadavg: expected 3 values, got {:?}",
            content.trim()
        )));
    }
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| ProbeError::parse(format!("loadavg: bad value {s:?}")))
    };
    Ok(LoadAverage {
        one: parse(parts[0])?,
        five: parse(parts[1])?,
        fifteen: parse(parts[2])?,
    })
}

/// Parses `/proc/net/dev`. Policy filtering (loopback, idle interfaces) is left to the caller.
pub fn parse_net_dev(content: &str) -> Result<Vec<InterfaceStats>, ProbeError> {
    let mut interfaces = Vec::new();
    for line in content.lines() {
        // the two header lines carry no colon
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let values = counters
            .split_whitespace()
            .map(|f| {
                f.parse::<u64>()
                    .map_err(|_| ProbeError::parse(format!("net/dev {name}: bad counter {f:?}")))
            })
            .collect::<Result<Vec<u64>, _>>()?;
        if values.len() < 16 {
            return Err(ProbeError::parse(format!(
                "net/dev {name}: expected 16 counters, got {}",
                values.len()
            )));
        }
        interfaces.push(InterfaceStats {
            name: name.to_string(),
            rx: TrafficCounters {
                bytes: values[0],
                packets: values[1],
                errors: values[2],
                dropped: values[3],
            },
            tx: TrafficCounters {
                bytes: values[8],
                packets: values[9],
                errors: values[10],
                dropped: values[11],
            },
        });
    }
    Ok(interfaces)
}

/// First "model name" from cpuinfo; ARM kernels (most Android devices) use "Hardware" or "Processor".
pub fn parse_cpu_model(content: &str) -> Option<String> {
    ["model name", "Hardware", "Processor"]
        .iter()
        .find_map(|key| {
            content.lines().find_map(|line| {
                let (k, v) = line.split_once(':')?;
                let v = v.trim();
                (k.trim() == *key && !v.is_empty() && v != "cpu0").then(|| v.to_string())
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "\
cpu  4705 150 1120 16250 520 20 30 5 0 0
cpu0 2300 70 560 8100 260 10 15 3 0 0
cpu1 2405 80 560 8150 260 10 15 2 0 0
intr 114930548 113199788 3 0 5 263 0 4 [... lots more numbers ...]
ctxt 1990473
btime 1062191376
";

    #[test]
    fn parse_stat_sums_first_eight_columns() {
        let stat = parse_stat(STAT).unwrap();
        assert_eq!(stat.aggregate.idle, 16250);
        assert_eq!(stat.aggregate.iowait, 520);
        assert_eq!(
            stat.aggregate.total,
            4705 + 150 + 1120 + 16250 + 520 + 20 + 30 + 5
        );
        assert_eq!(stat.cores.len(), 2);
        assert_eq!(stat.cores[1].idle, 8150);
    }

    #[test]
    fn parse_stat_accepts_old_kernels_with_four_columns() {
        let stat = parse_stat("cpu 10 0 10 80\n").unwrap();
        assert_eq!(stat.aggregate.iowait, 0);
        assert_eq!(stat.aggregate.total, 100);
        assert!((stat.aggregate.usage_since_boot() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn parse_stat_without_aggregate_is_parse_error() {
        let err = parse_stat("cpu0 1 2 3 4\n").unwrap_err();
        assert_eq!(err.kind(), "parse-error");
        let err = parse_stat("cpu 1 2 x 4\n").unwrap_err();
        assert_eq!(err.kind(), "parse-error");
    }

    #[test]
    fn usage_since_boot_counts_iowait_as_idle() {
        let t = CpuTimes {
            idle: 60,
            iowait: 20,
            total: 100,
        };
        assert!((t.usage_since_boot() - 20.0).abs() < 1e-9);
        assert_eq!(CpuTimes::default().usage_since_boot(), 0.0);
    }

    #[test]
    fn parse_loadavg_reads_three_values() {
        let l = parse_loadavg("0.52 0.58 1.59 1/389 12345\n").unwrap();
        assert_eq!(l.one, 0.52);
        assert_eq!(l.five, 0.58);
        assert_eq!(l.fifteen, 1.59);
        assert!(parse_loadavg("0.5\n").is_err());
    }

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  123456     100    0    0    0     0          0         0   123456     100    0    0    0     0       0          0
  eth0:98765432  54321    1    2    0     0          0         0 12345678   4321    3    4    0     0       0          0
wlan0:0 0 0 0 0 0 0 0 500 5 0 0 0 0 0 0
";

    #[test]
    fn parse_net_dev_reads_rx_and_tx_columns() {
        let ifaces = parse_net_dev(NET_DEV).unwrap();
        assert_eq!(ifaces.len(), 3);
        let eth0 = &ifaces[1];
        assert_eq!(eth0.name, "eth0");
        assert_eq!(eth0.rx.bytes, 98765432);
        assert_eq!(eth0.rx.packets, 54321);
        assert_eq!(eth0.rx.errors, 1);
        assert_eq!(eth0.rx.dropped, 2);
        assert_eq!(eth0.tx.bytes, 12345678);
        assert_eq!(eth0.tx.packets, 4321);
        assert_eq!(eth0.tx.errors, 3);
        assert_eq!(eth0.tx.dropped, 4);
        assert_eq!(ifaces[2].name, "wlan0");
    }

    #[test]
    fn parse_net_dev_rejects_short_rows() {
        let err = parse_net_dev("eth0: 1 2 3\n").unwrap_err();
        assert_eq!(err.kind(), "parse-error");
    }

    #[test]
    fn parse_cpu_model_falls_back_to_hardware() {
        let x86 = "processor\t: 0\nmodel name\t: AMD Ryzen 7 5800X\n";
        assert_eq!(parse_cpu_model(x86).as_deref(), Some("AMD Ryzen 7 5800X"));
        let arm = "processor\t: 0\nBogoMIPS\t: 38.40\nHardware\t: Qualcomm Technologies, Inc SM8250\n";
        assert_eq!(
            parse_cpu_model(arm).as_deref(),
            Some("Qualcomm Technologies, Inc SM8250")
        );
        assert_eq!(parse_cpu_model("processor\t: 0\n"), None);
    }
}
