// Android (Termux) battery, thermal zones and device properties.
// Only attempted on Android; elsewhere the probe answers `available: false`.

use futures_util::future::{BoxFuture, join_all};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::Source;
use crate::error::ProbeError;
use crate::models::{AndroidStatus, BatteryStatus, DeviceProps, ThermalZone};
use crate::source::{CommandRunner, Platform, read_file};

pub const BATTERY_PROGRAM: &str = "termux-battery-status";
pub const GETPROP_PROGRAM: &str = "getprop";

pub struct AndroidSource {
    platform: Platform,
    runner: Arc<dyn CommandRunner>,
    thermal_root: PathBuf,
    command_timeout: Duration,
    file_timeout: Duration,
}

impl AndroidSource {
    pub fn new(
        platform: Platform,
        runner: Arc<dyn CommandRunner>,
        thermal_root: impl Into<PathBuf>,
        command_timeout: Duration,
        file_timeout: Duration,
    ) -> Self {
        Self {
            platform,
            runner,
            thermal_root: thermal_root.into(),
            command_timeout,
            file_timeout,
        }
    }

    async fn read_status(&self) -> Result<AndroidStatus, ProbeError> {
        if self.platform != Platform::Android {
            return Ok(AndroidStatus::unavailable(format!(
                "not an Android host (platform: {})",
                self.platform.as_str()
            )));
        }

        let (battery, thermal, device) =
            tokio::join!(self.battery(), self.thermal_zones(), self.device_props());
        for (part, result) in [
            ("battery", battery.as_ref().err()),
            ("thermal", thermal.as_ref().err()),
            ("device", device.as_ref().err()),
        ] {
            if let Some(e) = result {
                tracing::warn!(part, error = %e, "android sub-probe failed");
            }
        }

        Ok(AndroidStatus {
            available: true,
            reason: None,
            battery: Some(battery.into()),
            thermal_zones: Some(thermal.into()),
            device_props: Some(device.into()),
        })
    }

    async fn battery(&self) -> Result<BatteryStatus, ProbeError> {
        let out = self
            .runner
            .run(BATTERY_PROGRAM, &[], self.command_timeout)
            .await?;
        parse_battery_status(&out)
    }

    async fn device_props(&self) -> Result<DeviceProps, ProbeError> {
        let out = self
            .runner
            .run(GETPROP_PROGRAM, &[], self.command_timeout)
            .await?;
        parse_getprop(&out)
    }

    async fn thermal_zones(&self) -> Result<Vec<ThermalZone>, ProbeError> {
        read_thermal_zones(&self.thermal_root, self.file_timeout).await
    }
}

impl Source<AndroidStatus> for AndroidSource {
    fn read(&self) -> BoxFuture<'_, Result<AndroidStatus, ProbeError>> {
        Box::pin(self.read_status())
    }
}

#[derive(Deserialize)]
struct RawBattery {
    percentage: f64,
    #[serde(default)]
    status: String,
    #[serde(default)]
    health: String,
    #[serde(default)]
    plugged: String,
    #[serde(default)]
    temperature: f64,
    #[serde(default)]
    current: Option<i64>,
}

/// Parses the JSON object printed by `termux-battery-status`.
pub fn parse_battery_status(output: &str) -> Result<BatteryStatus, ProbeError> {
    let raw: RawBattery = serde_json::from_str(output.trim())
        .map_err(|e| ProbeError::parse(format!("battery status: {e}")))?;
    Ok(BatteryStatus {
        percentage: raw.percentage,
        status: raw.status,
        health: raw.health,
        plugged: raw.plugged,
        temperature: raw.temperature,
        current: raw.current,
    })
}

/// Parses `getprop` lines of the form `[ro.product.model]: [Pixel 7]`.
pub fn parse_getprop(output: &str) -> Result<DeviceProps, ProbeError> {
    let props: HashMap<&str, &str> = output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once("]: [")?;
            Some((
                key.trim().strip_prefix('[')?,
                value.trim().strip_suffix(']')?,
            ))
        })
        .collect();

    let get = |key: &str| props.get(key).map(|v| v.to_string()).unwrap_or_default();
    let device = DeviceProps {
        manufacturer: get("ro.product.manufacturer"),
        model: get("ro.product.model"),
        android_release: get("ro.build.version.release"),
        sdk: get("ro.build.version.sdk"),
        build_id: get("ro.build.id"),
    };
    if device == DeviceProps::default() {
        return Err(ProbeError::parse("getprop output has no device properties"));
    }
    Ok(device)
}

/// Reads every `thermal_zone*` under `root`. Zones whose temperature cannot be
/// read or parsed are skipped; only an unlistable root is an error.
pub async fn read_thermal_zones(
    root: &Path,
    timeout: Duration,
) -> Result<Vec<ThermalZone>, ProbeError> {
    let mut zones = list_zones(root, timeout).await?;
    zones.sort_by_key(|name| zone_index(name));

    let reads = zones.into_iter().map(|name| async move {
        let dir = root.join(&name);
        let raw = match read_file(&dir.join("temp"), timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::trace!(zone = %name, error = %e, "skipping unreadable thermal zone");
                return None;
            }
        };
        let millidegrees = raw.trim().parse::<i64>().ok()?;
        let type_ = read_file(&dir.join("type"), timeout)
            .await
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|_| "unknown".into());
        Some(ThermalZone::from_millidegrees(name, type_, millidegrees))
    });

    Ok(join_all(reads).await.into_iter().flatten().collect())
}

async fn list_zones(root: &Path, timeout: Duration) -> Result<Vec<String>, ProbeError> {
    let listing = async {
        let mut entries = tokio::fs::read_dir(root).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("thermal_zone") {
                names.push(name);
            }
        }
        Ok::<_, std::io::Error>(names)
    };
    match tokio::time::timeout(timeout, listing).await {
        Err(_) => Err(ProbeError::Timeout(timeout)),
        Ok(Ok(names)) => Ok(names),
        Ok(Err(e)) => Err(ProbeError::unavailable(format!("{}: {e}", root.display()))),
    }
}

fn zone_index(name: &str) -> u32 {
    name.trim_start_matches("thermal_zone")
        .parse()
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_battery_status_reads_termux_json() {
        let out = r#"{
  "present": true,
  "technology": "Li-ion",
  "health": "GOOD",
  "percentage": 87,
  "plugged": "UNPLUGGED",
  "status": "DISCHARGING",
  "temperature": 29.100000381469727,
  "voltage": 4123,
  "current": -312000,
  "current_average": null,
  "level": 87,
  "scale": 100
}"#;
        let b = parse_battery_status(out).unwrap();
        assert_eq!(b.percentage, 87.0);
        assert_eq!(b.health, "GOOD");
        assert_eq!(b.status, "DISCHARGING");
        assert_eq!(b.plugged, "UNPLUGGED");
        assert_eq!(b.current, Some(-312000));
        assert!((b.temperature - 29.1).abs() < 1e-3);
    }

    #[test]
    fn parse_battery_status_rejects_non_json() {
        let err = parse_battery_status("termux-api not installed").unwrap_err();
        assert_eq!(err.kind(), "parse-error");
    }

    #[test]
    fn parse_getprop_picks_device_keys() {
        let out = "\
[dalvik.vm.heapsize]: [512m]
[ro.build.id]: [UQ1A.240205.004]
[ro.build.version.release]: [14]
[ro.build.version.sdk]: [34]
[ro.product.manufacturer]: [Google]
[ro.product.model]: [Pixel 7]
";
        let d = parse_getprop(out).unwrap();
        assert_eq!(d.manufacturer, "Google");
        assert_eq!(d.model, "Pixel 7");
        assert_eq!(d.android_release, "14");
        assert_eq!(d.sdk, "34");
        assert_eq!(d.build_id, "UQ1A.240205.004");
        assert!(parse_getprop("[foo]: [bar]\n").is_err());
    }

    #[test]
    fn thermal_zone_converts_millidegrees() {
        let z = ThermalZone::from_millidegrees("thermal_zone0".into(), "cpu".into(), 45000);
        assert_eq!(z.celsius, 45.0);
        assert_eq!(z.fahrenheit, 113.0);
    }

    #[tokio::test]
    async fn unreadable_zones_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let zone = |n: &str, temp: Option<&str>, kind: &str| {
            let p = dir.path().join(n);
            std::fs::create_dir(&p).unwrap();
            if let Some(t) = temp {
                std::fs::write(p.join("temp"), t).unwrap();
            }
            std::fs::write(p.join("type"), kind).unwrap();
        };
        zone("thermal_zone10", Some("30000\n"), "battery\n");
        zone("thermal_zone2", Some("41500\n"), "cpu-0-0\n");
        zone("thermal_zone3", None, "gpu\n");
        zone("thermal_zone4", Some("garbage\n"), "modem\n");
        std::fs::create_dir(dir.path().join("cooling_device0")).unwrap();

        let zones = read_thermal_zones(dir.path(), Duration::from_secs(1))
            .await
            .unwrap();
        let names: Vec<&str> = zones.iter().map(|z| z.zone.as_str()).collect();
        assert_eq!(names, vec!["thermal_zone2", "thermal_zone10"]);
        assert_eq!(zones[0].type_, "cpu-0-0");
        assert_eq!(zones[0].celsius, 41.5);
    }

    #[tokio::test]
    async fn missing_thermal_root_is_source_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_thermal_zones(&dir.path().join("absent"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "source-unavailable");
    }
}
