// Android (Termux) battery, thermal and device models

use serde::{Deserialize, Serialize};

use super::ProbeResult;

/// Battery state as printed by `termux-battery-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    pub percentage: f64,
    pub status: String,
    pub health: String,
    pub plugged: String,
    /// Celsius.
    pub temperature: f64,
    /// Microamperes; negative while discharging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalZone {
    pub zone: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl ThermalZone {
    pub fn from_millidegrees(zone: String, type_: String, millidegrees: i64) -> Self {
        let celsius = millidegrees as f64 / 1000.0;
        Self {
            zone,
            type_,
            celsius,
            fahrenheit: celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProps {
    pub manufacturer: String,
    pub model: String,
    pub android_release: String,
    pub sdk: String,
    pub build_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidStatus {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<ProbeResult<BatteryStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_zones: Option<ProbeResult<Vec<ThermalZone>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_props: Option<ProbeResult<DeviceProps>>,
}

impl AndroidStatus {
    /// Terminal state for hosts that are not Android; not a failure.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
            battery: None,
            thermal_zones: None,
            device_props: None,
        }
    }
}
