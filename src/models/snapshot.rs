use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::models::profile::MeterKind;

/// Full synthesized telemetry state for one request.
/// Built once by the synthesizer and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub meter: MeterKind,
    pub device_id: String,
    pub phases: Vec<PhaseReading>,
    pub energy: Vec<EnergyChannel>,
    pub system: SystemHealth,
    pub connectivity: ConnectivityStatus,
    pub auxiliary: AuxiliaryState,
}

impl DeviceSnapshot {
    pub fn energy_channel(&self, id: u32) -> Option<&EnergyChannel> {
        self.energy.iter().find(|c| c.id == id)
    }
}

/// One measured line, unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReading {
    pub id: u32,
    pub current: f64,
    pub voltage: f64,
    pub active_power: f64,
    pub apparent_power: f64,
    pub power_factor: f64,
    pub frequency: f64,
    pub calibration: String,
    /// Configured constant rather than a model output.
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyChannel {
    pub id: u32,
    pub forward: EnergyCounter,
    pub returned: EnergyCounter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyCounter {
    pub total: f64,
    /// Oldest first; the last entry equals `total`.
    pub by_minute: [f64; 3],
    pub minute_ts: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemHealth {
    pub mac: String,
    pub restart_required: bool,
    pub local_time: DateTime<FixedOffset>,
    pub unixtime: i64,
    pub last_sync_ts: Option<i64>,
    pub uptime: i64,
    pub ram_size: i64,
    pub ram_free: i64,
    pub ram_min_free: Option<i64>,
    pub fs_size: i64,
    pub fs_free: i64,
    pub cfg_rev: u32,
    pub kvs_rev: u32,
    pub schedule_rev: u32,
    pub webhook_rev: u32,
    pub btrelay_rev: Option<u32>,
    pub available_updates: BTreeMap<String, String>,
    pub reset_reason: u32,
    pub utc_offset: Option<i32>,
}

impl SystemHealth {
    /// `HH:MM` as shown by the device clock.
    pub fn time_hhmm(&self) -> String {
        self.local_time.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityStatus {
    pub wifi: WifiStatus,
    pub cloud_connected: bool,
    pub mqtt_connected: bool,
    pub ws_connected: bool,
    pub bthome_errors: Option<Vec<String>>,
    /// `Some(ip)` when the device has an Ethernet block; the IP itself may be null.
    pub ethernet: Option<Option<String>>,
    pub modbus: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WifiStatus {
    pub sta_ip: String,
    pub status: String,
    pub ssid: String,
    pub bssid: Option<String>,
    pub rssi: i64,
    pub sta_ip6: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuxiliaryState {
    pub switches: Vec<SwitchState>,
    pub scripts: Vec<ScriptState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchState {
    pub id: u32,
    pub source: String,
    pub output: bool,
    pub temperature_c: f64,
}

impl SwitchState {
    pub fn temperature_f(&self) -> f64 {
        self.temperature_c * 9.0 / 5.0 + 32.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptState {
    pub id: u32,
    pub running: bool,
    pub mem_free: i64,
    pub cpu: u32,
}
