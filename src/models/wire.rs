//! JSON shapes of the emulated devices' `GetStatus` payloads.
//! Values in here are already rounded to their wire precision.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── Shared components ───────────────────────────────────────────────────────

/// `cloud`, `mqtt`, `ws`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connected {
    pub connected: bool,
}

/// `ble`, `modbus`: reported as `{}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Empty {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BtHome {
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Eth {
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sys {
    pub mac: String,
    pub restart_required: bool,
    pub time: String,
    pub unixtime: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_ts: Option<i64>,
    pub uptime: i64,
    pub ram_size: i64,
    pub ram_free: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_min_free: Option<i64>,
    pub fs_size: i64,
    pub fs_free: i64,
    pub cfg_rev: u32,
    pub kvs_rev: u32,
    pub schedule_rev: u32,
    pub webhook_rev: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub btrelay_rev: Option<u32>,
    pub available_updates: BTreeMap<String, FirmwareVersion>,
    pub reset_reason: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FirmwareVersion {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wifi {
    pub sta_ip: String,
    pub status: String,
    pub ssid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    pub rssi: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sta_ip6: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Switch {
    pub id: u32,
    pub source: String,
    pub output: bool,
    pub temperature: Temperature,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Temperature {
    #[serde(rename = "tC")]
    pub t_c: f64,
    #[serde(rename = "tF")]
    pub t_f: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Script {
    pub id: u32,
    pub running: bool,
    pub mem_free: i64,
    pub cpu: u32,
}

// ─── Energy meter (em1) ──────────────────────────────────────────────────────

/// `em1:<id>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Em1 {
    pub id: u32,
    pub current: f64,
    pub voltage: f64,
    pub act_power: Watts,
    pub aprt_power: Watts,
    pub pf: f64,
    pub freq: f64,
    pub calibration: String,
}

/// Model-driven power is an integer on the wire; configured readings keep a decimal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Watts {
    Whole(i64),
    Decimal(f64),
}

impl Watts {
    pub fn as_f64(self) -> f64 {
        match self {
            Watts::Whole(w) => w as f64,
            Watts::Decimal(w) => w,
        }
    }
}

/// `em1data:<id>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Em1Data {
    pub id: u32,
    pub total_act_energy: f64,
    pub total_act_ret_energy: f64,
}

// ─── Power meter (pm1) ───────────────────────────────────────────────────────

/// `pm1:<id>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pm1 {
    pub id: u32,
    pub voltage: f64,
    pub current: f64,
    pub apower: f64,
    pub freq: f64,
    pub aenergy: EnergyCounter,
    pub ret_aenergy: EnergyCounter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyCounter {
    pub total: f64,
    pub by_minute: [f64; 3],
    pub minute_ts: i64,
}

// ─── Envelopes ───────────────────────────────────────────────────────────────

/// JSON-RPC style wrapper around a flat status object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcEnvelope<T> {
    pub id: i64,
    pub src: String,
    pub dst: String,
    pub result: T,
}
