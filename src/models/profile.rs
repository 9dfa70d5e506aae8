use std::collections::{BTreeMap, HashSet};

use chrono::{FixedOffset, Offset, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ProfileError;

pub const PRESET_PRO_EM: &str = "shelly-pro-em";
pub const PRESET_PM_G3: &str = "shelly-pm-g3";
pub const PRESET_NAMES: [&str; 2] = [PRESET_PRO_EM, PRESET_PM_G3];

// ─── Variant selectors ───────────────────────────────────────────────────────

/// Which metering component the device exposes on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MeterKind {
    /// `em1:<id>` readings plus `em1data:<id>` energy counters.
    Em1,
    /// `pm1:<id>` readings with nested `aenergy` / `ret_aenergy`.
    Pm1,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStyle {
    Flat,
    Rpc,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Immutable bundle of device constants driving synthesis.
/// Build it from a preset or JSON, then call [`DeviceProfile::validate`] once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceProfile {
    pub meter: MeterKind,
    pub envelope: EnvelopeStyle,
    pub identity: Identity,
    pub power: PowerSpec,
    pub phases: Vec<PhaseSpec>,
    #[serde(default)]
    pub energy_channels: Vec<EnergyChannelSpec>,
    pub system: SystemSpec,
    pub connectivity: ConnectivitySpec,
    #[serde(default)]
    pub auxiliary: AuxiliarySpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    /// Upper-case hex MAC without separators, as reported in `sys.mac`.
    pub mac: String,
    /// RPC source id, e.g. `shellypmg3-ddeeff112233`.
    pub device_id: String,
}

/// Power-flow constants (watts, volts, hertz).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerSpec {
    pub nominal_load_w: f64,
    /// Full width of the uniform load jitter; the draw is ± half of it.
    pub load_spread_w: f64,
    pub peak_solar_w: f64,
    pub nominal_voltage_v: f64,
    pub voltage_spread_v: f64,
    pub frequency_hz: f64,
    pub power_factor: f64,
    /// Apparent power = active power × ratio.
    pub apparent_power_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseSpec {
    pub id: u32,
    #[serde(default = "default_calibration")]
    pub calibration: String,
    pub reading: ReadingSpec,
}

fn default_calibration() -> String {
    "factory".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ReadingSpec {
    /// Driven by the power-flow model.
    Dynamic,
    /// Static values reported verbatim (e.g. an unused clamp).
    Fixed(FixedReading),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedReading {
    pub current: f64,
    pub voltage: f64,
    pub active_power: f64,
    pub apparent_power: f64,
    pub power_factor: f64,
    pub frequency: f64,
}

/// Per-minute accumulation rates for one phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyChannelSpec {
    pub id: u32,
    pub forward_rate: f64,
    pub returned_rate: f64,
}

/// Inclusive integer range sampled uniformly. `min == max` yields a constant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleRange {
    pub min: i64,
    pub max: i64,
}

impl SampleRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: i64) -> Self {
        Self { min: value, max: value }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    fn check(&self, field: &'static str) -> Result<(), ProfileError> {
        if self.min > self.max {
            return Err(ProfileError::InvertedRange { field, min: self.min, max: self.max });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemSpec {
    #[serde(default)]
    pub restart_required: bool,
    pub ram_size: i64,
    pub ram_free: SampleRange,
    pub ram_min_free: Option<i64>,
    pub fs_size: i64,
    pub fs_free: SampleRange,
    pub uptime_secs: SampleRange,
    pub cfg_rev: u32,
    #[serde(default)]
    pub kvs_rev: u32,
    #[serde(default)]
    pub schedule_rev: u32,
    #[serde(default)]
    pub webhook_rev: u32,
    pub btrelay_rev: Option<u32>,
    /// Update channel (`stable`, `beta`) → offered firmware version.
    #[serde(default)]
    pub available_updates: BTreeMap<String, String>,
    pub reset_reason: u32,
    /// When set, `last_sync_ts` is reported this many seconds in the past.
    pub last_sync_lag_secs: Option<i64>,
    /// Offset used for the solar curve and `sys.time`.
    #[serde(default)]
    pub utc_offset_secs: i32,
    /// Emit `sys.utc_offset` on the wire.
    #[serde(default)]
    pub report_utc_offset: bool,
}

impl SystemSpec {
    /// Offset for local-time fields; falls back to UTC for an unvalidated
    /// out-of-range value.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectivitySpec {
    pub sta_ip: String,
    pub wifi_status: String,
    pub ssid: String,
    pub bssid: Option<String>,
    pub rssi: SampleRange,
    pub sta_ip6: Option<Vec<String>>,
    #[serde(default)]
    pub cloud_connected: bool,
    #[serde(default)]
    pub mqtt_connected: bool,
    #[serde(default)]
    pub ws_connected: bool,
    /// Presence adds a `bthome` block with these error codes.
    pub bthome_errors: Option<Vec<String>>,
    /// Presence adds an `eth` block; the inner value is the reported IP.
    pub ethernet: Option<EthernetSpec>,
    #[serde(default)]
    pub modbus: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EthernetSpec {
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AuxiliarySpec {
    #[serde(default)]
    pub switches: Vec<SwitchSpec>,
    #[serde(default)]
    pub scripts: Vec<ScriptSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwitchSpec {
    pub id: u32,
    pub source: String,
    pub output: bool,
    pub temperature_c: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptSpec {
    pub id: u32,
    pub running: bool,
    pub mem_free: i64,
    pub cpu: u32,
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn finite(field: &'static str, value: f64) -> Result<f64, ProfileError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProfileError::NonFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ProfileError> {
    let value = finite(field, value)?;
    if value < 0.0 {
        return Err(ProfileError::Negative { field, value });
    }
    Ok(value)
}

fn within_capacity(
    field: &'static str,
    range: &SampleRange,
    capacity: i64,
) -> Result<(), ProfileError> {
    range.check(field)?;
    if range.min < 0 {
        return Err(ProfileError::Negative { field, value: range.min as f64 });
    }
    if range.max > capacity {
        return Err(ProfileError::ExceedsCapacity { field, max: range.max, capacity });
    }
    Ok(())
}

impl DeviceProfile {
    /// Rejects any profile the synthesizer could not serve consistently.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.identity.mac.trim().is_empty() {
            return Err(ProfileError::EmptyIdentity("mac"));
        }
        if self.identity.device_id.trim().is_empty() {
            return Err(ProfileError::EmptyIdentity("device_id"));
        }

        let p = &self.power;
        non_negative("nominal_load_w", p.nominal_load_w)?;
        non_negative("load_spread_w", p.load_spread_w)?;
        non_negative("peak_solar_w", p.peak_solar_w)?;
        let nominal = finite("nominal_voltage_v", p.nominal_voltage_v)?;
        let spread = non_negative("voltage_spread_v", p.voltage_spread_v)?;
        if nominal - spread / 2.0 <= 0.0 {
            return Err(ProfileError::VoltageCrossesZero { nominal, half_spread: spread / 2.0 });
        }
        non_negative("frequency_hz", p.frequency_hz)?;
        non_negative("power_factor", p.power_factor)?;
        non_negative("apparent_power_ratio", p.apparent_power_ratio)?;

        if self.phases.is_empty() {
            return Err(ProfileError::NoPhases);
        }
        let mut phase_ids = HashSet::new();
        for phase in &self.phases {
            if !phase_ids.insert(phase.id) {
                return Err(ProfileError::DuplicateId { kind: "phase", id: phase.id });
            }
            if let ReadingSpec::Fixed(r) = &phase.reading {
                finite("fixed.current", r.current)?;
                finite("fixed.voltage", r.voltage)?;
                finite("fixed.active_power", r.active_power)?;
                finite("fixed.apparent_power", r.apparent_power)?;
                finite("fixed.power_factor", r.power_factor)?;
                finite("fixed.frequency", r.frequency)?;
            }
        }

        let mut channel_ids = HashSet::new();
        for channel in &self.energy_channels {
            if !channel_ids.insert(channel.id) {
                return Err(ProfileError::DuplicateId { kind: "energy channel", id: channel.id });
            }
            if !phase_ids.contains(&channel.id) {
                return Err(ProfileError::OrphanChannel(channel.id));
            }
            non_negative("forward_rate", channel.forward_rate)?;
            non_negative("returned_rate", channel.returned_rate)?;
        }

        let s = &self.system;
        non_negative("ram_size", s.ram_size as f64)?;
        non_negative("fs_size", s.fs_size as f64)?;
        within_capacity("ram_free", &s.ram_free, s.ram_size)?;
        within_capacity("fs_free", &s.fs_free, s.fs_size)?;
        s.uptime_secs.check("uptime_secs")?;
        if s.uptime_secs.min < 0 {
            return Err(ProfileError::Negative {
                field: "uptime_secs",
                value: s.uptime_secs.min as f64,
            });
        }
        if let Some(lag) = s.last_sync_lag_secs {
            non_negative("last_sync_lag_secs", lag as f64)?;
        }
        if FixedOffset::east_opt(s.utc_offset_secs).is_none() {
            return Err(ProfileError::InvalidUtcOffset(s.utc_offset_secs));
        }

        self.connectivity.rssi.check("rssi")?;

        for switch in &self.auxiliary.switches {
            finite("switch.temperature_c", switch.temperature_c)?;
        }
        Ok(())
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            PRESET_PRO_EM => Some(Self::shelly_pro_em()),
            PRESET_PM_G3 => Some(Self::shelly_pm_g3()),
            _ => None,
        }
    }

    /// Two-clamp energy meter; clamp 0 idles, clamp 1 follows the model.
    pub fn shelly_pro_em() -> Self {
        Self {
            meter: MeterKind::Em1,
            envelope: EnvelopeStyle::Flat,
            identity: Identity {
                mac: "001122334455".to_string(),
                device_id: "shellyproem50-001122334455".to_string(),
            },
            power: default_power(),
            phases: vec![
                PhaseSpec {
                    id: 0,
                    calibration: default_calibration(),
                    reading: ReadingSpec::Fixed(FixedReading {
                        current: 0.020,
                        voltage: 224.6,
                        active_power: 0.0,
                        apparent_power: 4.6,
                        power_factor: 0.0,
                        frequency: 50.0,
                    }),
                },
                PhaseSpec {
                    id: 1,
                    calibration: default_calibration(),
                    reading: ReadingSpec::Dynamic,
                },
            ],
            energy_channels: vec![
                EnergyChannelSpec { id: 0, forward_rate: 0.0, returned_rate: 0.0 },
                EnergyChannelSpec { id: 1, forward_rate: 1.0, returned_rate: 0.3 },
            ],
            system: SystemSpec {
                restart_required: false,
                ram_size: 241_940,
                ram_free: SampleRange::new(107_332, 127_331),
                ram_min_free: None,
                fs_size: 524_288,
                fs_free: SampleRange::new(198_896, 208_895),
                uptime_secs: default_uptime(),
                cfg_rev: 20,
                kvs_rev: 0,
                schedule_rev: 0,
                webhook_rev: 0,
                btrelay_rev: None,
                available_updates: BTreeMap::from([("stable".to_string(), "1.2.0".to_string())]),
                reset_reason: 3,
                last_sync_lag_secs: None,
                utc_offset_secs: 0,
                report_utc_offset: false,
            },
            connectivity: ConnectivitySpec {
                sta_ip: "192.168.1.100".to_string(),
                wifi_status: "got ip".to_string(),
                ssid: "MyNetwork".to_string(),
                bssid: None,
                rssi: SampleRange::fixed(-60),
                sta_ip6: None,
                cloud_connected: false,
                mqtt_connected: true,
                ws_connected: false,
                bthome_errors: None,
                ethernet: Some(EthernetSpec { ip: None }),
                modbus: true,
            },
            auxiliary: AuxiliarySpec {
                switches: vec![SwitchSpec {
                    id: 0,
                    source: "HTTP_in".to_string(),
                    output: true,
                    temperature_c: 29.4,
                }],
                scripts: Vec::new(),
            },
        }
    }

    /// Single-channel plug-in power meter answering over RPC.
    pub fn shelly_pm_g3() -> Self {
        Self {
            meter: MeterKind::Pm1,
            envelope: EnvelopeStyle::Rpc,
            identity: Identity {
                mac: "DDEEFF112233".to_string(),
                device_id: "shellypmg3-ddeeff112233".to_string(),
            },
            power: default_power(),
            phases: vec![PhaseSpec {
                id: 0,
                calibration: default_calibration(),
                reading: ReadingSpec::Dynamic,
            }],
            energy_channels: vec![EnergyChannelSpec {
                id: 0,
                forward_rate: 60.0,
                returned_rate: 20.0,
            }],
            system: SystemSpec {
                restart_required: false,
                ram_size: 268_460,
                ram_free: SampleRange::new(110_000, 139_999),
                ram_min_free: Some(110_896),
                fs_size: 1_048_576,
                fs_free: SampleRange::new(620_000, 629_999),
                uptime_secs: default_uptime(),
                cfg_rev: 47,
                kvs_rev: 0,
                schedule_rev: 2,
                webhook_rev: 0,
                btrelay_rev: Some(2),
                available_updates: BTreeMap::from([(
                    "beta".to_string(),
                    "1.7.4-beta2".to_string(),
                )]),
                reset_reason: 3,
                last_sync_lag_secs: Some(900),
                utc_offset_secs: 3600,
                report_utc_offset: true,
            },
            connectivity: ConnectivitySpec {
                sta_ip: "192.168.1.104".to_string(),
                wifi_status: "got ip".to_string(),
                ssid: "MyNetwork".to_string(),
                bssid: Some("dd:ee:ff:11:22:33".to_string()),
                rssi: SampleRange::new(-90, -71),
                sta_ip6: Some(vec!["fe80::1234:5678:abcd:ef04".to_string()]),
                cloud_connected: true,
                mqtt_connected: false,
                ws_connected: false,
                bthome_errors: Some(vec!["bluetooth_disabled".to_string()]),
                ethernet: None,
                modbus: false,
            },
            auxiliary: AuxiliarySpec {
                switches: Vec::new(),
                scripts: vec![ScriptSpec { id: 1, running: false, mem_free: 25_200, cpu: 0 }],
            },
        }
    }
}

fn default_power() -> PowerSpec {
    PowerSpec {
        nominal_load_w: 1000.0,
        load_spread_w: 400.0,
        peak_solar_w: 600.0,
        nominal_voltage_v: 230.0,
        voltage_spread_v: 10.0,
        frequency_hz: 50.0,
        power_factor: 0.99,
        apparent_power_ratio: 1.01,
    }
}

fn default_uptime() -> SampleRange {
    SampleRange::new(3_600, 89_999)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for name in PRESET_NAMES {
            let profile = DeviceProfile::preset(name).unwrap();
            assert_eq!(profile.validate(), Ok(()), "preset {name}");
        }
        assert!(DeviceProfile::preset("shelly-plug-s").is_none());
    }

    #[test]
    fn voltage_range_reaching_zero_is_rejected() {
        let mut profile = DeviceProfile::shelly_pm_g3();
        profile.power.nominal_voltage_v = 4.0;
        profile.power.voltage_spread_v = 8.0;
        assert_eq!(
            profile.validate(),
            Err(ProfileError::VoltageCrossesZero { nominal: 4.0, half_spread: 4.0 })
        );

        profile.power.nominal_voltage_v = 0.0;
        profile.power.voltage_spread_v = 0.0;
        assert!(matches!(profile.validate(), Err(ProfileError::VoltageCrossesZero { .. })));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let mut profile = DeviceProfile::shelly_pro_em();
        profile.power.peak_solar_w = -600.0;
        assert_eq!(
            profile.validate(),
            Err(ProfileError::Negative { field: "peak_solar_w", value: -600.0 })
        );
    }

    #[test]
    fn non_finite_constants_are_rejected() {
        let mut profile = DeviceProfile::shelly_pro_em();
        profile.power.nominal_load_w = f64::NAN;
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::NonFinite { field: "nominal_load_w", .. })
        ));
    }

    #[test]
    fn sample_ranges_are_checked() {
        let mut profile = DeviceProfile::shelly_pm_g3();
        profile.system.uptime_secs = SampleRange::new(10, 5);
        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvertedRange { field: "uptime_secs", min: 10, max: 5 })
        );

        let mut profile = DeviceProfile::shelly_pm_g3();
        profile.system.ram_free = SampleRange::new(1, profile.system.ram_size + 1);
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::ExceedsCapacity { field: "ram_free", .. })
        ));
    }

    #[test]
    fn channel_ids_must_match_a_phase() {
        let mut profile = DeviceProfile::shelly_pm_g3();
        profile.energy_channels.push(EnergyChannelSpec {
            id: 7,
            forward_rate: 1.0,
            returned_rate: 0.0,
        });
        assert_eq!(profile.validate(), Err(ProfileError::OrphanChannel(7)));

        let mut profile = DeviceProfile::shelly_pro_em();
        profile.phases[1].id = 0;
        assert_eq!(profile.validate(), Err(ProfileError::DuplicateId { kind: "phase", id: 0 }));
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let mut profile = DeviceProfile::shelly_pm_g3();
        profile.system.utc_offset_secs = 90_000;
        assert_eq!(profile.validate(), Err(ProfileError::InvalidUtcOffset(90_000)));
    }

    #[test]
    fn degenerate_range_samples_constant() {
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        assert_eq!(SampleRange::fixed(-60).sample(&mut rng), -60);
    }

    #[test]
    fn profile_loads_from_json() {
        let json = serde_json::to_string(&DeviceProfile::shelly_pro_em()).unwrap();
        let parsed: DeviceProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, DeviceProfile::shelly_pro_em());
        assert!(json.contains(r#""mode":"fixed""#));
    }
}
