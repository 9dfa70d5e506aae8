use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::ConfigError;
use crate::models::profile::DeviceProfile;

fn default_port() -> u16 { 8080 }

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub id: String,
    pub name: String,
    pub profile: DeviceProfile,
}

// ─── On-disk shape ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawConfig {
    server: ServerConfig,
    devices: Vec<RawDevice>,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    id: String,
    name: Option<String>,
    /// A preset name, or a complete inline profile.
    profile: Value,
}

fn resolve_profile(device: &str, source: Value) -> Result<DeviceProfile, ConfigError> {
    match source {
        Value::String(preset) => DeviceProfile::preset(&preset)
            .ok_or_else(|| ConfigError::UnknownPreset { device: device.to_string(), preset }),
        inline => serde_json::from_value(inline).map_err(|source| {
            ConfigError::MalformedProfile { device: device.to_string(), source }
        }),
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Resolves presets and validates every profile; the first bad device aborts.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content)?;
        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(raw.devices.len());

        for device in raw.devices {
            if !seen.insert(device.id.clone()) {
                return Err(ConfigError::DuplicateDevice(device.id));
            }
            let profile = resolve_profile(&device.id, device.profile)?;
            profile.validate().map_err(|source| ConfigError::InvalidProfile {
                device: device.id.clone(),
                source,
            })?;
            debug!(
                device = %device.id,
                meter = ?profile.meter,
                envelope = ?profile.envelope,
                "profile accepted"
            );
            devices.push(DeviceConfig {
                name: device.name.unwrap_or_else(|| device.id.clone()),
                id: device.id,
                profile,
            });
        }

        Ok(Self { server: raw.server, devices })
    }

    pub fn device(&self, id: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProfileError;
    use crate::models::profile::{EnvelopeStyle, MeterKind};

    #[test]
    fn presets_resolve() {
        let cfg = Config::from_json(
            r#"{
                "server": { "port": 1080 },
                "devices": [
                    { "id": "pro-em", "name": "Pro EM", "profile": "shelly-pro-em" },
                    { "id": "plug", "profile": "shelly-pm-g3" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 1080);
        assert_eq!(cfg.devices.len(), 2);
        assert_eq!(cfg.device("pro-em").unwrap().profile.meter, MeterKind::Em1);
        let plug = cfg.device("plug").unwrap();
        assert_eq!(plug.name, "plug");
        assert_eq!(plug.profile.envelope, EnvelopeStyle::Rpc);
        assert!(cfg.device("missing").is_none());
    }

    #[test]
    fn inline_profile_is_validated() {
        let mut profile = DeviceProfile::shelly_pm_g3();
        profile.power.nominal_voltage_v = 3.0;
        let json = serde_json::json!({
            "server": {},
            "devices": [{ "id": "bad", "profile": profile }]
        })
        .to_string();

        match Config::from_json(&json) {
            Err(ConfigError::InvalidProfile { device, source }) => {
                assert_eq!(device, "bad");
                assert!(matches!(source, ProfileError::VoltageCrossesZero { .. }));
            }
            other => panic!("expected invalid profile, got {other:?}"),
        }
    }

    #[test]
    fn malformed_inline_profile_names_device_and_field() {
        let mut profile = serde_json::to_value(DeviceProfile::shelly_pro_em()).unwrap();
        profile["power"].as_object_mut().unwrap().remove("peak_solar_w");
        let json = serde_json::json!({
            "server": {},
            "devices": [{ "id": "roof", "profile": profile }]
        })
        .to_string();

        let err = Config::from_json(&json).unwrap_err();
        assert!(matches!(&err, ConfigError::MalformedProfile { device, .. } if device == "roof"));
        let message = err.to_string();
        assert!(message.contains("roof"), "{message}");
        assert!(message.contains("peak_solar_w"), "{message}");
    }

    #[test]
    fn inline_profile_is_accepted() {
        let mut profile = DeviceProfile::shelly_pro_em();
        profile.power.peak_solar_w = 2500.0;
        let json = serde_json::json!({
            "server": { "port": 9000 },
            "devices": [{ "id": "pv-house", "profile": profile }]
        })
        .to_string();
        let cfg = Config::from_json(&json).unwrap();
        assert_eq!(cfg.devices[0].profile.power.peak_solar_w, 2500.0);
    }

    #[test]
    fn unknown_preset_and_duplicates_fail() {
        let err = Config::from_json(
            r#"{ "server": {}, "devices": [{ "id": "x", "profile": "shelly-1pm" }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset { .. }));

        let err = Config::from_json(
            r#"{ "server": {}, "devices": [
                { "id": "x", "profile": "shelly-pm-g3" },
                { "id": "x", "profile": "shelly-pro-em" }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDevice(id) if id == "x"));
    }

    #[test]
    fn server_port_defaults() {
        let cfg = Config::from_json(r#"{ "server": {}, "devices": [] }"#).unwrap();
        assert_eq!(cfg.server.port, 8080);
    }
}
