use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::errors::FormatError;
use crate::models::profile::{EnvelopeStyle, MeterKind};
use crate::models::snapshot::{DeviceSnapshot, EnergyCounter, PhaseReading, SystemHealth};
use crate::models::wire;
use crate::services::rounding::{floor_int, round_dp};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const DEFAULT_RPC_ID: i64 = 1_768_255_378;
pub const DEFAULT_RPC_DST: &str = "flutter_app";

/// Caller side of an RPC exchange: echoed back as `id` and `dst`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct RpcContext {
    pub id: i64,
    pub dst: String,
}

impl Default for RpcContext {
    fn default() -> Self {
        Self { id: DEFAULT_RPC_ID, dst: DEFAULT_RPC_DST.to_string() }
    }
}

/// What the hosting mock server hands back to the requester.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MockResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

/// Serializes `snapshot` inside the requested envelope. Always status 200.
pub fn format_response(
    snapshot: &DeviceSnapshot,
    style: EnvelopeStyle,
    ctx: &RpcContext,
) -> Result<MockResponse, FormatError> {
    let body = serde_json::to_string(&envelope(snapshot, style, ctx)?)?;
    Ok(MockResponse {
        status_code: 200,
        headers: BTreeMap::from([(
            "Content-Type".to_string(),
            vec![CONTENT_TYPE_JSON.to_string()],
        )]),
        body,
    })
}

pub fn envelope(
    snapshot: &DeviceSnapshot,
    style: EnvelopeStyle,
    ctx: &RpcContext,
) -> Result<Value, FormatError> {
    let status = flat_status(snapshot)?;
    match style {
        EnvelopeStyle::Flat => Ok(Value::Object(status)),
        EnvelopeStyle::Rpc => Ok(serde_json::to_value(wire::RpcEnvelope {
            id: ctx.id,
            src: snapshot.device_id.clone(),
            dst: ctx.dst.clone(),
            result: status,
        })?),
    }
}

fn put<T: Serialize>(
    map: &mut Map<String, Value>,
    key: impl Into<String>,
    value: &T,
) -> Result<(), FormatError> {
    map.insert(key.into(), serde_json::to_value(value)?);
    Ok(())
}

/// Component-keyed status object (`ble`, `sys`, `pm1:0`, ...).
/// Keys come out sorted, so equal snapshots give byte-identical bodies.
pub fn flat_status(snapshot: &DeviceSnapshot) -> Result<Map<String, Value>, FormatError> {
    let mut map = Map::new();
    let net = &snapshot.connectivity;

    put(&mut map, "ble", &wire::Empty::default())?;
    put(&mut map, "cloud", &wire::Connected { connected: net.cloud_connected })?;
    put(&mut map, "mqtt", &wire::Connected { connected: net.mqtt_connected })?;
    put(&mut map, "ws", &wire::Connected { connected: net.ws_connected })?;
    if let Some(errors) = &net.bthome_errors {
        put(&mut map, "bthome", &wire::BtHome { errors: errors.clone() })?;
    }
    if let Some(ip) = &net.ethernet {
        put(&mut map, "eth", &wire::Eth { ip: ip.clone() })?;
    }
    if net.modbus {
        put(&mut map, "modbus", &wire::Empty::default())?;
    }

    match snapshot.meter {
        MeterKind::Em1 => {
            for phase in &snapshot.phases {
                put(&mut map, format!("em1:{}", phase.id), &em1(phase)?)?;
            }
            for channel in &snapshot.energy {
                let data = wire::Em1Data {
                    id: channel.id,
                    total_act_energy: round_dp("total_act_energy", channel.forward.total, 3)?,
                    total_act_ret_energy: round_dp(
                        "total_act_ret_energy",
                        channel.returned.total,
                        3,
                    )?,
                };
                put(&mut map, format!("em1data:{}", channel.id), &data)?;
            }
        }
        MeterKind::Pm1 => {
            for phase in &snapshot.phases {
                let idle = EnergyCounter {
                    total: 0.0,
                    by_minute: [0.0; 3],
                    minute_ts: snapshot.system.unixtime,
                };
                let (forward, returned) = match snapshot.energy_channel(phase.id) {
                    Some(c) => (&c.forward, &c.returned),
                    None => (&idle, &idle),
                };
                let pm1 = wire::Pm1 {
                    id: phase.id,
                    voltage: round_dp("voltage", phase.voltage, 1)?,
                    current: round_dp("current", phase.current, 3)?,
                    apower: round_dp("apower", phase.active_power, 1)?,
                    freq: round_dp("freq", phase.frequency, 1)?,
                    aenergy: energy_counter("aenergy", forward)?,
                    ret_aenergy: energy_counter("ret_aenergy", returned)?,
                };
                put(&mut map, format!("pm1:{}", phase.id), &pm1)?;
            }
        }
    }

    for switch in &snapshot.auxiliary.switches {
        let wire_switch = wire::Switch {
            id: switch.id,
            source: switch.source.clone(),
            output: switch.output,
            temperature: wire::Temperature {
                t_c: round_dp("temperature.tC", switch.temperature_c, 1)?,
                t_f: round_dp("temperature.tF", switch.temperature_f(), 1)?,
            },
        };
        put(&mut map, format!("switch:{}", switch.id), &wire_switch)?;
    }
    for script in &snapshot.auxiliary.scripts {
        let wire_script = wire::Script {
            id: script.id,
            running: script.running,
            mem_free: script.mem_free,
            cpu: script.cpu,
        };
        put(&mut map, format!("script:{}", script.id), &wire_script)?;
    }

    put(&mut map, "sys", &sys(&snapshot.system))?;
    let wifi = &net.wifi;
    put(
        &mut map,
        "wifi",
        &wire::Wifi {
            sta_ip: wifi.sta_ip.clone(),
            status: wifi.status.clone(),
            ssid: wifi.ssid.clone(),
            bssid: wifi.bssid.clone(),
            rssi: wifi.rssi,
            sta_ip6: wifi.sta_ip6.clone(),
        },
    )?;
    Ok(map)
}

/// Model-driven power is reported in whole watts; configured constants keep one decimal.
fn em1(phase: &PhaseReading) -> Result<wire::Em1, FormatError> {
    let (act_power, aprt_power) = if phase.fixed {
        (
            wire::Watts::Decimal(round_dp("act_power", phase.active_power, 1)?),
            wire::Watts::Decimal(round_dp("aprt_power", phase.apparent_power, 1)?),
        )
    } else {
        (
            wire::Watts::Whole(floor_int("act_power", phase.active_power)?),
            wire::Watts::Whole(floor_int("aprt_power", phase.apparent_power)?),
        )
    };
    Ok(wire::Em1 {
        id: phase.id,
        current: round_dp("current", phase.current, 3)?,
        voltage: round_dp("voltage", phase.voltage, 1)?,
        act_power,
        aprt_power,
        pf: round_dp("pf", phase.power_factor, 2)?,
        freq: round_dp("freq", phase.frequency, 1)?,
        calibration: phase.calibration.clone(),
    })
}

fn energy_counter(
    field: &'static str,
    counter: &EnergyCounter,
) -> Result<wire::EnergyCounter, FormatError> {
    let mut by_minute = [0.0; 3];
    for (slot, value) in by_minute.iter_mut().zip(counter.by_minute) {
        *slot = round_dp(field, value, 3)?;
    }
    Ok(wire::EnergyCounter {
        total: round_dp(field, counter.total, 3)?,
        by_minute,
        minute_ts: counter.minute_ts,
    })
}

fn sys(health: &SystemHealth) -> wire::Sys {
    wire::Sys {
        mac: health.mac.clone(),
        restart_required: health.restart_required,
        time: health.time_hhmm(),
        unixtime: health.unixtime,
        last_sync_ts: health.last_sync_ts,
        uptime: health.uptime,
        ram_size: health.ram_size,
        ram_free: health.ram_free,
        ram_min_free: health.ram_min_free,
        fs_size: health.fs_size,
        fs_free: health.fs_free,
        cfg_rev: health.cfg_rev,
        kvs_rev: health.kvs_rev,
        schedule_rev: health.schedule_rev,
        webhook_rev: health.webhook_rev,
        btrelay_rev: health.btrelay_rev,
        available_updates: health
            .available_updates
            .iter()
            .map(|(channel, version)| {
                (channel.clone(), wire::FirmwareVersion { version: version.clone() })
            })
            .collect(),
        reset_reason: health.reset_reason,
        utc_offset: health.utc_offset,
    }
}
