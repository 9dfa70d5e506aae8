use chrono::{DateTime, Timelike, Utc};
use rand::Rng;

use crate::models::profile::{DeviceProfile, ReadingSpec};
use crate::models::snapshot::{
    AuxiliaryState, ConnectivityStatus, DeviceSnapshot, EnergyChannel, PhaseReading,
    ScriptState, SwitchState, SystemHealth, WifiStatus,
};
use crate::services::energy::EnergyAccumulator;
use crate::services::power_model::PowerModel;

/// Builds one snapshot for `now`.
///
/// Random draws happen in a fixed order (load, voltage, uptime, RAM free,
/// FS free, RSSI), so a seeded `rng` gives reproducible output. The profile
/// is expected to have passed [`DeviceProfile::validate`].
pub fn synthesize<R: Rng + ?Sized>(
    now: DateTime<Utc>,
    profile: &DeviceProfile,
    rng: &mut R,
) -> DeviceSnapshot {
    let local_time = now.with_timezone(&profile.system.utc_offset());
    let model = PowerModel::sample(local_time.hour(), &profile.power, rng);
    synthesize_with_model(now, profile, &model, rng)
}

/// Same as [`synthesize`] but with the power-flow sample supplied by the caller.
pub fn synthesize_with_model<R: Rng + ?Sized>(
    now: DateTime<Utc>,
    profile: &DeviceProfile,
    model: &PowerModel,
    rng: &mut R,
) -> DeviceSnapshot {
    let local_time = now.with_timezone(&profile.system.utc_offset());
    let unixtime = now.timestamp();
    let accumulator = EnergyAccumulator::at(now);

    let phases = profile
        .phases
        .iter()
        .map(|phase| match &phase.reading {
            ReadingSpec::Dynamic => PhaseReading {
                id: phase.id,
                current: model.current,
                voltage: model.voltage,
                active_power: model.net_power,
                apparent_power: model.apparent_power(&profile.power),
                power_factor: profile.power.power_factor,
                frequency: profile.power.frequency_hz,
                calibration: phase.calibration.clone(),
                fixed: false,
            },
            ReadingSpec::Fixed(r) => PhaseReading {
                id: phase.id,
                current: r.current,
                voltage: r.voltage,
                active_power: r.active_power,
                apparent_power: r.apparent_power,
                power_factor: r.power_factor,
                frequency: r.frequency,
                calibration: phase.calibration.clone(),
                fixed: true,
            },
        })
        .collect();

    let energy = profile
        .energy_channels
        .iter()
        .map(|channel| EnergyChannel {
            id: channel.id,
            forward: accumulator.counter(channel.forward_rate),
            returned: accumulator.counter(channel.returned_rate),
        })
        .collect();

    let sys = &profile.system;
    let system = SystemHealth {
        mac: profile.identity.mac.clone(),
        restart_required: sys.restart_required,
        local_time,
        unixtime,
        last_sync_ts: sys.last_sync_lag_secs.map(|lag| unixtime.saturating_sub(lag)),
        uptime: sys.uptime_secs.sample(rng),
        ram_size: sys.ram_size,
        ram_free: sys.ram_free.sample(rng),
        ram_min_free: sys.ram_min_free,
        fs_size: sys.fs_size,
        fs_free: sys.fs_free.sample(rng),
        cfg_rev: sys.cfg_rev,
        kvs_rev: sys.kvs_rev,
        schedule_rev: sys.schedule_rev,
        webhook_rev: sys.webhook_rev,
        btrelay_rev: sys.btrelay_rev,
        available_updates: sys.available_updates.clone(),
        reset_reason: sys.reset_reason,
        utc_offset: sys.report_utc_offset.then_some(sys.utc_offset_secs),
    };

    let net = &profile.connectivity;
    let connectivity = ConnectivityStatus {
        wifi: WifiStatus {
            sta_ip: net.sta_ip.clone(),
            status: net.wifi_status.clone(),
            ssid: net.ssid.clone(),
            bssid: net.bssid.clone(),
            rssi: net.rssi.sample(rng),
            sta_ip6: net.sta_ip6.clone(),
        },
        cloud_connected: net.cloud_connected,
        mqtt_connected: net.mqtt_connected,
        ws_connected: net.ws_connected,
        bthome_errors: net.bthome_errors.clone(),
        ethernet: net.ethernet.as_ref().map(|eth| eth.ip.clone()),
        modbus: net.modbus,
    };

    let auxiliary = AuxiliaryState {
        switches: profile
            .auxiliary
            .switches
            .iter()
            .map(|s| SwitchState {
                id: s.id,
                source: s.source.clone(),
                output: s.output,
                temperature_c: s.temperature_c,
            })
            .collect(),
        scripts: profile
            .auxiliary
            .scripts
            .iter()
            .map(|s| ScriptState { id: s.id, running: s.running, mem_free: s.mem_free, cpu: s.cpu })
            .collect(),
    };

    DeviceSnapshot {
        meter: profile.meter,
        device_id: profile.identity.device_id.clone(),
        phases,
        energy,
        system,
        connectivity,
        auxiliary,
    }
}
