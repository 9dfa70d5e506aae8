use chrono::{DateTime, Utc};

use crate::models::snapshot::EnergyCounter;

/// Energy counters derived from wall-clock minutes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyAccumulator {
    minutes_since_epoch: i64,
    minute_ts: i64,
}

impl EnergyAccumulator {
    /// Pre-epoch instants clamp to minute 0.
    pub fn at(now: DateTime<Utc>) -> Self {
        let unix = now.timestamp();
        Self {
            minutes_since_epoch: unix.div_euclid(60).max(0),
            minute_ts: unix,
        }
    }

    pub fn from_minutes(minutes_since_epoch: i64, minute_ts: i64) -> Self {
        Self { minutes_since_epoch: minutes_since_epoch.max(0), minute_ts }
    }

    pub fn minutes_since_epoch(&self) -> i64 {
        self.minutes_since_epoch
    }

    pub fn total_energy(&self, rate: f64) -> f64 {
        self.minutes_since_epoch as f64 * rate
    }

    /// Totals at minutes `m-2`, `m-1`, `m`, never before minute 0.
    pub fn recent_samples(&self, rate: f64) -> [f64; 3] {
        [2, 1, 0].map(|k| (self.minutes_since_epoch - k).max(0) as f64 * rate)
    }

    pub fn counter(&self, rate: f64) -> EnergyCounter {
        EnergyCounter {
            total: self.total_energy(rate),
            by_minute: self.recent_samples(rate),
            minute_ts: self.minute_ts,
        }
    }
}
