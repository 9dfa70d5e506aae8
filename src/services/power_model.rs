/// ============================================================
///  Synthetic household power-flow model
///
///   1. Daylight curve  – sin((h - 6)·π/12), clipped at 0
///   2. Base load       – nominal ± spread/2, uniform
///   3. Solar offset    – daylight × peak PV capacity
///   4. Net power       – load − solar (negative = export)
///   5. Mains voltage   – nominal ± spread/2, uniform
///   6. Current         – net / voltage (Ohm's law, never sampled)
/// ============================================================

use std::f64::consts::PI;

use rand::Rng;

use crate::models::profile::PowerSpec;

/// Deterministic daylight factor in `[0, 1]` for an hour of the day.
/// Zero from 18:00 through 06:00, exactly 1 at 12:00.
pub fn solar_factor(hour_of_day: u32) -> f64 {
    match hour_of_day {
        12 => 1.0,
        h if (6..18).contains(&h) => ((h as f64 - 6.0) * PI / 12.0).sin().max(0.0),
        _ => 0.0,
    }
}

/// Uniform draw in `[-spread/2, +spread/2)`.
fn jitter<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> f64 {
    rng.gen_range(-0.5..0.5) * spread
}

/// One sample of the power-flow model. All values unrounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    pub hour_of_day: u32,
    pub base_load: f64,
    pub solar_factor: f64,
    pub solar_offset: f64,
    pub net_power: f64,
    pub voltage: f64,
    pub current: f64,
}

impl PowerModel {
    /// Draws load and voltage from `rng` (load first, then voltage).
    pub fn sample<R: Rng + ?Sized>(hour_of_day: u32, spec: &PowerSpec, rng: &mut R) -> Self {
        let base_load = spec.nominal_load_w + jitter(rng, spec.load_spread_w);
        let voltage = spec.nominal_voltage_v + jitter(rng, spec.voltage_spread_v);
        Self::from_draws(hour_of_day, base_load, voltage, spec)
    }

    /// Derives the dependent quantities from already drawn load and voltage.
    pub fn from_draws(hour_of_day: u32, base_load: f64, voltage: f64, spec: &PowerSpec) -> Self {
        let solar_factor = solar_factor(hour_of_day);
        let solar_offset = solar_factor * spec.peak_solar_w;
        let net_power = base_load - solar_offset;
        Self {
            hour_of_day,
            base_load,
            solar_factor,
            solar_offset,
            net_power,
            voltage,
            current: net_power / voltage,
        }
    }

    pub fn apparent_power(&self, spec: &PowerSpec) -> f64 {
        self.net_power * spec.apparent_power_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::DeviceProfile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn solar_curve_is_zero_at_night_and_peaks_at_noon() {
        for h in (0..6).chain(18..24) {
            assert_eq!(solar_factor(h), 0.0, "hour {h}");
        }
        assert_eq!(solar_factor(12), 1.0);
        for h in 0..24 {
            let f = solar_factor(h);
            assert!((0.0..=1.0).contains(&f), "hour {h} gave {f}");
        }
        assert!((solar_factor(9) - solar_factor(15)).abs() < 1e-12);
        assert!(solar_factor(9) < solar_factor(11));
    }

    #[test]
    fn noon_with_stubbed_load() {
        let spec = DeviceProfile::shelly_pm_g3().power;
        let m = PowerModel::from_draws(12, 1000.0, 231.7, &spec);
        assert_eq!(m.solar_factor, 1.0);
        assert_eq!(m.solar_offset, 600.0);
        assert_eq!(m.net_power, 400.0);
        assert_eq!(m.current, 400.0 / 231.7);
    }

    #[test]
    fn midnight_has_no_solar_offset() {
        let spec = DeviceProfile::shelly_pm_g3().power;
        let m = PowerModel::from_draws(0, 1123.4, 229.0, &spec);
        assert_eq!(m.solar_offset, 0.0);
        assert_eq!(m.net_power, 1123.4);
    }

    #[test]
    fn current_times_voltage_matches_net_power() {
        let spec = DeviceProfile::shelly_pro_em().power;
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..500 {
            let m = PowerModel::sample(i % 24, &spec, &mut rng);
            assert!((m.current * m.voltage - m.net_power).abs() < 1e-9);
        }
    }

    #[test]
    fn draws_stay_within_spread() {
        let spec = DeviceProfile::shelly_pro_em().power;
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1000 {
            let m = PowerModel::sample(3, &spec, &mut rng);
            assert!((800.0..=1200.0).contains(&m.base_load));
            assert!((225.0..=235.0).contains(&m.voltage));
        }
    }

    #[test]
    fn lowest_draw_hits_the_bottom_of_the_spread() {
        let spec = DeviceProfile::shelly_pro_em().power;
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        let m = PowerModel::sample(3, &spec, &mut rng);
        assert_eq!(m.base_load, 800.0);
        assert_eq!(m.voltage, 225.0);
    }

    #[test]
    fn midday_export_is_negative() {
        let mut spec = DeviceProfile::shelly_pm_g3().power;
        spec.peak_solar_w = 3000.0;
        let m = PowerModel::from_draws(12, 1000.0, 230.0, &spec);
        assert_eq!(m.net_power, -2000.0);
        assert!(m.current < 0.0);
    }
}
