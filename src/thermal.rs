//! Diurnal surface temperature model
//!
//! Every block and every placed item carries a [`ThermalItem`]. Its temperature
//! follows a 24 hour cosine that peaks at [`T_PEAK`] with an amplitude
//! proportional to the item's mean temperature.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

pub const TREE_INITIAL_TEMP: f64 = 16.0;
pub const HOUSE_INITIAL_TEMP: f64 = 19.0;
pub const ROAD_INITIAL_TEMP: f64 = 35.0;
pub const YARD_INITIAL_TEMP: f64 = 24.0;
pub const GROUND_INITIAL_TEMP: f64 = 28.0;
pub const RIVER_INITIAL_TEMP: f64 = 10.0;

/// Hour of day at which every surface reaches its maximum.
pub const T_PEAK: f64 = 14.0;

/// Amplitude as a fraction of the mean temperature.
pub const EFFECT_RATE: f64 = 0.2;

const HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalItem {
    pub initial_temp: f64,
    pub current_temp: f64,
    pub t_mean: f64,
    pub t_amp: f64,
    pub t_peak: f64,
}

impl ThermalItem {
    /// Blends the item's characteristic temperature with the ambient
    /// temperature of its surroundings.
    pub fn new(initial_temp: f64, ambient_temp: f64) -> Self {
        let t_mean = (initial_temp + ambient_temp) / 2.0;
        Self {
            initial_temp,
            current_temp: initial_temp,
            t_mean,
            t_amp: EFFECT_RATE * t_mean,
            t_peak: T_PEAK,
        }
    }

    /// Thermal state of a surface whose mean is its own base temperature,
    /// as used by blocks.
    pub fn ambient(base_temp: f64) -> Self {
        Self::new(base_temp, base_temp)
    }

    pub fn update_temperature(&mut self, hour: f64) {
        self.current_temp = diurnal(self.t_mean, self.t_amp, self.t_peak, hour);
    }

    /// Temperature at `hour` without touching `current_temp`.
    pub fn temperature_at(&self, hour: f64) -> f64 {
        diurnal(self.t_mean, self.t_amp, self.t_peak, hour)
    }
}

pub fn diurnal(t_mean: f64, t_amp: f64, t_peak: f64, hour: f64) -> f64 {
    t_mean + t_amp * (2.0 * PI / HOURS_PER_DAY * (hour - t_peak)).cos()
}

/// Summary statistics over a temperature raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ThermalStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &value in values {
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }
        Some(Self {
            min,
            max,
            mean: sum / values.len() as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_amplitude_follow_blend() {
        let item = ThermalItem::new(HOUSE_INITIAL_TEMP, YARD_INITIAL_TEMP);
        assert_eq!(item.t_mean, (19.0 + 24.0) / 2.0);
        assert_eq!(item.t_amp, 0.2 * item.t_mean);
        assert_eq!(item.current_temp, HOUSE_INITIAL_TEMP);
        assert_eq!(item.t_peak, 14.0);
    }

    #[test]
    fn peak_and_trough() {
        for initial in [TREE_INITIAL_TEMP, HOUSE_INITIAL_TEMP, ROAD_INITIAL_TEMP] {
            let mut item = ThermalItem::new(initial, GROUND_INITIAL_TEMP);
            item.update_temperature(14.0);
            assert_relative_eq!(item.current_temp, item.t_mean + item.t_amp);
            item.update_temperature(2.0);
            assert_relative_eq!(item.current_temp, item.t_mean - item.t_amp);
        }
    }

    #[test]
    fn update_is_idempotent_and_periodic() {
        let mut item = ThermalItem::new(ROAD_INITIAL_TEMP, YARD_INITIAL_TEMP);
        item.update_temperature(7.25);
        let first = item.current_temp;
        item.update_temperature(7.25);
        assert_eq!(item.current_temp, first);

        item.update_temperature(7.25 + 24.0);
        assert_relative_eq!(item.current_temp, first, epsilon = 1e-9);
        assert_relative_eq!(item.temperature_at(7.25 + 48.0), first, epsilon = 1e-9);
    }

    #[test]
    fn block_ambient_keeps_base_as_mean() {
        let river = ThermalItem::ambient(RIVER_INITIAL_TEMP);
        assert_eq!(river.t_mean, 10.0);
        assert_eq!(river.t_amp, 2.0);
    }

    #[test]
    fn stats_cover_range() {
        let stats = ThermalStats::from_values(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_relative_eq!(stats.mean, 20.0);
        assert!(ThermalStats::from_values(&[]).is_none());
    }
}
