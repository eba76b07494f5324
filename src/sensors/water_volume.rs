//! Milone eTape water-volume sensor.
//!
//! The eTape is a resistive strip; in the tub's working range (8 to 17.4
//! gallons) the divider voltage rises linearly with volume. Below
//! `lowest_gallons` the tape does not respond.

use serde::{Deserialize, Serialize};

use super::{Curve, SamplingPolicy};

pub const POLICY: SamplingPolicy = SamplingPolicy::new(20, 10);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterCalibration {
    /// Volume at which the eTape starts to give valid readings.
    pub lowest_gallons: f32,
    /// Divider voltage at `lowest_gallons`.
    pub lowest_volts: f32,
    pub volts_per_gallon: f32,
}

impl Default for WaterCalibration {
    fn default() -> Self {
        Self {
            lowest_gallons: 5.5,
            lowest_volts: 1.73,
            volts_per_gallon: 0.065,
        }
    }
}

impl WaterCalibration {
    pub fn curve(&self) -> Curve {
        Curve::Linear {
            gain: 1.0 / (1000.0 * self.volts_per_gallon),
            offset: self.lowest_gallons - self.lowest_volts / self.volts_per_gallon,
        }
    }
}

/// Gallons delivered by the fill pump in `elapsed_secs`.
pub fn fill_volume(elapsed_secs: f32, gallons_per_minute: f32) -> f32 {
    (elapsed_secs / 60.0 * gallons_per_minute).max(0.0)
}
