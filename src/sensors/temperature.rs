//! Analog water-temperature probe (TMP36-style, 10 mV/°C, 500 mV at 0 °C).
//!
//! Reported in degrees Fahrenheit. Measured in the same step as pH so both
//! readings describe the same moment.

use serde::{Deserialize, Serialize};

use super::{Curve, SamplingPolicy};

pub const POLICY: SamplingPolicy = SamplingPolicy::new(10, 10);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureCalibration {
    pub mv_at_zero_c: f32,
    pub mv_per_c: f32,
}

impl Default for TemperatureCalibration {
    fn default() -> Self {
        Self {
            mv_at_zero_c: 500.0,
            mv_per_c: 10.0,
        }
    }
}

impl TemperatureCalibration {
    pub fn curve(&self) -> Curve {
        let f_per_mv = 1.8 / self.mv_per_c;
        Curve::Linear {
            gain: f_per_mv,
            offset: 32.0 - self.mv_at_zero_c * f_per_mv,
        }
    }
}
