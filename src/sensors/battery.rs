//! Battery voltage through a resistive divider.
//!
//! The divider ratio comes from the measured R1/R2 values; a per-unit
//! multiplier absorbs the remaining ADC and resistor error. Calibrate at
//! normal battery voltage against a meter.

use serde::{Deserialize, Serialize};

use super::{Curve, SamplingPolicy};

/// 30 reads, 30 ms apart.
pub const POLICY: SamplingPolicy = SamplingPolicy::new(30, 30);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryCalibration {
    pub r1_ohms: f32,
    pub r2_ohms: f32,
    pub multiplier: f32,
}

impl Default for BatteryCalibration {
    fn default() -> Self {
        Self {
            r1_ohms: 100_500.0,
            r2_ohms: 22_040.0,
            multiplier: 0.98,
        }
    }
}

impl BatteryCalibration {
    pub fn curve(&self) -> Curve {
        let divider = (self.r1_ohms + self.r2_ohms) / self.r2_ohms;
        Curve::Linear {
            gain: divider * self.multiplier / 1000.0,
            offset: 0.0,
        }
    }
}
