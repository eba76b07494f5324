//! pH probe with three-point buffer calibration.
//!
//! The probe amplifier output falls as pH rises. Millivolts recorded in the
//! 4.00, 7.00 and 10.00 buffer solutions define two line segments that meet
//! at pH 7.

use serde::{Deserialize, Serialize};

use super::{Curve, SamplingPolicy};

/// The pH amplifier is noisy; average more than the other channels.
pub const POLICY: SamplingPolicy = SamplingPolicy::new(40, 20);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhCalibration {
    /// Average millivolts in pH 4.00 buffer.
    pub low_mv: f32,
    /// Average millivolts in pH 7.00 buffer.
    pub mid_mv: f32,
    /// Average millivolts in pH 10.00 buffer.
    pub high_mv: f32,
}

impl Default for PhCalibration {
    fn default() -> Self {
        Self {
            low_mv: 2030.0,
            mid_mv: 1500.0,
            high_mv: 975.0,
        }
    }
}

impl PhCalibration {
    pub fn curve(&self) -> Curve {
        Curve::TwoSegment {
            low: (self.low_mv, 4.0),
            mid: (self.mid_mv, 7.0),
            high: (self.high_mv, 10.0),
        }
    }
}
