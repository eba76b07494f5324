//! Calibrated analog sensors.
//!
//! Every analog reading in the system follows the same path: a
//! [`VoltageSource`] averages N raw ADC reads into millivolts, and a fixed
//! [`Curve`] maps millivolts to physical units. Each sensor module
//! (`battery`, `ph`, `water_volume`, `temperature`) owns its sampling
//! policy and builds its curve from the calibration block in
//! [`SystemConfig`](crate::config::SystemConfig).
//!
//! There are no retries. A failed ADC read aborts that one measurement and
//! the error propagates to the caller; there is no partial reading.

pub mod battery;
pub mod ph;
pub mod temperature;
pub mod water_volume;

use serde::{Deserialize, Serialize};

use crate::app::ports::VoltageSource;
use crate::error::SensorError;

// ---------------------------------------------------------------------------
// Reading names
// ---------------------------------------------------------------------------

/// Name of a telemetry reading, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadingName {
    Voltage,
    Ph,
    WaterLevel,
    Temperature,
    AutoFill,
    LowFloat,
    Fault,
}

impl ReadingName {
    pub const ALL: [Self; 7] = [
        Self::Voltage,
        Self::Ph,
        Self::WaterLevel,
        Self::Temperature,
        Self::AutoFill,
        Self::LowFloat,
        Self::Fault,
    ];

    /// Wire text for this reading.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Voltage => "Voltage",
            Self::Ph => "pH",
            Self::WaterLevel => "Water level",
            Self::Temperature => "Temperature",
            Self::AutoFill => "Auto-fill",
            Self::LowFloat => "Low float",
            Self::Fault => "Fault",
        }
    }

    /// Decimal places used when the value is formatted for the wire.
    pub const fn decimals(self) -> usize {
        match self {
            Self::Voltage => 2,
            _ => 1,
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.as_str() == s)
    }
}

impl core::fmt::Display for ReadingName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical-unit value produced once per sensor per cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub name: ReadingName,
    pub value: f32,
}

impl Reading {
    pub const fn new(name: ReadingName, value: f32) -> Self {
        Self { name, value }
    }
}

// ---------------------------------------------------------------------------
// Calibration curves
// ---------------------------------------------------------------------------

/// Millivolts → physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    /// `value = millivolts * gain + offset`
    Linear { gain: f32, offset: f32 },
    /// Two line segments joined at `mid`. Points are `(millivolts, value)`;
    /// readings beyond either end extrapolate along the outer segment.
    TwoSegment {
        low: (f32, f32),
        mid: (f32, f32),
        high: (f32, f32),
    },
}

impl Curve {
    pub fn apply(&self, millivolts: f32) -> f32 {
        match *self {
            Self::Linear { gain, offset } => millivolts * gain + offset,
            Self::TwoSegment { low, mid, high } => {
                // Points may run in either direction (pH probes fall as pH rises).
                let on_low_side = if low.0 <= mid.0 {
                    millivolts <= mid.0
                } else {
                    millivolts >= mid.0
                };
                if on_low_side {
                    interpolate(low, mid, millivolts)
                } else {
                    interpolate(mid, high, millivolts)
                }
            }
        }
    }
}

fn interpolate(a: (f32, f32), b: (f32, f32), x: f32) -> f32 {
    let span = b.0 - a.0;
    if span.abs() < f32::EPSILON {
        return a.1;
    }
    a.1 + (x - a.0) * (b.1 - a.1) / span
}

// ---------------------------------------------------------------------------
// Sampling policy
// ---------------------------------------------------------------------------

/// How many raw reads to average and how far apart to space them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    pub samples: u16,
    pub delay_ms: u32,
}

impl SamplingPolicy {
    pub const fn new(samples: u16, delay_ms: u32) -> Self {
        Self { samples, delay_ms }
    }

    /// Never sample less, or faster, than `floor` asks for.
    pub fn at_least(self, floor: Self) -> Self {
        Self {
            samples: self.samples.max(floor.samples),
            delay_ms: self.delay_ms.max(floor.delay_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// CalibratedSensor
// ---------------------------------------------------------------------------

/// A voltage source paired with its calibration curve and sampling floor.
pub struct CalibratedSensor<V> {
    name: ReadingName,
    source: V,
    curve: Curve,
    policy: SamplingPolicy,
}

impl<V: VoltageSource> CalibratedSensor<V> {
    pub fn new(name: ReadingName, source: V, curve: Curve, policy: SamplingPolicy) -> Self {
        Self {
            name,
            source,
            curve,
            policy,
        }
    }

    pub fn name(&self) -> ReadingName {
        self.name
    }

    pub fn configure(&mut self) -> Result<(), SensorError> {
        self.source.configure()
    }

    /// Measure with the sensor's own sampling policy.
    pub fn measure(&mut self) -> Result<Reading, SensorError> {
        self.measure_with(self.policy)
    }

    /// Measure with a caller-supplied policy, raised to the sensor's floor.
    pub fn measure_with(&mut self, requested: SamplingPolicy) -> Result<Reading, SensorError> {
        let policy = requested.at_least(self.policy);
        let mv = self
            .source
            .read_averaged_millivolts(policy.samples, policy.delay_ms)?;
        let value = self.curve.apply(mv);
        log::debug!("{}: {:.1} mV -> {:.3}", self.name, mv, value);
        Ok(Reading::new(self.name, value))
    }
}
