//! Alarm evaluator.
//!
//! Maps a physical reading and its threshold configuration to an alarm
//! classification plus the notification metadata the base station uses to
//! throttle e-mails.
//!
//! Bounds are exclusive: a value sitting exactly on `low_bound` or
//! `high_bound` is normal. The low check runs first and only one branch
//! can fire, so an inverted configuration never produces two alarms.
//! [`AlarmThreshold::validate`] rejects inverted bounds at startup.

use serde::{Deserialize, Serialize};

use crate::sensors::ReadingName;

/// Notification metadata attached to one side of a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmNotice {
    /// Non-zero code transmitted while the alarm is active.
    pub code: u16,
    pub email_interval_minutes: u16,
    pub max_emails: u16,
}

impl AlarmNotice {
    pub const fn new(code: u16, email_interval_minutes: u16, max_emails: u16) -> Self {
        Self {
            code,
            email_interval_minutes,
            max_emails,
        }
    }
}

/// Per-reading alarm configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmThreshold {
    pub low_bound: Option<f32>,
    pub high_bound: Option<f32>,
    pub low: AlarmNotice,
    pub high: AlarmNotice,
}

impl AlarmThreshold {
    /// Threshold with both bounds.
    pub const fn band(low_bound: f32, low: AlarmNotice, high_bound: f32, high: AlarmNotice) -> Self {
        Self {
            low_bound: Some(low_bound),
            high_bound: Some(high_bound),
            low,
            high,
        }
    }

    /// Threshold that only alarms above `high_bound`.
    pub const fn above(high_bound: f32, high: AlarmNotice) -> Self {
        Self {
            low_bound: None,
            high_bound: Some(high_bound),
            low: AlarmNotice::new(0, 0, 0),
            high,
        }
    }

    /// Reject inverted or equal bounds and non-finite limits.
    pub fn validate(&self) -> Result<(), &'static str> {
        for bound in [self.low_bound, self.high_bound].into_iter().flatten() {
            if !bound.is_finite() {
                return Err("threshold bound must be finite");
            }
        }
        if let (Some(lo), Some(hi)) = (self.low_bound, self.high_bound) {
            if lo >= hi {
                return Err("low_bound must be below high_bound");
            }
        }
        if self.low_bound.is_some() && self.low.code == 0 {
            return Err("low alarm code must be non-zero");
        }
        if self.high_bound.is_some() && self.high.code == 0 {
            return Err("high alarm code must be non-zero");
        }
        Ok(())
    }
}

/// Which side of the band a reading fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmLevel {
    Normal,
    Low,
    High,
}

/// Derived alarm state for one reading. `alarm_code == 0` means normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmClassification {
    pub level: AlarmLevel,
    pub alarm_code: u16,
    pub email_interval: u16,
    pub max_emails: u16,
}

impl AlarmClassification {
    pub const NORMAL: Self = Self {
        level: AlarmLevel::Normal,
        alarm_code: 0,
        email_interval: 0,
        max_emails: 0,
    };

    pub const fn raised(level: AlarmLevel, notice: AlarmNotice) -> Self {
        Self {
            level,
            alarm_code: notice.code,
            email_interval: notice.email_interval_minutes,
            max_emails: notice.max_emails,
        }
    }

    pub fn is_alarm(&self) -> bool {
        self.alarm_code != 0
    }
}

/// Classify `value` against `threshold`.
pub fn classify(value: f32, threshold: &AlarmThreshold) -> AlarmClassification {
    if let Some(lo) = threshold.low_bound {
        if value < lo {
            return AlarmClassification::raised(AlarmLevel::Low, threshold.low);
        }
    }
    if let Some(hi) = threshold.high_bound {
        if value > hi {
            return AlarmClassification::raised(AlarmLevel::High, threshold.high);
        }
    }
    AlarmClassification::NORMAL
}

// ---------------------------------------------------------------------------
// Threshold table
// ---------------------------------------------------------------------------

/// Exactly one threshold per reading name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmThresholds {
    pub voltage: AlarmThreshold,
    pub ph: AlarmThreshold,
    pub water_level: AlarmThreshold,
    pub temperature: AlarmThreshold,
    /// Only the high-side notice is used: it is raised on TIMER and FL-SW stops.
    pub auto_fill: AlarmThreshold,
    pub low_float: AlarmThreshold,
    pub fault: AlarmThreshold,
}

impl AlarmThresholds {
    pub fn for_reading(&self, name: ReadingName) -> &AlarmThreshold {
        match name {
            ReadingName::Voltage => &self.voltage,
            ReadingName::Ph => &self.ph,
            ReadingName::WaterLevel => &self.water_level,
            ReadingName::Temperature => &self.temperature,
            ReadingName::AutoFill => &self.auto_fill,
            ReadingName::LowFloat => &self.low_float,
            ReadingName::Fault => &self.fault,
        }
    }

    /// Classify a reading against its own threshold.
    pub fn classify(&self, name: ReadingName, value: f32) -> AlarmClassification {
        classify(value, self.for_reading(name))
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        ReadingName::ALL
            .into_iter()
            .try_for_each(|name| self.for_reading(name).validate())
    }
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            // Victron charge controller absorbs at 14.5 V; 13.1 V is ~30% on LiFePO4.
            voltage: AlarmThreshold::band(
                13.10,
                AlarmNotice::new(1, 240, 5),
                14.55,
                AlarmNotice::new(3, 15, 3),
            ),
            ph: AlarmThreshold::band(5.4, AlarmNotice::new(1, 360, 3), 6.7, AlarmNotice::new(1, 360, 3)),
            water_level: AlarmThreshold::band(
                14.0,
                AlarmNotice::new(1, 360, 5),
                18.0,
                AlarmNotice::new(33, 15, 5),
            ),
            temperature: AlarmThreshold::band(
                50.0,
                AlarmNotice::new(1, 360, 3),
                90.0,
                AlarmNotice::new(1, 360, 3),
            ),
            auto_fill: AlarmThreshold::above(0.5, AlarmNotice::new(1, 1, 1)),
            low_float: AlarmThreshold::above(0.5, AlarmNotice::new(1, 360, 5)),
            fault: AlarmThreshold::above(0.5, AlarmNotice::new(9, 60, 3)),
        }
    }
}
