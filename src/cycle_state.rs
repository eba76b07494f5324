//! State that survives deep sleep.
//!
//! [`PersistedCycleState`] lives in RTC slow memory on the ESP32 (see
//! `adapters::rtc_state`). It keeps its last-written value across every
//! deep-sleep wake and resets to [`Default`] on a power loss. The wake-cycle
//! controller loads it once at the top of a cycle and writes it back once at
//! the bottom; nothing else touches it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCycleState {
    /// Flipped every wake; measurements run on the wakes where it is `true`.
    pub measure_this_cycle: bool,
    /// Sticky. Set only when an auto-fill run hits the cut-off timer; blocks
    /// every later auto-fill until cleared by hand or by a power cycle.
    pub auto_fill_timed_out: bool,
    /// High-water float state at the end of the last cycle.
    pub high_water_alarm_active: bool,
    /// Low-water float state at the end of the last cycle.
    pub low_water_alarm_active: bool,
}

impl PersistedCycleState {
    /// Flip the measurement toggle and return its new value.
    pub fn toggle_measurement(&mut self) -> bool {
        self.measure_this_cycle = !self.measure_this_cycle;
        self.measure_this_cycle
    }

    /// Latch the auto-fill lockout.
    pub fn latch_auto_fill_timeout(&mut self) {
        self.auto_fill_timed_out = true;
    }

    /// External reset for the auto-fill lockout (service button at wake).
    pub fn clear_auto_fill_lockout(&mut self) {
        self.auto_fill_timed_out = false;
    }
}
