//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the blackboard the auto-fill state handlers read from
//! and write to. The controller fills in the poll inputs (elapsed time,
//! latest volume, cancellation) before each tick and applies the
//! [`FillCommands`] after it.

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Limits (fixed for one run)
// ---------------------------------------------------------------------------

/// The bounds one auto-fill run works against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillLimits {
    /// Stop once the measured volume reaches this (gallons).
    pub stop_gallons: f32,
    /// Hard cap on pump run time.
    pub cutoff_ms: u64,
    /// Nominal time between polls.
    pub poll_ms: u32,
}

impl FillLimits {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            stop_gallons: config.refill_stop_gallons,
            cutoff_ms: u64::from(config.auto_fill_cutoff_secs) * 1000,
            poll_ms: config.auto_fill_poll_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; applied by the controller)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct FillCommands {
    pub fill_pump_on: bool,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Pump run time so far. Reset when `Filling` is entered.
    pub elapsed_ms: u64,

    // -- Poll inputs --
    /// Set by the controller to leave `Idle`.
    pub start_requested: bool,
    /// Latest water-volume reading; `None` when this poll's read failed.
    pub volume_gallons: Option<f32>,
    /// Snapshot of the cancellation signal taken just before the tick.
    pub cancel_requested: bool,

    // -- Outputs --
    pub commands: FillCommands,

    pub limits: FillLimits,
}

impl FsmContext {
    pub fn new(limits: FillLimits) -> Self {
        Self {
            elapsed_ms: 0,
            start_requested: false,
            volume_gallons: None,
            cancel_requested: false,
            commands: FillCommands::default(),
            limits,
        }
    }

    /// Pump run time in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_ms as f32 / 1000.0
    }

    pub fn cutoff_reached(&self) -> bool {
        self.elapsed_ms >= self.limits.cutoff_ms
    }

    /// True only for a valid reading at or above the stop mark.
    pub fn stop_volume_reached(&self) -> bool {
        self.volume_gallons
            .is_some_and(|v| v >= self.limits.stop_gallons)
    }

    /// Time left before the cut-off, in milliseconds.
    pub fn remaining_ms(&self) -> u64 {
        self.limits.cutoff_ms.saturating_sub(self.elapsed_ms)
    }
}
