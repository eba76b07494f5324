//! Auto-fill safety interlocks.
//!
//! Two independent mechanisms keep the fill pump bounded:
//!
//! 1. The cut-off timer inside the auto-fill state machine. It is never
//!    skipped and is the only path that latches the lockout flag.
//! 2. [`CancellationSignal`], raised by the high-water float ISR. It reacts
//!    faster than the timer but is polled, so the pump can stay on for up to
//!    one poll interval after the float trips.
//!
//! [`AutoFillInterlock`] decides whether a fill may start at all.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::config::SystemConfig;
use crate::cycle_state::PersistedCycleState;

// ---------------------------------------------------------------------------
// Cancellation signal (ISR → auto-fill loop)
// ---------------------------------------------------------------------------

/// The one flag shared across the interrupt boundary.
///
/// Raised only by the float ISR, cleared only by the auto-fill controller
/// when a new fill starts.
#[derive(Debug, Default)]
pub struct CancellationSignal {
    raised: AtomicBool,
}

impl CancellationSignal {
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Called from interrupt context. Lock-free, no other work.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    pub(crate) fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }
}

/// Signal wired to the high-water float interrupt on the real board.
pub static HIGH_WATER_CANCEL: CancellationSignal = CancellationSignal::new();

/// GPIO ISR body for the high-water float (rising edge).
pub fn high_water_isr_handler() {
    HIGH_WATER_CANCEL.raise();
}

// ---------------------------------------------------------------------------
// Entry guard
// ---------------------------------------------------------------------------

/// Why an auto-fill did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillBlocked {
    /// Not a measurement wake.
    NotMeasuring,
    /// A previous run hit the cut-off; lockout is latched.
    LockedOut,
    /// The high-water float is tripped.
    HighWater,
    /// No valid water-volume reading this cycle.
    NoVolumeReading,
    /// Volume is above the refill-start mark.
    VolumeAboveStart,
}

impl core::fmt::Display for FillBlocked {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotMeasuring => write!(f, "not a measurement cycle"),
            Self::LockedOut => write!(f, "locked out after cut-off"),
            Self::HighWater => write!(f, "high-water float active"),
            Self::NoVolumeReading => write!(f, "no water-volume reading"),
            Self::VolumeAboveStart => write!(f, "volume above refill start"),
        }
    }
}

/// Auto-fill entry guard.
pub struct AutoFillInterlock {
    refill_start_gallons: f32,
}

impl AutoFillInterlock {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            refill_start_gallons: config.refill_start_gallons,
        }
    }

    /// `Ok(())` when every entry condition holds.
    pub fn evaluate(
        &self,
        state: &PersistedCycleState,
        volume_gallons: Option<f32>,
    ) -> Result<(), FillBlocked> {
        if !state.measure_this_cycle {
            return Err(FillBlocked::NotMeasuring);
        }
        if state.auto_fill_timed_out {
            warn!("AUTO-FILL: lockout latched, fill suppressed");
            return Err(FillBlocked::LockedOut);
        }
        if state.high_water_alarm_active {
            return Err(FillBlocked::HighWater);
        }
        let volume = volume_gallons.ok_or(FillBlocked::NoVolumeReading)?;
        if volume > self.refill_start_gallons {
            return Err(FillBlocked::VolumeAboveStart);
        }
        info!(
            "AUTO-FILL: {:.1} gal <= start mark {:.1} gal",
            volume, self.refill_start_gallons
        );
        Ok(())
    }
}
