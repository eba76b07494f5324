//! Outbound diagnostic events.
//!
//! The [`WakeCycleController`](super::service::WakeCycleController) emits
//! these through the [`EventSink`](super::ports::EventSink) port as the
//! cycle progresses. The device is unattended, so the console log they end
//! up in is the only local error surface.

use serde::Serialize;

use crate::alarm::AlarmClassification;
use crate::cycle_state::PersistedCycleState;
use crate::error::Error;
use crate::power::{SleepPlan, WakeReason};
use crate::safety::FillBlocked;
use crate::sensors::ReadingName;

use super::autofill::AutoFillOutcome;

#[derive(Debug, Clone)]
pub enum CycleEvent {
    /// Cycle started with the restored state.
    Started {
        wake: WakeReason,
        state: PersistedCycleState,
    },
    /// Boot-time sensor configuration failed; the cycle is aborted.
    BootFault(Error),
    /// High-water float was already active on entry.
    WaterIngress,
    /// A reading was measured and handed to the radio.
    ReadingSent {
        name: ReadingName,
        value: f32,
        classification: AlarmClassification,
        delivered: bool,
    },
    /// One reading could not be produced or sent.
    ReadingFailed { name: ReadingName, error: Error },
    /// Auto-fill entry guard said no.
    AutoFillSkipped(FillBlocked),
    AutoFillFinished(AutoFillOutcome),
    /// End-of-cycle summary, emitted just before sleep.
    Finished(CycleReport),
}

/// What happened in one wake cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub wake: WakeReason,
    pub measured: bool,
    pub messages_sent: u8,
    pub messages_failed: u8,
    pub auto_fill: Option<AutoFillOutcome>,
    pub boot_fault: bool,
    pub state: PersistedCycleState,
    pub sleep: SleepPlan,
}
