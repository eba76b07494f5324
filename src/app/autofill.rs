//! Auto-fill controller — the fail-safe fill-pump loop.
//!
//! Drives the [`Fsm`] through one run: clear the cancellation signal, pump
//! on, then poll until a stopped state is reached. Each poll blocks for the
//! poll interval, re-measures water volume, snapshots the cancellation
//! signal, and ticks the FSM. The pump command the FSM writes is applied
//! after every tick.
//!
//! The cut-off bounds the loop even if the clock misbehaves: elapsed time is
//! the larger of the clock's reading and the sum of the delays already
//! taken, and the last delay is clamped so the final poll lands on the
//! cut-off.

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::cycle_state::PersistedCycleState;
use crate::error::ActuatorError;
use crate::fsm::context::{FillLimits, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::safety::CancellationSignal;
use crate::sensors::ReadingName;
use crate::sensors::water_volume::fill_volume;
use crate::telemetry::StopReason;

use super::ports::{ActuatorPort, Clock, SensorPort, force_all_off};

/// Result of one auto-fill run.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct AutoFillOutcome {
    pub stop_reason: StopReason,
    /// Estimated from run time and pump rate (gallons).
    pub filled_volume: f32,
    pub elapsed_secs: f32,
    /// Number of polls taken.
    pub polls: u32,
}

pub struct AutoFillController<'a> {
    signal: &'a CancellationSignal,
    limits: FillLimits,
    gallons_per_minute: f32,
}

impl<'a> AutoFillController<'a> {
    pub fn new(config: &SystemConfig, signal: &'a CancellationSignal) -> Self {
        Self {
            signal,
            limits: FillLimits::from_config(config),
            gallons_per_minute: config.fill_pump_gallons_per_minute,
        }
    }

    /// Run one fill to completion. The caller has already checked the entry
    /// guard.
    ///
    /// Sets `auto_fill_timed_out` in `state` when, and only when, the run
    /// ends on the cut-off. Returns an error only if the pump could not be
    /// switched; in that case every relay has been driven off.
    pub fn run(
        &self,
        hw: &mut (impl SensorPort + ActuatorPort),
        clock: &mut impl Clock,
        state: &mut PersistedCycleState,
    ) -> Result<AutoFillOutcome, ActuatorError> {
        let mut fsm = Fsm::new(build_state_table(), StateId::Idle);
        let mut ctx = FsmContext::new(self.limits);
        fsm.start(&mut ctx);

        // A trip before this point has already blocked the fill upstream.
        self.signal.clear();
        ctx.start_requested = true;
        fsm.tick(&mut ctx);
        if let Err(e) = hw.set_fill_pump(ctx.commands.fill_pump_on) {
            error!("AUTO-FILL: pump on failed: {}", e);
            force_all_off(hw);
            return Err(e);
        }

        let started_ms = clock.now_ms();
        let mut delayed_ms: u64 = 0;
        let mut polls: u32 = 0;

        while !fsm.current_state().is_terminal() {
            let wait = ctx.remaining_ms().min(u64::from(self.limits.poll_ms));
            clock.delay_ms(wait as u32);
            delayed_ms += wait;
            polls += 1;

            ctx.volume_gallons = match hw.measure(ReadingName::WaterLevel) {
                Ok(reading) => Some(reading.value),
                Err(e) => {
                    warn!("AUTO-FILL: volume read failed ({}), skipping full check", e);
                    None
                }
            };
            ctx.cancel_requested = self.signal.is_raised();
            ctx.elapsed_ms = clock.now_ms().saturating_sub(started_ms).max(delayed_ms);
            fsm.tick(&mut ctx);
        }

        // Pump off before anything is reported or persisted.
        if let Err(e) = hw.set_fill_pump(ctx.commands.fill_pump_on) {
            error!("AUTO-FILL: pump off failed: {}, forcing all off", e);
            force_all_off(hw);
        }

        let stop_reason = fsm.current_state().stop_reason().unwrap_or(StopReason::Timer);
        if stop_reason == StopReason::Timer {
            state.latch_auto_fill_timeout();
        }

        let elapsed_secs = ctx.elapsed_secs();
        let outcome = AutoFillOutcome {
            stop_reason,
            filled_volume: fill_volume(elapsed_secs, self.gallons_per_minute),
            elapsed_secs,
            polls,
        };
        info!(
            "AUTO-FILL: {} after {:.0}s, ~{:.1} gal",
            outcome.stop_reason, outcome.elapsed_secs, outcome.filled_volume
        );
        Ok(outcome)
    }
}
