//! Wake-cycle controller — the root of one wake → sleep cycle.
//!
//! [`WakeCycleController`] is a fixed pipeline, not a general state
//! machine. All I/O flows through port traits injected at the call site,
//! so the whole cycle runs against mock adapters in tests.
//!
//! ```text
//!  CycleStateStore ──▶ ┌──────────────────────────┐ ──▶ TelemetryLink
//!  SensorPort ───────▶ │   WakeCycleController    │ ──▶ EventSink
//!  ActuatorPort ◀───── │  floats · pump · measure │
//!  Clock ────────────▶ │  auto-fill · persist     │ ──▶ SleepPlan
//!                      └──────────────────────────┘
//! ```
//!
//! Per wake:
//!
//! 1. restore [`PersistedCycleState`]
//! 2. check both float switches (ingress alarm, low-water alarm, clearing edges)
//! 3. arm the high-water cancellation interrupt
//! 4. run the circulation pump for a fixed time
//! 5. toggle `measure_this_cycle`
//! 6. on measurement cycles: voltage, pH, temperature, water level, then
//!    auto-fill if its guard allows
//! 7. persist the state
//! 8. hand back the [`SleepPlan`]
//!
//! Everything runs on one thread and every wait blocks. A failed reading or
//! send is logged and skipped; only a sensor configuration failure at boot
//! cuts the cycle short, and even then the floats are still reported.
//!
//! The floats are read again right before an auto-fill: a trip during
//! circulation or measurement leaves the pin high with no further edge, so
//! the fill's own cancellation would never fire.

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::cycle_state::PersistedCycleState;
use crate::error::{CommsError, Error};
use crate::pins;
use crate::power::{SleepPlan, WakeReason};
use crate::safety::{AutoFillInterlock, CancellationSignal, FillBlocked};
use crate::sensors::{Reading, ReadingName};
use crate::telemetry::{StopReason, TelemetryEncoder};

use super::autofill::{AutoFillController, AutoFillOutcome};
use super::events::{CycleEvent, CycleReport};
use super::ports::{
    ActuatorPort, Clock, CycleStateStore, EventSink, SensorPort, TelemetryLink, force_all_off,
};

/// Readings sent on every measurement cycle, in order.
const MEASURED: [ReadingName; 4] = [
    ReadingName::Voltage,
    ReadingName::Ph,
    ReadingName::Temperature,
    ReadingName::WaterLevel,
];

/// Longest single blocking wait while the circulation pump runs.
const PUMP_WAIT_SLICE_MS: u64 = 100;

// ───────────────────────────────────────────────────────────────
// Radio session
// ───────────────────────────────────────────────────────────────

/// Powers the radio on first use and tallies every send.
struct RadioSession<'c, 'l, L: TelemetryLink> {
    encoder: TelemetryEncoder<'c>,
    link: &'l mut L,
    powered: Option<Result<(), CommsError>>,
    sent: u8,
    failed: u8,
}

impl<'c, 'l, L: TelemetryLink> RadioSession<'c, 'l, L> {
    fn new(config: &'c SystemConfig, link: &'l mut L) -> Self {
        Self {
            encoder: TelemetryEncoder::new(&config.transmitter_name, &config.thresholds),
            link,
            powered: None,
            sent: 0,
            failed: 0,
        }
    }

    fn ensure_on(&mut self) -> Result<(), CommsError> {
        if self.powered.is_none() {
            let on = self.link.power_on();
            if let Err(e) = on {
                error!("Radio power-on failed: {}", e);
            }
            self.powered = Some(on);
        }
        self.powered.unwrap_or(Ok(()))
    }

    fn tally(&mut self, sent: Result<(), CommsError>) -> bool {
        if sent.is_ok() {
            self.sent = self.sent.saturating_add(1);
        } else {
            self.failed = self.failed.saturating_add(1);
        }
        sent.is_ok()
    }

    fn reading(&mut self, reading: Reading, sink: &mut impl EventSink) {
        let (classification, sent) = match self.ensure_on() {
            Ok(()) => self.encoder.send_reading(&mut *self.link, reading),
            Err(e) => (self.encoder.classify(reading), Err(e)),
        };
        let delivered = self.tally(sent);
        sink.emit(&CycleEvent::ReadingSent {
            name: reading.name,
            value: reading.value,
            classification,
            delivered,
        });
    }

    fn auto_fill(&mut self, filled_gallons: f32, reason: StopReason, sink: &mut impl EventSink) {
        let (classification, sent) = match self.ensure_on() {
            Ok(()) => self.encoder.send_auto_fill(&mut *self.link, filled_gallons, reason),
            Err(e) => (self.encoder.classify_stop(reason), Err(e)),
        };
        let delivered = self.tally(sent);
        sink.emit(&CycleEvent::ReadingSent {
            name: ReadingName::AutoFill,
            value: filled_gallons,
            classification,
            delivered,
        });
    }

    fn shutdown(&mut self) {
        if matches!(self.powered, Some(Ok(()))) {
            self.link.power_off();
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WakeCycleController
// ───────────────────────────────────────────────────────────────

pub struct WakeCycleController<'a> {
    config: &'a SystemConfig,
    signal: &'a CancellationSignal,
}

impl<'a> WakeCycleController<'a> {
    pub fn new(config: &'a SystemConfig, signal: &'a CancellationSignal) -> Self {
        Self { config, signal }
    }

    /// Run steps 1–7 and return the report with the sleep plan for step 8.
    pub fn run_cycle(
        &self,
        wake: WakeReason,
        hw: &mut (impl SensorPort + ActuatorPort),
        link: &mut impl TelemetryLink,
        store: &mut impl CycleStateStore,
        clock: &mut impl Clock,
        sink: &mut impl EventSink,
    ) -> CycleReport {
        // 1. Restore
        let mut state = store.load(wake);
        info!("Wake: {:?}, restored {:?}", wake, state);
        sink.emit(&CycleEvent::Started { wake, state });

        let mut radio = RadioSession::new(self.config, link);

        if let Err(e) = hw.configure() {
            return self.abort_on_boot_fault(wake, Error::from(e), hw, &mut radio, state, sink);
        }

        // 2. Float switches
        self.check_floats(hw, &mut radio, &mut state, sink);

        // 3. Cancellation interrupt
        if let Err(e) = hw.arm_float_interrupt() {
            warn!("Float interrupt not armed: {}", e);
        }

        // 4. Circulation pump
        self.run_circulation_pump(hw, clock);

        // 5. Toggle
        let measured = state.toggle_measurement();

        // 6. Measure + auto-fill
        let mut auto_fill = None;
        if measured {
            let volume = self.measure_and_send(hw, &mut radio, sink);
            auto_fill = self.maybe_auto_fill(hw, clock, &mut radio, &mut state, volume, sink);
        } else {
            info!("Skipping measurements this cycle");
        }
        radio.shutdown();

        // 7. Persist
        if let Err(e) = store.store(&state) {
            error!("Cycle state not persisted: {}", e);
        }

        // 8. Plan the sleep
        let report = CycleReport {
            wake,
            measured,
            messages_sent: radio.sent,
            messages_failed: radio.failed,
            auto_fill,
            boot_fault: false,
            state,
            sleep: self.sleep_plan(&state),
        };
        sink.emit(&CycleEvent::Finished(report.clone()));
        report
    }

    // ── Steps ─────────────────────────────────────────────────

    fn abort_on_boot_fault<L: TelemetryLink>(
        &self,
        wake: WakeReason,
        fault: Error,
        hw: &mut (impl SensorPort + ActuatorPort),
        radio: &mut RadioSession<'_, '_, L>,
        mut state: PersistedCycleState,
        sink: &mut impl EventSink,
    ) -> CycleReport {
        error!("Boot fault: {}, aborting cycle", fault);
        force_all_off(hw);
        sink.emit(&CycleEvent::BootFault(fault));
        // Float pins are digital and do not depend on the ADC.
        self.check_floats(hw, radio, &mut state, sink);
        radio.reading(Reading::new(ReadingName::Fault, 1.0), sink);
        radio.shutdown();

        let report = CycleReport {
            wake,
            measured: false,
            messages_sent: radio.sent,
            messages_failed: radio.failed,
            auto_fill: None,
            boot_fault: true,
            state,
            sleep: self.sleep_plan(&state),
        };
        sink.emit(&CycleEvent::Finished(report.clone()));
        report
    }

    fn check_floats<L: TelemetryLink>(
        &self,
        hw: &mut impl SensorPort,
        radio: &mut RadioSession<'_, '_, L>,
        state: &mut PersistedCycleState,
        sink: &mut impl EventSink,
    ) {
        let high_now = hw.high_water_active();
        if high_now {
            warn!("High-water float active on entry: unexpected water ingress");
            sink.emit(&CycleEvent::WaterIngress);
            radio.auto_fill(0.0, StopReason::FloatSwitch, sink);
        } else if state.high_water_alarm_active {
            info!("High-water alarm cleared");
            radio.reading(Reading::new(ReadingName::AutoFill, 0.0), sink);
        }
        state.high_water_alarm_active = high_now;

        let low_now = hw.low_water_active();
        if low_now || state.low_water_alarm_active {
            let value = if low_now { 1.0 } else { 0.0 };
            radio.reading(Reading::new(ReadingName::LowFloat, value), sink);
        }
        state.low_water_alarm_active = low_now;
    }

    fn run_circulation_pump(&self, hw: &mut impl ActuatorPort, clock: &mut impl Clock) {
        let duration_ms = u64::from(self.config.circulation_pump_secs) * 1000;
        if duration_ms == 0 {
            return;
        }
        if let Err(e) = hw.set_circulation_pump(true) {
            error!("Circulation pump on failed: {}", e);
            force_all_off(hw);
            return;
        }
        info!("Circulation pump on for {}s", self.config.circulation_pump_secs);

        let start = clock.now_ms();
        let mut waited = 0u64;
        loop {
            let elapsed = clock.now_ms().saturating_sub(start).max(waited);
            if elapsed >= duration_ms {
                break;
            }
            let slice = (duration_ms - elapsed).min(PUMP_WAIT_SLICE_MS);
            clock.delay_ms(slice as u32);
            waited += slice;
        }

        if let Err(e) = hw.set_circulation_pump(false) {
            error!("Circulation pump off failed: {}, forcing all off", e);
            force_all_off(hw);
        }
    }

    /// Measure and send each reading. Returns the water volume if it was read.
    fn measure_and_send<L: TelemetryLink>(
        &self,
        hw: &mut impl SensorPort,
        radio: &mut RadioSession<'_, '_, L>,
        sink: &mut impl EventSink,
    ) -> Option<f32> {
        let mut volume = None;
        for name in MEASURED {
            match hw.measure(name) {
                Ok(reading) => {
                    if name == ReadingName::WaterLevel {
                        volume = Some(reading.value);
                    }
                    radio.reading(reading, sink);
                }
                Err(e) => {
                    warn!("{} not measured: {}", name, e);
                    sink.emit(&CycleEvent::ReadingFailed {
                        name,
                        error: Error::from(e),
                    });
                }
            }
        }
        volume
    }

    fn maybe_auto_fill<L: TelemetryLink>(
        &self,
        hw: &mut (impl SensorPort + ActuatorPort),
        clock: &mut impl Clock,
        radio: &mut RadioSession<'_, '_, L>,
        state: &mut PersistedCycleState,
        volume: Option<f32>,
        sink: &mut impl EventSink,
    ) -> Option<AutoFillOutcome> {
        if !state.high_water_alarm_active && (hw.high_water_active() || self.signal.is_raised()) {
            warn!("High-water float tripped during the cycle: unexpected water ingress");
            state.high_water_alarm_active = true;
            sink.emit(&CycleEvent::WaterIngress);
            radio.auto_fill(0.0, StopReason::FloatSwitch, sink);
        }

        if let Err(blocked) = AutoFillInterlock::new(self.config).evaluate(state, volume) {
            if blocked != FillBlocked::VolumeAboveStart {
                info!("Auto-fill skipped: {}", blocked);
            }
            sink.emit(&CycleEvent::AutoFillSkipped(blocked));
            return None;
        }

        match AutoFillController::new(self.config, self.signal).run(hw, clock, state) {
            Ok(outcome) => {
                sink.emit(&CycleEvent::AutoFillFinished(outcome));
                radio.auto_fill(outcome.filled_volume, outcome.stop_reason, sink);
                Some(outcome)
            }
            Err(e) => {
                sink.emit(&CycleEvent::ReadingFailed {
                    name: ReadingName::AutoFill,
                    error: Error::from(e),
                });
                None
            }
        }
    }

    /// Timer always; an early pin wake on the clearing level of whichever
    /// float alarm is still active (high water first, EXT0 takes one pin).
    pub fn sleep_plan(&self, state: &PersistedCycleState) -> SleepPlan {
        let clearing = pins::FLOAT_ACTIVE_LEVEL.opposite();
        let pin_wake = if state.high_water_alarm_active {
            Some((pins::HIGH_FLOAT_GPIO, clearing))
        } else if state.low_water_alarm_active {
            Some((pins::LOW_FLOAT_GPIO, clearing))
        } else {
            None
        };
        SleepPlan {
            timer_secs: self.config.sleep_secs,
            pin_wake,
        }
    }
}
