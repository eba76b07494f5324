//! Integration tests for the auto-fill path: entry guard, the three stop
//! reasons, the lockout latch, and ordering against telemetry and
//! persistence.

use std::sync::Arc;

use towerlink::adapters::rtc_state::RtcStateStore;
use towerlink::app::autofill::AutoFillController;
use towerlink::app::events::CycleEvent;
use towerlink::app::ports::CycleStateStore;
use towerlink::app::service::WakeCycleController;
use towerlink::config::SystemConfig;
use towerlink::cycle_state::PersistedCycleState;
use towerlink::error::{ActuatorError, SensorError};
use towerlink::pins;
use towerlink::power::{PinLevel, WakeReason};
use towerlink::safety::{CancellationSignal, FillBlocked};
use towerlink::sensors::ReadingName;
use towerlink::telemetry::StopReason;

use crate::mock_hw::{ActuatorCall, Journal, MockClock, MockHardware, MockLink, MockStore, RecordingSink};
use crate::{run_cycle, run_cycle_with_signal};

fn skipped(sink: &RecordingSink) -> Option<FillBlocked> {
    sink.events.iter().find_map(|e| match e {
        CycleEvent::AutoFillSkipped(b) => Some(*b),
        _ => None,
    })
}

fn measuring() -> PersistedCycleState {
    PersistedCycleState {
        measure_this_cycle: true,
        ..PersistedCycleState::default()
    }
}

// ── Normal fill ──────────────────────────────────────────────

#[test]
fn fill_stops_at_stop_volume() {
    let cfg = SystemConfig::default();
    let journal = Journal::default();
    let mut hw = MockHardware::new().with_journal(&journal);
    hw.script_water(&[13.5, 14.0, 15.0, 16.0, 17.0]);
    let mut link = MockLink::new().with_journal(&journal);
    let mut store = MockStore::default().with_journal(&journal);

    let (report, _) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut link, &mut store);

    let outcome = report.auto_fill.expect("fill should have run");
    assert_eq!(outcome.stop_reason, StopReason::Fill);
    assert_eq!(outcome.polls, 4);
    assert!((outcome.elapsed_secs - 4.0).abs() < 1e-3);
    assert_eq!(hw.fill_commands(), [true, false]);
    assert_eq!(
        link.messages_for(ReadingName::AutoFill),
        ["Garden%Auto-fill%0.1%0%0%0%Fill"]
    );
    assert!(!store.writes[0].auto_fill_timed_out);

    let off = journal.position("fill:off").unwrap();
    let tx = journal.position("tx:Garden%Auto-fill").unwrap();
    let persist = journal.position("persist").unwrap();
    assert!(off < tx && tx < persist, "{:?}", journal.entries());
}

#[test]
fn guard_is_inclusive_at_refill_start() {
    let cfg = SystemConfig::default();

    let mut hw = MockHardware::new();
    hw.script_water(&[15.0, 17.0]);
    let (report, _) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut MockLink::new(), &mut MockStore::default());
    assert_eq!(report.auto_fill.map(|o| o.stop_reason), Some(StopReason::Fill));

    let mut hw = MockHardware::new();
    hw.script_water(&[15.5]);
    let (report, sink) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut MockLink::new(), &mut MockStore::default());
    assert!(report.auto_fill.is_none());
    assert!(hw.fill_commands().is_empty());
    assert_eq!(skipped(&sink), Some(FillBlocked::VolumeAboveStart));
}

#[test]
fn missing_volume_reading_blocks_fill() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Err(SensorError::AdcReadFailed));
    let (_, sink) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut MockLink::new(), &mut MockStore::default());
    assert_eq!(skipped(&sink), Some(FillBlocked::NoVolumeReading));
    assert!(hw.fill_commands().is_empty());
}

// ── Cut-off and lockout ──────────────────────────────────────

#[test]
fn stuck_sensor_hits_cutoff_and_latches_lockout() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Ok(13.5));
    let mut link = MockLink::new();
    let mut store = MockStore::default();

    let (report, _) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut link, &mut store);

    let outcome = report.auto_fill.unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Timer);
    assert_eq!(outcome.polls, 180);
    assert!((outcome.elapsed_secs - 180.0).abs() < 1e-3);
    assert!(!hw.fill_pump_on());
    assert_eq!(
        link.messages_for(ReadingName::AutoFill),
        ["Garden%Auto-fill%3.6%1%1%1%TIMER"]
    );
    assert!(store.writes[0].auto_fill_timed_out);

    // Lockout holds across sleep: the next measurement wake skips the fill.
    run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut MockLink::new(), &mut store);
    let (report, sink) = run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut MockLink::new(), &mut store);
    assert!(report.measured);
    assert!(report.auto_fill.is_none());
    assert_eq!(skipped(&sink), Some(FillBlocked::LockedOut));
}

#[test]
fn sensor_failure_during_fill_ends_on_cutoff() {
    let mut cfg = SystemConfig::default();
    cfg.auto_fill_cutoff_secs = 10;
    let mut hw = MockHardware::new();
    hw.script_water(&[13.0]);
    hw.set_reading(ReadingName::WaterLevel, Err(SensorError::AdcReadFailed));
    let mut store = MockStore::default();

    let (report, _) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut MockLink::new(), &mut store);

    assert_eq!(report.auto_fill.unwrap().stop_reason, StopReason::Timer);
    assert_eq!(hw.water_reads(), 11);
    assert!(store.writes[0].auto_fill_timed_out);
}

#[test]
fn frozen_clock_is_still_bounded_by_delays() {
    let cfg = SystemConfig::default();
    let signal = CancellationSignal::new();
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Ok(12.0));
    let mut clock = MockClock::frozen();
    let mut state = measuring();

    let outcome = AutoFillController::new(&cfg, &signal)
        .run(&mut hw, &mut clock, &mut state)
        .unwrap();

    assert_eq!(outcome.stop_reason, StopReason::Timer);
    assert_eq!(outcome.polls, 180);
    assert_eq!(clock.total_delay_ms, 180_000);
    assert!(state.auto_fill_timed_out);
}

#[test]
fn last_poll_is_clamped_to_cutoff() {
    let mut cfg = SystemConfig::default();
    cfg.auto_fill_cutoff_secs = 5;
    cfg.auto_fill_poll_ms = 2_000;
    let signal = CancellationSignal::new();
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Ok(12.0));
    let mut clock = MockClock::new();
    let mut state = measuring();

    let outcome = AutoFillController::new(&cfg, &signal)
        .run(&mut hw, &mut clock, &mut state)
        .unwrap();

    assert_eq!(outcome.polls, 3);
    assert_eq!(clock.total_delay_ms, 5_000);
    assert!((outcome.elapsed_secs - 5.0).abs() < 1e-3);
}

// ── Cancellation ─────────────────────────────────────────────

#[test]
fn float_interrupt_cancels_mid_fill_without_lockout() {
    let cfg = SystemConfig::default();
    let signal = Arc::new(CancellationSignal::new());
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Ok(13.5));
    // Read 1 is the measurement step; the float trips on the second poll.
    hw.isr_after_water_reads = Some((3, Arc::clone(&signal)));
    let mut link = MockLink::new();
    let mut store = MockStore::default();

    let (report, _) = run_cycle_with_signal(&cfg, &signal, WakeReason::PowerOn, &mut hw, &mut link, &mut store);

    let outcome = report.auto_fill.unwrap();
    assert_eq!(outcome.stop_reason, StopReason::FloatSwitch);
    assert_eq!(outcome.polls, 2);
    assert!(!hw.fill_pump_on());
    assert_eq!(
        link.messages_for(ReadingName::AutoFill),
        ["Garden%Auto-fill%0.0%1%1%1%FL-SW"]
    );
    assert!(!store.writes[0].auto_fill_timed_out);
}

#[test]
fn float_tripped_during_circulation_blocks_fill() {
    let cfg = SystemConfig::default();
    let signal = Arc::new(CancellationSignal::new());
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Ok(13.5));
    hw.float_trips_on_circulation = Some(Arc::clone(&signal));
    let mut link = MockLink::new();
    let mut store = MockStore::default();

    let (report, sink) = run_cycle_with_signal(&cfg, &signal, WakeReason::PowerOn, &mut hw, &mut link, &mut store);

    assert!(report.measured);
    assert!(report.auto_fill.is_none());
    assert!(hw.fill_commands().is_empty());
    assert_eq!(skipped(&sink), Some(FillBlocked::HighWater));
    assert!(sink.events.iter().any(|e| matches!(e, CycleEvent::WaterIngress)));
    assert_eq!(
        link.messages_for(ReadingName::AutoFill),
        ["Garden%Auto-fill%0.0%1%1%1%FL-SW"]
    );
    assert!(store.writes[0].high_water_alarm_active);
    assert_eq!(report.sleep.pin_wake, Some((pins::HIGH_FLOAT_GPIO, PinLevel::Low)));
}

#[test]
fn raised_signal_blocks_fill_even_after_float_drops() {
    let cfg = SystemConfig::default();
    let signal = CancellationSignal::new();
    // The float bounced: the ISR fired but the pin reads clear again.
    signal.raise();
    let mut hw = MockHardware::new();
    hw.script_water(&[13.5, 17.0]);
    let mut link = MockLink::new();
    let mut store = MockStore::default();

    let (report, sink) = run_cycle_with_signal(&cfg, &signal, WakeReason::PowerOn, &mut hw, &mut link, &mut store);

    assert!(report.auto_fill.is_none());
    assert!(hw.fill_commands().is_empty());
    assert_eq!(skipped(&sink), Some(FillBlocked::HighWater));
    assert_eq!(
        link.messages_for(ReadingName::AutoFill),
        ["Garden%Auto-fill%0.0%1%1%1%FL-SW"]
    );
    assert!(store.writes[0].high_water_alarm_active);
}

// ── Pump faults ──────────────────────────────────────────────

#[test]
fn pump_on_failure_forces_all_off_and_sends_nothing() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Ok(13.5));
    hw.fill_pump_error = Some(ActuatorError::GpioWriteFailed);
    let mut link = MockLink::new();
    let mut store = MockStore::default();

    let (report, sink) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut link, &mut store);

    assert!(report.auto_fill.is_none());
    assert!(!hw.fill_pump_on());
    assert!(link.messages_for(ReadingName::AutoFill).is_empty());
    assert!(!store.writes[0].auto_fill_timed_out);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        CycleEvent::ReadingFailed { name: ReadingName::AutoFill, .. }
    )));
}

#[test]
fn failing_all_off_is_logged_and_cycle_completes() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Ok(13.5));
    hw.fill_pump_error = Some(ActuatorError::GpioWriteFailed);
    hw.all_off_error = Some(ActuatorError::GpioWriteFailed);
    let mut link = MockLink::new();
    let mut store = MockStore::default();

    let (report, sink) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut link, &mut store);

    assert!(report.auto_fill.is_none());
    assert!(hw.calls.contains(&ActuatorCall::AllOff));
    assert_eq!(store.writes.len(), 1);
    assert_eq!(report.messages_sent, 4);
    assert!(matches!(sink.events.last(), Some(CycleEvent::Finished(_))));
}

// ── Lockout reset through RTC memory ─────────────────────────

fn cycle_with_rtc(
    cfg: &SystemConfig,
    wake: WakeReason,
    hw: &mut MockHardware,
    store: &mut RtcStateStore,
) -> Option<StopReason> {
    let signal = CancellationSignal::new();
    let report = WakeCycleController::new(cfg, &signal).run_cycle(
        wake,
        hw,
        &mut MockLink::new(),
        store,
        &mut MockClock::new(),
        &mut RecordingSink::new(),
    );
    report.auto_fill.map(|o| o.stop_reason)
}

#[test]
fn lockout_cleared_by_service_button_or_power_cycle() {
    let mut cfg = SystemConfig::default();
    cfg.auto_fill_cutoff_secs = 3;
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::WaterLevel, Ok(13.5));
    let mut rtc = RtcStateStore::new();

    assert_eq!(cycle_with_rtc(&cfg, WakeReason::PowerOn, &mut hw, &mut rtc), Some(StopReason::Timer));
    cycle_with_rtc(&cfg, WakeReason::Timer, &mut hw, &mut rtc);
    assert_eq!(cycle_with_rtc(&cfg, WakeReason::Timer, &mut hw, &mut rtc), None);

    // Service button held at the next wake.
    let mut state = rtc.load(WakeReason::Timer);
    assert!(state.auto_fill_timed_out);
    state.clear_auto_fill_lockout();
    rtc.store(&state).unwrap();
    cycle_with_rtc(&cfg, WakeReason::Timer, &mut hw, &mut rtc);
    assert_eq!(cycle_with_rtc(&cfg, WakeReason::Timer, &mut hw, &mut rtc), Some(StopReason::Timer));

    // Power cycle wipes RTC memory and with it the lockout.
    assert_eq!(cycle_with_rtc(&cfg, WakeReason::PowerOn, &mut hw, &mut rtc), Some(StopReason::Timer));
}
