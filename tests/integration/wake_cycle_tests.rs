//! Integration tests for the WakeCycleController pipeline: floats,
//! circulation, alternate-wake measurement, telemetry and persistence.

use towerlink::app::events::CycleEvent;
use towerlink::config::SystemConfig;
use towerlink::cycle_state::PersistedCycleState;
use towerlink::error::SensorError;
use towerlink::pins;
use towerlink::power::{PinLevel, WakeReason};
use towerlink::safety::FillBlocked;
use towerlink::sensors::ReadingName;

use crate::mock_hw::{ActuatorCall, MockHardware, MockLink, MockStore};
use crate::run_cycle;

fn measuring_next() -> PersistedCycleState {
    PersistedCycleState::default()
}

fn skipping_next() -> PersistedCycleState {
    PersistedCycleState {
        measure_this_cycle: true,
        ..PersistedCycleState::default()
    }
}

// ── Alternate-wake measurement ───────────────────────────────

#[test]
fn cold_boot_measures_and_sends_four_readings() {
    let cfg = SystemConfig::default();
    let (mut hw, mut link, mut store) = (MockHardware::new(), MockLink::new(), MockStore::default());

    let (report, _) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut link, &mut store);

    assert!(report.measured);
    assert_eq!(
        link.sent,
        [
            "Garden%Voltage%13.50%0%0%0",
            "Garden%pH%6.0%0%0%0",
            "Garden%Temperature%72.0%0%0%0",
            "Garden%Water level%16.5%0%0%0",
        ]
    );
    assert_eq!(report.messages_sent, 4);
    assert_eq!((link.power_ons, link.power_offs), (1, 1));
    assert!(store.writes[0].measure_this_cycle);
    assert_eq!(report.sleep.timer_secs, 300);
    assert_eq!(report.sleep.pin_wake, None);
}

#[test]
fn alternate_wake_runs_pump_but_sends_nothing() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    let mut link = MockLink::new();
    let mut store = MockStore::holding(skipping_next());

    let (report, _) = run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut link, &mut store);

    assert!(!report.measured);
    assert!(link.sent.is_empty());
    assert_eq!(link.power_ons, 0, "radio stays off when there is nothing to send");
    assert_eq!(
        hw.calls,
        [ActuatorCall::Circulation(true), ActuatorCall::Circulation(false)]
    );
    assert!(!store.writes[0].measure_this_cycle);
}

#[test]
fn consecutive_wakes_alternate() {
    let cfg = SystemConfig::default();
    let mut store = MockStore::default();
    let mut measured = Vec::new();
    for wake in [WakeReason::PowerOn, WakeReason::Timer, WakeReason::Timer, WakeReason::Timer] {
        let (report, _) = run_cycle(
            &cfg,
            wake,
            &mut MockHardware::new(),
            &mut MockLink::new(),
            &mut store,
        );
        measured.push(report.measured);
    }
    assert_eq!(measured, [true, false, true, false]);
}

#[test]
fn float_interrupt_armed_every_cycle() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut MockLink::new(), &mut MockStore::default());
    assert_eq!(hw.interrupt_arms, 1);
}

// ── Alarms ───────────────────────────────────────────────────

#[test]
fn low_battery_carries_its_notice() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::Voltage, Ok(12.05));
    let mut link = MockLink::new();

    run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut link, &mut MockStore::default());

    assert_eq!(link.messages_for(ReadingName::Voltage), ["Garden%Voltage%12.05%1%240%5"]);
}

#[test]
fn sensor_fault_skips_only_that_reading() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.set_reading(ReadingName::Ph, Err(SensorError::AdcReadFailed));
    let mut link = MockLink::new();

    let (report, sink) = run_cycle(&cfg, WakeReason::PowerOn, &mut hw, &mut link, &mut MockStore::default());

    assert_eq!(link.sent.len(), 3);
    assert!(link.messages_for(ReadingName::Ph).is_empty());
    assert_eq!(report.messages_sent, 3);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        CycleEvent::ReadingFailed { name: ReadingName::Ph, .. }
    )));
}

#[test]
fn radio_failure_is_counted_and_cycle_completes() {
    let cfg = SystemConfig::default();
    let mut link = MockLink {
        fail_power_on: true,
        ..MockLink::default()
    };
    let mut store = MockStore::default();

    let (report, _) = run_cycle(&cfg, WakeReason::PowerOn, &mut MockHardware::new(), &mut link, &mut store);

    assert_eq!(report.messages_sent, 0);
    assert_eq!(report.messages_failed, 4);
    assert_eq!(link.power_ons, 1, "power-on is tried once per cycle");
    assert_eq!(link.power_offs, 0);
    assert!(link.sent.is_empty());
    assert_eq!(store.writes.len(), 1);
}

#[test]
fn failed_sends_are_not_retried() {
    let cfg = SystemConfig::default();
    let mut link = MockLink {
        fail_sends: true,
        ..MockLink::default()
    };
    let (report, _) = run_cycle(&cfg, WakeReason::PowerOn, &mut MockHardware::new(), &mut link, &mut MockStore::default());
    assert_eq!(link.sent.len(), 4);
    assert_eq!(report.messages_failed, 4);
}

// ── Boot fault ───────────────────────────────────────────────

#[test]
fn boot_fault_reports_and_sleeps_without_persisting() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.configure_error = Some(SensorError::CalibrationFailed);
    let mut link = MockLink::new();
    let mut store = MockStore::holding(measuring_next());

    let (report, sink) = run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut link, &mut store);

    assert!(report.boot_fault);
    assert!(!report.measured);
    assert_eq!(link.sent, ["Garden%Fault%1.0%9%60%3"]);
    assert_eq!(hw.calls, [ActuatorCall::AllOff]);
    assert!(store.writes.is_empty());
    assert_eq!(report.sleep.pin_wake, None);
    assert!(matches!(sink.events.last(), Some(CycleEvent::Finished(r)) if r.boot_fault));
}

#[test]
fn boot_fault_still_reports_water_ingress() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.configure_error = Some(SensorError::CalibrationFailed);
    hw.high_float = true;
    let mut link = MockLink::new();
    let mut store = MockStore::default();

    let (report, sink) = run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut link, &mut store);

    assert!(report.boot_fault);
    assert_eq!(
        link.sent,
        ["Garden%Auto-fill%0.0%1%1%1%FL-SW", "Garden%Fault%1.0%9%60%3"]
    );
    assert_eq!(hw.calls, [ActuatorCall::AllOff]);
    assert!(store.writes.is_empty());
    assert!(report.state.high_water_alarm_active);
    assert_eq!(report.sleep.pin_wake, Some((pins::HIGH_FLOAT_GPIO, PinLevel::Low)));
    assert!(sink.events.iter().any(|e| matches!(e, CycleEvent::WaterIngress)));
}

// ── Float switches ───────────────────────────────────────────

#[test]
fn high_water_on_entry_reports_ingress_and_blocks_fill() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.high_float = true;
    hw.set_reading(ReadingName::WaterLevel, Ok(10.0));
    let mut link = MockLink::new();
    let mut store = MockStore::default();

    let (report, sink) = run_cycle(&cfg, WakeReason::FloatSwitch, &mut hw, &mut link, &mut store);

    assert_eq!(link.sent[0], "Garden%Auto-fill%0.0%1%1%1%FL-SW");
    assert!(sink.events.iter().any(|e| matches!(e, CycleEvent::WaterIngress)));
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, CycleEvent::AutoFillSkipped(FillBlocked::HighWater))));
    assert!(hw.fill_commands().is_empty());
    assert!(store.writes[0].high_water_alarm_active);
    assert_eq!(
        report.sleep.pin_wake,
        Some((pins::HIGH_FLOAT_GPIO, PinLevel::Low))
    );
}

#[test]
fn high_water_is_reported_on_every_wake_until_it_clears() {
    let cfg = SystemConfig::default();
    let mut store = MockStore::default();
    let mut hw = MockHardware::new();
    hw.high_float = true;

    for wake in [WakeReason::PowerOn, WakeReason::Timer] {
        let mut link = MockLink::new();
        run_cycle(&cfg, wake, &mut hw, &mut link, &mut store);
        assert_eq!(link.messages_for(ReadingName::AutoFill), ["Garden%Auto-fill%0.0%1%1%1%FL-SW"]);
    }

    hw.high_float = false;
    let mut link = MockLink::new();
    let (report, _) = run_cycle(&cfg, WakeReason::FloatSwitch, &mut hw, &mut link, &mut store);
    assert_eq!(link.messages_for(ReadingName::AutoFill), ["Garden%Auto-fill%0.0%0%0%0"]);
    assert!(!store.writes.last().unwrap().high_water_alarm_active);
    assert_eq!(report.sleep.pin_wake, None);

    let mut link = MockLink::new();
    run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut link, &mut store);
    assert!(link.messages_for(ReadingName::AutoFill).is_empty(), "clearing is sent once");
}

#[test]
fn low_float_sent_while_active_and_once_on_clearing() {
    let cfg = SystemConfig::default();
    let mut store = MockStore::holding(skipping_next());
    let mut hw = MockHardware::new();
    hw.low_float = true;

    let mut link = MockLink::new();
    let (report, _) = run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut link, &mut store);
    assert_eq!(link.sent, ["Garden%Low float%1.0%1%360%5"]);
    assert_eq!(report.sleep.pin_wake, Some((pins::LOW_FLOAT_GPIO, PinLevel::Low)));

    hw.low_float = false;
    let mut link = MockLink::new();
    run_cycle(&cfg, WakeReason::FloatSwitch, &mut hw, &mut link, &mut store);
    assert_eq!(link.messages_for(ReadingName::LowFloat), ["Garden%Low float%0.0%0%0%0"]);

    let mut link = MockLink::new();
    run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut link, &mut store);
    assert!(link.messages_for(ReadingName::LowFloat).is_empty());
}

#[test]
fn high_float_has_pin_wake_priority() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.high_float = true;
    hw.low_float = true;
    let (report, _) = run_cycle(&cfg, WakeReason::Timer, &mut hw, &mut MockLink::new(), &mut MockStore::default());
    assert_eq!(report.sleep.pin_wake, Some((pins::HIGH_FLOAT_GPIO, PinLevel::Low)));
}

// ── Persistence ──────────────────────────────────────────────

#[test]
fn persist_failure_still_yields_sleep_plan() {
    let cfg = SystemConfig::default();
    let mut store = MockStore {
        fail: true,
        ..MockStore::default()
    };
    let (report, sink) = run_cycle(&cfg, WakeReason::PowerOn, &mut MockHardware::new(), &mut MockLink::new(), &mut store);
    assert_eq!(report.sleep.timer_secs, cfg.sleep_secs);
    assert!(matches!(sink.events.last(), Some(CycleEvent::Finished(_))));
}

#[test]
fn cycle_report_serialises_as_json() {
    let cfg = SystemConfig::default();
    let (report, _) = run_cycle(&cfg, WakeReason::PowerOn, &mut MockHardware::new(), &mut MockLink::new(), &mut MockStore::default());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["wake"], "PowerOn");
    assert_eq!(json["messages_sent"], 4);
    assert_eq!(json["sleep"]["timer_secs"], 300);
}
