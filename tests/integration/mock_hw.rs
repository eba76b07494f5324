//! Mock adapters for integration tests.
//!
//! Every mock records what the controller asked of it. Mocks built with
//! the same [`Journal`] also append to one shared, ordered log so tests can
//! assert ordering across ports (pump off before telemetry before persist).

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use towerlink::app::events::CycleEvent;
use towerlink::app::ports::{
    ActuatorPort, Clock, CycleStateStore, EventSink, SensorPort, StorageError, TelemetryLink,
};
use towerlink::cycle_state::PersistedCycleState;
use towerlink::error::{ActuatorError, CommsError, SensorError};
use towerlink::power::WakeReason;
use towerlink::safety::CancellationSignal;
use towerlink::sensors::{Reading, ReadingName};

// ── Journal ───────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

#[allow(dead_code)]
impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Position of the first entry starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e.starts_with(prefix))
    }
}

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Circulation(bool),
    Fill(bool),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    /// Fixed result per reading name. Water level falls back to this once
    /// `water_script` is empty.
    pub readings: HashMap<ReadingName, Result<f32, SensorError>>,
    /// Consumed one entry per water-level measurement.
    pub water_script: VecDeque<Result<f32, SensorError>>,
    pub high_float: bool,
    pub low_float: bool,
    pub configure_error: Option<SensorError>,
    pub fill_pump_error: Option<ActuatorError>,
    pub interrupt_arms: u32,
    /// Raise the signal right after the n-th water-level measurement, the
    /// way the float ISR would fire mid-fill.
    pub isr_after_water_reads: Option<(u32, Arc<CancellationSignal>)>,
    /// Trip the high-water float when circulation starts: pin held high and
    /// the signal raised, as the ISR would.
    pub float_trips_on_circulation: Option<Arc<CancellationSignal>>,
    pub all_off_error: Option<ActuatorError>,
    water_reads: u32,
    pub journal: Journal,
}

#[allow(dead_code)]
impl MockHardware {
    /// Healthy readings, both floats clear, tank above the refill mark.
    pub fn new() -> Self {
        let readings = HashMap::from([
            (ReadingName::Voltage, Ok(13.5)),
            (ReadingName::Ph, Ok(6.0)),
            (ReadingName::Temperature, Ok(72.0)),
            (ReadingName::WaterLevel, Ok(16.5)),
        ]);
        Self {
            calls: Vec::new(),
            readings,
            water_script: VecDeque::new(),
            high_float: false,
            low_float: false,
            configure_error: None,
            fill_pump_error: None,
            interrupt_arms: 0,
            isr_after_water_reads: None,
            float_trips_on_circulation: None,
            all_off_error: None,
            water_reads: 0,
            journal: Journal::default(),
        }
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn set_reading(&mut self, name: ReadingName, value: Result<f32, SensorError>) {
        self.readings.insert(name, value);
    }

    /// Water level for the measurement step, then one entry per fill poll.
    pub fn script_water(&mut self, levels: &[f32]) {
        self.water_script = levels.iter().copied().map(Ok).collect();
    }

    pub fn water_reads(&self) -> u32 {
        self.water_reads
    }

    pub fn fill_pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Fill(on) => Some(*on),
                ActuatorCall::AllOff => Some(false),
                ActuatorCall::Circulation(_) => None,
            })
            .unwrap_or(false)
    }

    pub fn fill_commands(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Fill(on) => Some(*on),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn configure(&mut self) -> Result<(), SensorError> {
        self.configure_error.map_or(Ok(()), Err)
    }

    fn measure(&mut self, name: ReadingName) -> Result<Reading, SensorError> {
        let value = if name == ReadingName::WaterLevel {
            self.water_reads += 1;
            if let Some((n, signal)) = &self.isr_after_water_reads {
                if self.water_reads >= *n {
                    signal.raise();
                }
            }
            self.water_script
                .pop_front()
                .or_else(|| self.readings.get(&name).copied())
        } else {
            self.readings.get(&name).copied()
        };
        value
            .unwrap_or(Err(SensorError::NotFitted))
            .map(|v| Reading::new(name, v))
    }

    fn high_water_active(&mut self) -> bool {
        self.high_float
    }

    fn low_water_active(&mut self) -> bool {
        self.low_float
    }

    fn arm_float_interrupt(&mut self) -> Result<(), SensorError> {
        self.interrupt_arms += 1;
        Ok(())
    }
}

impl ActuatorPort for MockHardware {
    fn set_circulation_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Circulation(on));
        if on {
            if let Some(signal) = &self.float_trips_on_circulation {
                self.high_float = true;
                signal.raise();
            }
        }
        Ok(())
    }

    fn set_fill_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        if on {
            if let Some(e) = self.fill_pump_error {
                return Err(e);
            }
        }
        self.calls.push(ActuatorCall::Fill(on));
        self.journal.push(format!("fill:{}", if on { "on" } else { "off" }));
        Ok(())
    }

    fn all_off(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::AllOff);
        self.journal.push("all_off");
        self.all_off_error.map_or(Ok(()), Err)
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    pub sent: Vec<String>,
    pub power_ons: u32,
    pub power_offs: u32,
    pub fail_power_on: bool,
    pub fail_sends: bool,
    pub journal: Journal,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// Messages whose reading-name field is `name`.
    pub fn messages_for(&self, name: ReadingName) -> Vec<&str> {
        self.sent
            .iter()
            .map(String::as_str)
            .filter(|m| m.split('%').nth(1) == Some(name.as_str()))
            .collect()
    }
}

impl TelemetryLink for MockLink {
    fn power_on(&mut self) -> Result<(), CommsError> {
        self.power_ons += 1;
        if self.fail_power_on {
            Err(CommsError::RadioNotResponding)
        } else {
            Ok(())
        }
    }

    fn power_off(&mut self) {
        self.power_offs += 1;
    }

    fn send(&mut self, payload: &str) -> Result<(), CommsError> {
        self.journal.push(format!("tx:{}", payload));
        self.sent.push(payload.to_owned());
        if self.fail_sends {
            Err(CommsError::UartTimeout)
        } else {
            Ok(())
        }
    }
}

// ── MockStore ─────────────────────────────────────────────────

/// RTC memory stand-in. `retained` is what survived the last sleep.
#[derive(Default)]
pub struct MockStore {
    pub retained: Option<PersistedCycleState>,
    pub writes: Vec<PersistedCycleState>,
    pub fail: bool,
    pub journal: Journal,
}

#[allow(dead_code)]
impl MockStore {
    pub fn holding(state: PersistedCycleState) -> Self {
        Self {
            retained: Some(state),
            ..Self::default()
        }
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }
}

impl CycleStateStore for MockStore {
    fn load(&mut self, wake: WakeReason) -> PersistedCycleState {
        if wake.is_cold() {
            return PersistedCycleState::default();
        }
        self.retained.unwrap_or_default()
    }

    fn store(&mut self, state: &PersistedCycleState) -> Result<(), StorageError> {
        self.journal.push("persist");
        if self.fail {
            return Err(StorageError::Full);
        }
        self.writes.push(*state);
        self.retained = Some(*state);
        Ok(())
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Advances only when the controller delays. `frozen` models a clock that
/// never moves at all.
#[derive(Default)]
pub struct MockClock {
    now_us: u64,
    pub frozen: bool,
    pub total_delay_ms: u64,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frozen() -> Self {
        Self {
            frozen: true,
            ..Self::default()
        }
    }
}

impl DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        let us = u64::from(ns) / 1_000;
        self.total_delay_ms += u64::from(ns) / 1_000_000;
        if !self.frozen {
            self.now_us += us;
        }
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_us / 1_000
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<CycleEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &CycleEvent) {
        self.events.push(event.clone());
    }
}
