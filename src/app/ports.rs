//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ WakeCycleController (domain)
//! ```
//!
//! Driven adapters (ADC channels, relays, float switches, radio, RTC memory,
//! NVS, sleep controller) implement these traits. The
//! [`WakeCycleController`](super::service::WakeCycleController) consumes them
//! via generics, so the domain core never touches hardware directly.
//!
//! Every wait in the system is a blocking delay on the single cycle thread,
//! which is why [`Clock`] extends `embedded_hal::delay::DelayNs` instead of
//! offering anything asynchronous.

use embedded_hal::delay::DelayNs;
use log::error;

use crate::config::SystemConfig;
use crate::cycle_state::PersistedCycleState;
use crate::error::{ActuatorError, CommsError, SensorError};
use crate::power::{PinLevel, WakeReason};
use crate::sensors::{Reading, ReadingName};

// ───────────────────────────────────────────────────────────────
// Voltage source (one ADC channel)
// ───────────────────────────────────────────────────────────────

/// Raw analog front end for one calibrated sensor.
pub trait VoltageSource {
    /// Prepare the channel (attenuation, calibration scheme).
    fn configure(&mut self) -> Result<(), SensorError>;

    /// Average `count` raw reads spaced `delay_ms` apart, in millivolts.
    /// Blocks for roughly `count * delay_ms`.
    fn read_averaged_millivolts(&mut self, count: u16, delay_ms: u32) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: calibrated analog sensors plus the two float switches.
pub trait SensorPort {
    /// Configure every analog channel. A failure here is the one
    /// unrecoverable boot fault.
    fn configure(&mut self) -> Result<(), SensorError>;

    /// Measure one reading with that sensor's own sampling policy.
    fn measure(&mut self, name: ReadingName) -> Result<Reading, SensorError>;

    /// High-water float currently tripped.
    fn high_water_active(&mut self) -> bool;

    /// Low-water float currently tripped.
    fn low_water_active(&mut self) -> bool;

    /// Arm the rising-edge cancellation interrupt on the high-water float.
    /// Calling it again while armed is a no-op.
    fn arm_float_interrupt(&mut self) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the two pump relays.
pub trait ActuatorPort {
    fn set_circulation_pump(&mut self, on: bool) -> Result<(), ActuatorError>;

    fn set_fill_pump(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Drive every relay off. Best effort: keeps going past a failed pin
    /// and reports the first failure.
    fn all_off(&mut self) -> Result<(), ActuatorError>;
}

/// Last-resort [`ActuatorPort::all_off`]. Nothing is left to fall back on,
/// so a failure is only logged.
pub fn force_all_off(hw: &mut impl ActuatorPort) {
    if let Err(e) = hw.all_off() {
        error!("All-off failed: {}, a relay may still be energised", e);
    }
}

// ───────────────────────────────────────────────────────────────
// Telemetry link (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget message transport. No acknowledgement, no retry.
pub trait TelemetryLink {
    fn power_on(&mut self) -> Result<(), CommsError>;

    /// Power the radio down after letting the last frame leave the air.
    fn power_off(&mut self);

    /// Transmit one encoded telemetry message.
    fn send(&mut self, payload: &str) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Cycle-state store (RTC slow memory)
// ───────────────────────────────────────────────────────────────

/// Holds [`PersistedCycleState`] across deep sleep.
pub trait CycleStateStore {
    /// Return the retained state, or the cold default when `wake` says the
    /// retained memory was lost.
    fn load(&mut self, wake: WakeReason) -> PersistedCycleState;

    fn store(&mut self, state: &PersistedCycleState) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST run [`SystemConfig::validate`] before persisting and
/// reject invalid values with [`ConfigError::ValidationFailed`] rather than
/// clamping them. An inverted alarm band or a zero cut-off must never reach
/// flash.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Clock and sleep
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot plus blocking delays.
pub trait Clock: DelayNs {
    fn now_ms(&self) -> u64;
}

/// Wake-source arming and deep-sleep entry.
pub trait SleepPort {
    fn arm_timer_wake(&mut self, secs: u32);

    /// Wake early when `gpio` reaches `level`.
    fn arm_pin_wake(&mut self, gpio: i32, level: PinLevel);

    /// Enter deep sleep. Does not return; the next wake starts from reset.
    fn enter_deep_sleep(&mut self) -> !;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`CycleEvent`](super::events::CycleEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::CycleEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`CycleStateStore`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Record did not fit the reserved region.
    Full,
    /// Serialization failed.
    Encode,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "state record too large"),
            Self::Encode => write!(f, "state encode failed"),
        }
    }
}
