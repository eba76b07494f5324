//! Unified error types for the towerlink firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! wake-cycle controller's error handling uniform. All variants are `Copy`
//! so they can be passed through the controller and the auto-fill loop
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or calibrated.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The radio link failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC characterisation failed at boot.
    CalibrationFailed,
    /// ADC read returned an error.
    AdcReadFailed,
    /// The channel is not wired to an ADC1 pin.
    UnsupportedChannel,
    /// The averaged reading could not be converted (e.g. zero samples).
    NoSamples,
    /// No sensor is wired for the requested reading.
    NotFitted,
    /// The float-switch interrupt could not be registered.
    InterruptUnavailable,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CalibrationFailed => write!(f, "ADC calibration failed"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::UnsupportedChannel => write!(f, "channel not on ADC1"),
            Self::NoSamples => write!(f, "no samples taken"),
            Self::NotFitted => write!(f, "sensor not fitted"),
            Self::InterruptUnavailable => write!(f, "float interrupt unavailable"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The radio module did not answer `AT`.
    RadioNotResponding,
    /// The radio answered with `+ERR=<code>` or garbage.
    RadioRejected,
    /// UART write or read timed out.
    UartTimeout,
    /// The message does not fit the radio payload limit.
    PayloadTooLong,
    /// A text field contains the `%` delimiter.
    InvalidField,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RadioNotResponding => write!(f, "radio not responding"),
            Self::RadioRejected => write!(f, "radio rejected command"),
            Self::UartTimeout => write!(f, "UART timeout"),
            Self::PayloadTooLong => write!(f, "payload too long"),
            Self::InvalidField => write!(f, "field contains delimiter"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
