//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for one wake cycle: float
//! checks, circulation, the alternate-wake measurement pass, alarm
//! classification, telemetry and the bounded auto-fill run. All interaction
//! with hardware happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod autofill;
pub mod events;
pub mod ports;
pub mod service;
