//! Towerlink field controller library.
//!
//! Exposes the pure-logic modules for integration testing and the adapters
//! the firmware binary wires together. All ESP-IDF-specific code is guarded
//! by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alarm;
pub mod app;
pub mod config;
pub mod cycle_state;
pub mod fsm;
pub mod power;
pub mod safety;
pub mod sensors;
pub mod telemetry;

pub mod error;
pub mod pins;

// Hardware-facing layers. Each carries a host simulation backend so the
// crate builds and tests without ESP-IDF.
pub mod adapters;
pub mod drivers;
