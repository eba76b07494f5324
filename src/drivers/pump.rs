//! Relay-switched pump driver.
//!
//! The circulation and fill pumps are plain 12 V pumps behind active-high
//! relays: on or off, no speed control.
//!
//! ## Safety contract
//!
//! The fill pump must never run outside the auto-fill loop, which bounds it
//! by the cut-off timer and the float interrupt. This driver is a dumb
//! actuator and enforces nothing.

use embedded_hal::digital::OutputPin;
use log::error;

use crate::error::ActuatorError;

pub struct RelayPump<P> {
    label: &'static str,
    pin: P,
    on: bool,
}

impl<P: OutputPin> RelayPump<P> {
    pub fn new(label: &'static str, pin: P) -> Self {
        Self {
            label,
            pin,
            on: false,
        }
    }

    /// Energise or release the relay. The recorded state only changes when
    /// the pin write succeeds.
    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => {
                self.on = on;
                Ok(())
            }
            Err(e) => {
                error!("{} pump: relay write failed ({:?})", self.label, e);
                Err(ActuatorError::GpioWriteFailed)
            }
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
