//! Float switch input.
//!
//! A pin that cannot be read is reported as tripped: a missing float must
//! block the fill pump, not permit it.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::power::PinLevel;

pub struct FloatSwitch<P> {
    label: &'static str,
    pin: P,
    active: PinLevel,
}

impl<P: InputPin> FloatSwitch<P> {
    pub fn new(label: &'static str, pin: P, active: PinLevel) -> Self {
        Self { label, pin, active }
    }

    pub fn is_tripped(&mut self) -> bool {
        let read = match self.active {
            PinLevel::High => self.pin.is_high(),
            PinLevel::Low => self.pin.is_low(),
        };
        read.unwrap_or_else(|e| {
            warn!("{} float: read failed ({:?}), treating as tripped", self.label, e);
            true
        })
    }
}
