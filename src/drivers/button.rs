//! Service button sampled once at wake.
//!
//! ## Hardware
//!
//! Active-low momentary switch with external pull-up. There is no interrupt:
//! the chip is asleep between cycles, so the button only counts if it is
//! held down while the unit boots. Holding it clears the auto-fill lockout.
//!
//! Two reads [`DEBOUNCE_MS`] apart must both see the press. A read failure
//! counts as released so a faulty pin can never clear the lockout.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

pub const DEBOUNCE_MS: u32 = 50;

pub struct ServiceButton<P> {
    pin: P,
}

impl<P: InputPin> ServiceButton<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn is_held(&mut self, delay: &mut impl DelayNs) -> bool {
        if !self.pressed_now() {
            return false;
        }
        delay.delay_ms(DEBOUNCE_MS);
        self.pressed_now()
    }

    fn pressed_now(&mut self) -> bool {
        self.pin.is_low().unwrap_or(false)
    }
}
