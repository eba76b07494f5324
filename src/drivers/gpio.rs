//! `embedded-hal` digital pin over a raw GPIO number.
//!
//! Pins must already be configured by [`hw_init::init_peripherals`]; this
//! type only reads and writes levels.

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::drivers::hw_init;

/// ESP-IDF error code from a failed level access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioPin {
    gpio: i32,
}

impl GpioPin {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub const fn number(&self) -> i32 {
        self.gpio
    }
}

impl ErrorType for GpioPin {
    type Error = GpioError;
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, false).map_err(GpioError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, true).map_err(GpioError)
    }
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(hw_init::gpio_read(self.gpio))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!hw_init::gpio_read(self.gpio))
    }
}
