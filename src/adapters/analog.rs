//! One ADC1 channel as a [`VoltageSource`].
//!
//! Reads go through [`hw_init::adc1_read_mv`], which returns calibrated
//! millivolts on the real board and the value set by `sim_set_adc_mv` off
//! target. A single failed read fails the whole average.

use embedded_hal::delay::DelayNs;
use log::warn;

use crate::adapters::time::SystemClock;
use crate::app::ports::VoltageSource;
use crate::drivers::hw_init;
use crate::error::SensorError;

pub struct AdcChannel {
    gpio: i32,
    channel: Option<u32>,
    delay: SystemClock,
}

impl AdcChannel {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            channel: None,
            delay: SystemClock::new(),
        }
    }
}

impl VoltageSource for AdcChannel {
    fn configure(&mut self) -> Result<(), SensorError> {
        let channel =
            hw_init::adc1_channel_for_gpio(self.gpio).ok_or(SensorError::UnsupportedChannel)?;
        // Proves the calibration handle works before any measurement relies on it.
        hw_init::adc1_read_mv(channel).map_err(|rc| {
            warn!("ADC1 CH{} (GPIO{}) probe read failed ({})", channel, self.gpio, rc);
            SensorError::CalibrationFailed
        })?;
        self.channel = Some(channel);
        Ok(())
    }

    fn read_averaged_millivolts(&mut self, count: u16, delay_ms: u32) -> Result<f32, SensorError> {
        let channel = self.channel.ok_or(SensorError::CalibrationFailed)?;
        if count == 0 {
            return Err(SensorError::NoSamples);
        }
        let mut sum: i64 = 0;
        for i in 0..count {
            let mv = hw_init::adc1_read_mv(channel).map_err(|rc| {
                warn!("ADC1 CH{} read failed ({})", channel, rc);
                SensorError::AdcReadFailed
            })?;
            sum += i64::from(mv);
            if i + 1 < count {
                self.delay.delay_ms(delay_ms);
            }
        }
        Ok(sum as f32 / f32::from(count))
    }
}
