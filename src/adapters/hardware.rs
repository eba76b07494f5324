//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the four calibrated analog sensors, both float switches and both
//! pump relays, exposing them through [`SensorPort`] and [`ActuatorPort`].
//! On non-espidf targets the underlying pins and ADC channels are the
//! simulation stubs in [`hw_init`].

use log::{info, warn};

use crate::adapters::analog::AdcChannel;
use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::SystemConfig;
use crate::drivers::float_switch::FloatSwitch;
use crate::drivers::gpio::GpioPin;
use crate::drivers::hw_init;
use crate::drivers::pump::RelayPump;
use crate::error::{ActuatorError, SensorError};
use crate::pins;
use crate::sensors::{
    CalibratedSensor, Reading, ReadingName, battery, ph, temperature, water_volume,
};

type AnalogSensor = CalibratedSensor<AdcChannel>;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    battery: AnalogSensor,
    ph: AnalogSensor,
    water: AnalogSensor,
    temperature: AnalogSensor,
    high_float: FloatSwitch<GpioPin>,
    low_float: FloatSwitch<GpioPin>,
    circulation: RelayPump<GpioPin>,
    fill: RelayPump<GpioPin>,
}

impl HardwareAdapter {
    /// Wire every sensor to its pin and calibration curve.
    pub fn from_config(config: &SystemConfig) -> Self {
        let analog = |name, gpio, curve, policy| {
            CalibratedSensor::new(name, AdcChannel::new(gpio), curve, policy)
        };
        Self {
            battery: analog(
                ReadingName::Voltage,
                pins::BATTERY_ADC_GPIO,
                config.battery.curve(),
                battery::POLICY,
            ),
            ph: analog(ReadingName::Ph, pins::PH_ADC_GPIO, config.ph.curve(), ph::POLICY),
            water: analog(
                ReadingName::WaterLevel,
                pins::WATER_ADC_GPIO,
                config.water.curve(),
                water_volume::POLICY,
            ),
            temperature: analog(
                ReadingName::Temperature,
                pins::TEMP_ADC_GPIO,
                config.temperature.curve(),
                temperature::POLICY,
            ),
            high_float: FloatSwitch::new(
                "high-water",
                GpioPin::new(pins::HIGH_FLOAT_GPIO),
                pins::FLOAT_ACTIVE_LEVEL,
            ),
            low_float: FloatSwitch::new(
                "low-water",
                GpioPin::new(pins::LOW_FLOAT_GPIO),
                pins::FLOAT_ACTIVE_LEVEL,
            ),
            circulation: RelayPump::new("circulation", GpioPin::new(pins::CIRCULATION_PUMP_GPIO)),
            fill: RelayPump::new("fill", GpioPin::new(pins::FILL_PUMP_GPIO)),
        }
    }

    fn sensor_mut(&mut self, name: ReadingName) -> Option<&mut AnalogSensor> {
        match name {
            ReadingName::Voltage => Some(&mut self.battery),
            ReadingName::Ph => Some(&mut self.ph),
            ReadingName::WaterLevel => Some(&mut self.water),
            ReadingName::Temperature => Some(&mut self.temperature),
            ReadingName::AutoFill | ReadingName::LowFloat | ReadingName::Fault => None,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn configure(&mut self) -> Result<(), SensorError> {
        for sensor in [
            &mut self.battery,
            &mut self.ph,
            &mut self.water,
            &mut self.temperature,
        ] {
            sensor.configure().inspect_err(|e| {
                warn!("{}: configure failed: {}", sensor.name(), e);
            })?;
        }
        info!("HardwareAdapter: analog channels configured");
        Ok(())
    }

    fn measure(&mut self, name: ReadingName) -> Result<Reading, SensorError> {
        self.sensor_mut(name)
            .ok_or(SensorError::NotFitted)?
            .measure()
    }

    fn high_water_active(&mut self) -> bool {
        self.high_float.is_tripped()
    }

    fn low_water_active(&mut self) -> bool {
        self.low_float.is_tripped()
    }

    fn arm_float_interrupt(&mut self) -> Result<(), SensorError> {
        hw_init::init_isr_service().map_err(|e| {
            warn!("HardwareAdapter: {}", e);
            SensorError::InterruptUnavailable
        })
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_circulation_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.circulation.set(on)
    }

    fn set_fill_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.fill.set(on)
    }

    fn all_off(&mut self) -> Result<(), ActuatorError> {
        // Fill pump first: it is the one that can overflow the reservoir.
        let fill = self.fill.set(false);
        let circulation = self.circulation.set(false);
        fill.and(circulation)
    }
}
