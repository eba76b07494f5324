//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit and its calibration scheme, GPIO
//! directions, and the high-water float interrupt using raw ESP-IDF sys
//! calls. Called once per wake from `main()` before the cycle runs.
//!
//! Off-target, GPIO levels and ADC millivolts live in static atomics so the
//! simulation and host tests can drive them with [`sim_set_level`] and
//! [`sim_set_adc_mv`].

use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    CalibrationFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::CalibrationFailed(rc) => write!(f, "ADC1 calibration failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

/// ADC1 channel wired to `gpio`, if any. ADC2 is never used.
pub const fn adc1_channel_for_gpio(gpio: i32) -> Option<u32> {
    match gpio {
        36 => Some(0),
        37 => Some(1),
        38 => Some(2),
        39 => Some(3),
        32 => Some(4),
        33 => Some(5),
        34 => Some(6),
        35 => Some(7),
        _ => None,
    }
}

const ANALOG_GPIOS: [i32; 4] = [
    pins::BATTERY_ADC_GPIO,
    pins::PH_ADC_GPIO,
    pins::WATER_ADC_GPIO,
    pins::TEMP_ADC_GPIO,
];

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the cycle runs; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    for gpio in ANALOG_GPIOS {
        if adc1_channel_for_gpio(gpio).is_none() {
            return Err(HwInitError::AdcInitFailed(gpio));
        }
    }
    info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot + line-fitting calibration) ──────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut ADC1_CALI: adc_cali_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only after `init_adc()` from the single cycle
/// thread. Both handles are written once at boot and never again.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handles() -> (adc_oneshot_unit_handle_t, adc_cali_handle_t) {
    unsafe { (ADC1_HANDLE, ADC1_CALI) }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 12 dB attenuation covers the 0–3.1 V span every divider is sized for.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for gpio in ANALOG_GPIOS {
        let Some(channel) = adc1_channel_for_gpio(gpio) else {
            return Err(HwInitError::AdcInitFailed(gpio));
        };
        let ret = unsafe { adc_oneshot_config_channel(ADC1_HANDLE, channel, &chan_cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    let cali_cfg = adc_cali_line_fitting_config_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        ..Default::default()
    };
    // SAFETY: ADC1_CALI is only written here, once at boot.
    let ret = unsafe { adc_cali_create_scheme_line_fitting(&cali_cfg, &raw mut ADC1_CALI) };
    if ret != ESP_OK {
        return Err(HwInitError::CalibrationFailed(ret));
    }

    info!("hw_init: ADC1 configured (CH4-CH7, line fitting)");
    Ok(())
}

/// One calibrated ADC1 read in millivolts. `Err` carries the ESP-IDF code.
#[cfg(target_os = "espidf")]
pub fn adc1_read_mv(channel: u32) -> Result<i32, i32> {
    let mut raw: i32 = 0;
    let mut mv: i32 = 0;
    // SAFETY: adc1_handles() contract, single cycle thread only.
    unsafe {
        let (unit, cali) = adc1_handles();
        let ret = adc_oneshot_read(unit, channel, &mut raw);
        if ret != ESP_OK {
            return Err(ret);
        }
        let ret = adc_cali_raw_to_voltage(cali, raw, &mut mv);
        if ret != ESP_OK {
            return Err(ret);
        }
    }
    Ok(mv)
}

#[cfg(not(target_os = "espidf"))]
static SIM_ADC_MV: [core::sync::atomic::AtomicI32; 8] =
    [const { core::sync::atomic::AtomicI32::new(0) }; 8];

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read_mv(channel: u32) -> Result<i32, i32> {
    SIM_ADC_MV
        .get(channel as usize)
        .map(|mv| mv.load(Ordering::Relaxed))
        .ok_or(-1)
}

/// Set the millivolts the simulated ADC1 channel for `gpio` returns.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_mv(gpio: i32, mv: i32) {
    if let Some(channel) = adc1_channel_for_gpio(gpio) {
        SIM_ADC_MV[channel as usize].store(mv, Ordering::Relaxed);
    }
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // Floats pull HIGH when tripped; hold them low otherwise.
    let float_pins = [pins::HIGH_FLOAT_GPIO, pins::LOW_FLOAT_GPIO];
    for &pin in &float_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    // Service button: active-low with external pull-up.
    let btn_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::SERVICE_BUTTON_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&btn_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: [AtomicBool; 40] = [const { AtomicBool::new(false) }; 40];

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    usize::try_from(pin)
        .ok()
        .and_then(|i| SIM_LEVELS.get(i))
        .is_some_and(|level| level.load(Ordering::Acquire))
}

/// Drive a simulated input. A rising edge on the high-water float runs the
/// cancellation handler once the interrupt is armed, as the real ISR would.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    let Some(level) = usize::try_from(pin).ok().and_then(|i| SIM_LEVELS.get(i)) else {
        return;
    };
    let was_high = level.swap(high, Ordering::AcqRel);
    if pin == pins::HIGH_FLOAT_GPIO && high && !was_high && ISR_ARMED.load(Ordering::Acquire) {
        crate::safety::high_water_isr_handler();
    }
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [
        pins::CIRCULATION_PUMP_GPIO,
        pins::FILL_PUMP_GPIO,
        pins::LORA_POWER_GPIO,
    ];

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        // Relays and radio start de-energised.
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

/// Drive an output pin. `Err` carries the ESP-IDF code.
#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: gpio_set_level writes to an output pin configured in
    // init_gpio_outputs(). Cycle thread only.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    let level = usize::try_from(pin)
        .ok()
        .and_then(|i| SIM_LEVELS.get(i))
        .ok_or(-1)?;
    level.store(high, Ordering::Release);
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

static ISR_ARMED: AtomicBool = AtomicBool::new(false);

#[cfg(target_os = "espidf")]
unsafe extern "C" fn high_float_isr(_arg: *mut core::ffi::c_void) {
    crate::safety::high_water_isr_handler();
}

/// Install the GPIO ISR service and register the rising-edge handler on the
/// high-water float. Calling it again once armed is a no-op.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    if ISR_ARMED.load(Ordering::Acquire) {
        return Ok(());
    }
    // SAFETY: gpio_install_isr_service tolerates a second install
    // (ESP_ERR_INVALID_STATE). The handler only stores to an atomic.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_set_intr_type(pins::HIGH_FLOAT_GPIO, gpio_int_type_t_GPIO_INTR_POSEDGE);
        if ret != ESP_OK {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        let ret = gpio_isr_handler_add(
            pins::HIGH_FLOAT_GPIO,
            Some(high_float_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(pins::HIGH_FLOAT_GPIO);
    }
    ISR_ARMED.store(true, Ordering::Release);
    info!("hw_init: high-water float interrupt armed (GPIO{})", pins::HIGH_FLOAT_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    if !ISR_ARMED.swap(true, Ordering::AcqRel) {
        info!("hw_init(sim): high-water float interrupt armed");
    }
    Ok(())
}
