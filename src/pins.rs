//! GPIO / peripheral pin assignments for the ESP32 DevKit V1 field board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

use crate::power::PinLevel;

// ---------------------------------------------------------------------------
// Analog inputs (ADC1 only — ADC2 is unusable while the radio UART is busy)
// ---------------------------------------------------------------------------

/// Battery voltage through the R1/R2 divider. ADC1 channel 6.
pub const BATTERY_ADC_GPIO: i32 = 34;
/// pH probe amplifier output. ADC1 channel 7.
pub const PH_ADC_GPIO: i32 = 35;
/// Milone eTape divider. ADC1 channel 4.
pub const WATER_ADC_GPIO: i32 = 32;
/// Analog temperature probe. ADC1 channel 5.
pub const TEMP_ADC_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Float switches (RTC-capable pins so they can wake the chip)
// ---------------------------------------------------------------------------

/// High-water float. HIGH = water above the overflow mark.
pub const HIGH_FLOAT_GPIO: i32 = 27;
/// Low-water float. HIGH = water below the low mark.
pub const LOW_FLOAT_GPIO: i32 = 26;
/// Level both floats read while tripped.
pub const FLOAT_ACTIVE_LEVEL: PinLevel = PinLevel::High;

// ---------------------------------------------------------------------------
// Pump relays (active HIGH)
// ---------------------------------------------------------------------------

pub const CIRCULATION_PUMP_GPIO: i32 = 18;
pub const FILL_PUMP_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// REYAX RYLR896 radio on UART2
// ---------------------------------------------------------------------------

/// Drives the transistor that powers the radio module.
pub const LORA_POWER_GPIO: i32 = 15;
pub const LORA_UART_NUM: i32 = 2;
pub const LORA_UART_TX_GPIO: i32 = 17;
pub const LORA_UART_RX_GPIO: i32 = 16;
pub const LORA_BAUD_RATE: u32 = 115_200;

// ---------------------------------------------------------------------------
// Service button (active-low, external pull-up)
// ---------------------------------------------------------------------------

/// Held at wake to clear the auto-fill lockout.
pub const SERVICE_BUTTON_GPIO: i32 = 4;
