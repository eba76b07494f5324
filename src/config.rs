//! System configuration parameters
//!
//! All tunable parameters for one field unit. Defaults match the deployed
//! Tower Garden transmitter; values can be overridden from NVS.

use serde::{Deserialize, Serialize};

use crate::alarm::AlarmThresholds;
use crate::sensors::battery::BatteryCalibration;
use crate::sensors::ph::PhCalibration;
use crate::sensors::temperature::TemperatureCalibration;
use crate::sensors::water_volume::WaterCalibration;

/// Longest transmitter name the wire format carries.
pub const MAX_NAME_LEN: usize = 16;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// First field of every telemetry message.
    pub transmitter_name: heapless::String<MAX_NAME_LEN>,

    // --- Radio ---
    /// Must match every unit on the same base station.
    pub lora_network_id: u8,
    /// This unit's address (2201–2240).
    pub lora_node_address: u16,
    /// Recipient of every message.
    pub lora_base_station_address: u16,
    /// Re-write network id and address into the radio's EEPROM at boot.
    pub lora_setup_required: bool,
    /// Hold the radio powered this long after the last send.
    pub radio_settle_ms: u32,

    // --- Cycle timing ---
    /// Deep-sleep duration between wake cycles (seconds)
    pub sleep_secs: u32,
    /// Circulation pump run time per wake (seconds)
    pub circulation_pump_secs: u32,

    // --- Auto-fill ---
    /// Start refilling when volume is at or below this (gallons)
    pub refill_start_gallons: f32,
    /// Stop refilling once volume reaches this (gallons)
    pub refill_stop_gallons: f32,
    /// Hard cap on fill pump run time (seconds)
    pub auto_fill_cutoff_secs: u32,
    /// Auto-fill poll interval (milliseconds)
    pub auto_fill_poll_ms: u32,
    /// Fill pump delivery rate, used to estimate the filled volume
    pub fill_pump_gallons_per_minute: f32,

    // --- Calibration ---
    pub battery: BatteryCalibration,
    pub ph: PhCalibration,
    pub water: WaterCalibration,
    pub temperature: TemperatureCalibration,

    // --- Alarms ---
    pub thresholds: AlarmThresholds,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut transmitter_name = heapless::String::new();
        // Fits MAX_NAME_LEN.
        let _ = transmitter_name.push_str("Garden");

        Self {
            transmitter_name,

            // Radio
            lora_network_id: 14,
            lora_node_address: 2205,
            lora_base_station_address: 2200,
            lora_setup_required: false,
            radio_settle_ms: 2000,

            // Timing
            sleep_secs: 300, // 5 minutes
            circulation_pump_secs: 60,

            // Auto-fill
            refill_start_gallons: 15.0,
            refill_stop_gallons: 17.0,
            auto_fill_cutoff_secs: 180, // 3 minutes
            auto_fill_poll_ms: 1000,
            fill_pump_gallons_per_minute: 1.2,

            // Calibration
            battery: BatteryCalibration::default(),
            ph: PhCalibration::default(),
            water: WaterCalibration::default(),
            temperature: TemperatureCalibration::default(),

            thresholds: AlarmThresholds::default(),
        }
    }
}

/// Finite and above zero; NaN fails.
fn positive(x: f32) -> bool {
    x.is_finite() && x > 0.0
}

impl SystemConfig {
    /// Range-check every field. Run at startup and before persisting.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.transmitter_name.is_empty() {
            return Err("transmitter_name must not be empty");
        }
        if self.transmitter_name.contains('%') {
            return Err("transmitter_name must not contain the field delimiter");
        }
        if !(2201..=2240).contains(&self.lora_node_address) {
            return Err("lora_node_address must be 2201–2240");
        }
        if self.lora_node_address == self.lora_base_station_address {
            return Err("lora_node_address must differ from the base station");
        }
        if !(10..=86_400).contains(&self.sleep_secs) {
            return Err("sleep_secs must be 10–86400");
        }
        if self.circulation_pump_secs > 3600 {
            return Err("circulation_pump_secs must be at most 3600");
        }
        if !(self.refill_start_gallons.is_finite() && self.refill_stop_gallons.is_finite()) {
            return Err("refill volumes must be finite");
        }
        if self.refill_start_gallons >= self.refill_stop_gallons {
            return Err("refill_start_gallons must be below refill_stop_gallons");
        }
        if !(1..=1800).contains(&self.auto_fill_cutoff_secs) {
            return Err("auto_fill_cutoff_secs must be 1–1800");
        }
        if self.auto_fill_poll_ms == 0 {
            return Err("auto_fill_poll_ms must be non-zero");
        }
        if u64::from(self.auto_fill_poll_ms) > u64::from(self.auto_fill_cutoff_secs) * 1000 {
            return Err("auto_fill_poll_ms must not exceed the cut-off");
        }
        if !positive(self.fill_pump_gallons_per_minute) {
            return Err("fill_pump_gallons_per_minute must be positive");
        }
        if !(positive(self.battery.r2_ohms) && positive(self.water.volts_per_gallon)) {
            return Err("calibration divisors must be positive");
        }
        if !positive(self.temperature.mv_per_c) {
            return Err("temperature mv_per_c must be positive");
        }
        self.thresholds.validate()
    }
}
