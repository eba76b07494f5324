//! Towerlink Firmware — Main Entry Point
//!
//! One process lifetime is one wake cycle: boot, run the cycle, deep sleep.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   ReyaxLora        RtcStateStore  NvsAdapter  │
//! │  (Sensor+Actuator) (TelemetryLink)  (CycleState)   (Config)    │
//! │  SystemClock       LogEventSink     PowerManager               │
//! │  (Clock)           (EventSink)      (SleepPort)                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        WakeCycleController (pure logic)                │    │
//! │  │  Floats · Alarms · Telemetry · Auto-fill FSM           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  High-water float ISR ──▶ HIGH_WATER_CANCEL (atomic)           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use towerlink::adapters::hardware::HardwareAdapter;
use towerlink::adapters::log_sink::LogEventSink;
use towerlink::adapters::lora::{ReyaxLora, UartTransport};
use towerlink::adapters::nvs::NvsAdapter;
use towerlink::adapters::rtc_state::RtcStateStore;
use towerlink::adapters::time::SystemClock;
use towerlink::app::ports::{ConfigError, ConfigPort, CycleStateStore};
use towerlink::app::service::WakeCycleController;
use towerlink::config::SystemConfig;
use towerlink::drivers::button::ServiceButton;
use towerlink::drivers::gpio::GpioPin;
use towerlink::drivers::hw_init::{self, HwInitError};
use towerlink::error::Error;
use towerlink::pins;
use towerlink::power::{PowerManager, SleepPlan, WakeReason};
use towerlink::safety::HIGH_WATER_CANCEL;

fn load_config() -> SystemConfig {
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            return SystemConfig::default();
        }
    };
    match nvs.load() {
        Ok(cfg) => cfg,
        Err(ConfigError::ValidationFailed(msg)) => {
            error!("{}; using defaults", Error::Config(msg));
            SystemConfig::default()
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Towerlink v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config + wake reason ───────────────────────────────
    let config = load_config();
    let mut power = PowerManager::new();
    let wake = power.determine_wake_reason();
    match wake {
        WakeReason::PowerOn => info!("Boot: power-on (RTC state reset)"),
        WakeReason::FloatSwitch => info!("Boot: float-switch wake"),
        other => info!("Boot: {:?}", other),
    }

    // ── 3. Peripherals ────────────────────────────────────────
    // ADC faults fall through: the cycle reports them as a Fault reading.
    match hw_init::init_peripherals() {
        Ok(()) => {}
        Err(e @ (HwInitError::AdcInitFailed(_) | HwInitError::CalibrationFailed(_))) => {
            error!("{} ({})", Error::Init("ADC1"), e);
        }
        Err(e) => {
            error!("hw_init: {}, sleeping without running the cycle", e);
            SleepPlan {
                timer_secs: config.sleep_secs,
                pin_wake: None,
            }
            .execute(&mut power);
        }
    }

    let mut clock = SystemClock::new();
    let mut store = RtcStateStore::new();

    // ── 4. Service button clears the auto-fill lockout ────────
    let mut button = ServiceButton::new(GpioPin::new(pins::SERVICE_BUTTON_GPIO));
    if button.is_held(&mut clock) {
        let mut state = store.load(wake);
        if state.auto_fill_timed_out {
            state.clear_auto_fill_lockout();
            match store.store(&state) {
                Ok(()) => info!("Service button: auto-fill lockout cleared"),
                Err(e) => error!("Service button: lockout not cleared ({})", e),
            }
        }
    }

    // ── 5. Adapters ───────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let uart = UartDriver::new(
        peripherals.uart2,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(pins::LORA_BAUD_RATE)),
    )?;
    info!(
        "LoRa: UART{} tx=GPIO{} rx=GPIO{} @ {} baud",
        pins::LORA_UART_NUM,
        pins::LORA_UART_TX_GPIO,
        pins::LORA_UART_RX_GPIO,
        pins::LORA_BAUD_RATE
    );
    let mut radio = ReyaxLora::new(
        UartTransport::new(uart),
        GpioPin::new(pins::LORA_POWER_GPIO),
        SystemClock::new(),
        &config,
    );
    let mut hw = HardwareAdapter::from_config(&config);
    let mut sink = LogEventSink::new();

    // ── 6. Wake cycle ─────────────────────────────────────────
    let controller = WakeCycleController::new(&config, &HIGH_WATER_CANCEL);
    let report = controller.run_cycle(wake, &mut hw, &mut radio, &mut store, &mut clock, &mut sink);

    // ── 7. Sleep ──────────────────────────────────────────────
    report.sleep.execute(&mut power)
}
