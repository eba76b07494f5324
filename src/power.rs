//! Wake-reason detection and deep-sleep entry.
//!
//! - **`target_os = "espidf"`** — `esp_reset_reason()` and
//!   `esp_sleep_get_wakeup_cause()` classify the boot; the timer and the
//!   EXT0 pin wake are armed through `esp_sleep_enable_*` before
//!   `esp_deep_sleep_start()`.
//! - **`not(target_os = "espidf")`** — the wake reason is injected and the
//!   armed sources are recorded for inspection.

use log::info;
use serde::Serialize;

use crate::app::ports::SleepPort;

/// Why this wake cycle started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WakeReason {
    /// Power applied or brown-out: RTC memory is gone.
    PowerOn,
    Timer,
    /// EXT0 wake from a float switch.
    FloatSwitch,
    Other,
}

impl WakeReason {
    /// RTC slow memory did not survive.
    pub fn is_cold(self) -> bool {
        self == Self::PowerOn
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PinLevel {
    Low = 0,
    High = 1,
}

impl PinLevel {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

/// Wake sources to arm before sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SleepPlan {
    pub timer_secs: u32,
    /// Early wake when this GPIO reaches the level.
    pub pin_wake: Option<(i32, PinLevel)>,
}

impl SleepPlan {
    /// Arm every source in the plan, then sleep.
    pub fn execute(&self, port: &mut impl SleepPort) -> ! {
        port.arm_timer_wake(self.timer_secs);
        if let Some((gpio, level)) = self.pin_wake {
            port.arm_pin_wake(gpio, level);
        }
        info!("Deep sleep for {}s (pin wake: {:?})", self.timer_secs, self.pin_wake);
        port.enter_deep_sleep()
    }
}

// ---------------------------------------------------------------------------
// PowerManager
// ---------------------------------------------------------------------------

pub struct PowerManager {
    #[cfg(not(target_os = "espidf"))]
    sim_wake: WakeReason,
    #[cfg(not(target_os = "espidf"))]
    pub armed_timer_secs: Option<u32>,
    #[cfg(not(target_os = "espidf"))]
    pub armed_pin: Option<(i32, PinLevel)>,
}

#[cfg(target_os = "espidf")]
impl PowerManager {
    pub fn new() -> Self {
        Self {}
    }

    pub fn determine_wake_reason(&self) -> WakeReason {
        use esp_idf_svc::sys;

        let reset = unsafe { sys::esp_reset_reason() };
        if reset == sys::esp_reset_reason_t_ESP_RST_POWERON
            || reset == sys::esp_reset_reason_t_ESP_RST_BROWNOUT
        {
            return WakeReason::PowerOn;
        }
        match unsafe { sys::esp_sleep_get_wakeup_cause() } {
            sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeReason::Timer,
            sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0 => WakeReason::FloatSwitch,
            _ => WakeReason::Other,
        }
    }
}

#[cfg(target_os = "espidf")]
impl SleepPort for PowerManager {
    fn arm_timer_wake(&mut self, secs: u32) {
        let ret = unsafe { esp_idf_svc::sys::esp_sleep_enable_timer_wakeup(u64::from(secs) * 1_000_000) };
        if ret != esp_idf_svc::sys::ESP_OK {
            log::error!("timer wake arm failed ({})", ret);
        }
    }

    fn arm_pin_wake(&mut self, gpio: i32, level: PinLevel) {
        let ret = unsafe { esp_idf_svc::sys::esp_sleep_enable_ext0_wakeup(gpio, level as i32) };
        if ret != esp_idf_svc::sys::ESP_OK {
            log::error!("EXT0 wake arm on GPIO{} failed ({})", gpio, ret);
        }
    }

    fn enter_deep_sleep(&mut self) -> ! {
        unsafe { esp_idf_svc::sys::esp_deep_sleep_start() }
    }
}

#[cfg(not(target_os = "espidf"))]
impl PowerManager {
    pub fn new() -> Self {
        Self::with_wake_reason(WakeReason::PowerOn)
    }

    pub fn with_wake_reason(sim_wake: WakeReason) -> Self {
        Self {
            sim_wake,
            armed_timer_secs: None,
            armed_pin: None,
        }
    }

    pub fn determine_wake_reason(&self) -> WakeReason {
        self.sim_wake
    }
}

#[cfg(not(target_os = "espidf"))]
impl SleepPort for PowerManager {
    fn arm_timer_wake(&mut self, secs: u32) {
        self.armed_timer_secs = Some(secs);
    }

    fn arm_pin_wake(&mut self, gpio: i32, level: PinLevel) {
        self.armed_pin = Some((gpio, level));
    }

    fn enter_deep_sleep(&mut self) -> ! {
        info!(
            "[sim] deep sleep: timer={:?} pin={:?}",
            self.armed_timer_secs, self.armed_pin
        );
        std::process::exit(0)
    }
}

impl Default for PowerManager {
    fn default() -> Self {
        Self::new()
    }
}
