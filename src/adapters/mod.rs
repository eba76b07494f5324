//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements       | Connects to                   |
//! |-------------|------------------|-------------------------------|
//! | `analog`    | VoltageSource    | ESP32 ADC1 oneshot + cali     |
//! | `hardware`  | SensorPort       | ADC channels, float switches  |
//! |             | ActuatorPort     | Pump relays                   |
//! | `lora`      | TelemetryLink    | REYAX RYLR896 on UART2        |
//! | `log_sink`  | EventSink        | Serial log output             |
//! | `nvs`       | ConfigPort       | NVS / in-memory store         |
//! | `rtc_state` | CycleStateStore  | RTC slow memory               |
//! | `time`      | Clock            | ESP32 system timer            |
//!
//! Sleep and wake sources are in [`crate::power`].

pub mod analog;
pub mod hardware;
pub mod log_sink;
pub mod lora;
pub mod nvs;
pub mod rtc_state;
pub mod time;
