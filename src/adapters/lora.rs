//! REYAX RYLR896 LoRa module over UART AT commands.
//!
//! ## Framing
//!
//! Every command is ASCII terminated by `\r\n`; the module answers one line.
//!
//! | Command                         | Reply           |
//! |---------------------------------|-----------------|
//! | `AT`                            | `+OK`           |
//! | `AT+NETWORKID=<id>`             | `+OK`           |
//! | `AT+ADDRESS=<node>`             | `+OK`           |
//! | `AT+SEND=<addr>,<len>,<data>`   | `+OK` / `+ERR=n`|
//!
//! `+ERR=n` or silence is a transport fault for that one message. Lines the
//! module prints on its own (`+READY` after power-up, `+RCV=` for traffic
//! it overhears) are skipped while waiting for the reply.
//!
//! ## Power
//!
//! The module hangs off a transistor on [`pins::LORA_POWER_GPIO`](crate::pins::LORA_POWER_GPIO).
//! It is powered lazily for the first message of a cycle and held on for
//! the configured settle time after the last one so the frame leaves the
//! air before the supply drops.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::app::ports::TelemetryLink;
use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::telemetry::MAX_PAYLOAD_LEN;

/// Module boot time after power is applied.
pub const POWER_UP_MS: u32 = 500;
/// `AT+SEND` answers only after the frame is queued.
pub const SEND_REPLY_DELAY_MS: u32 = 500;
pub const REPLY_TIMEOUT_MS: u32 = 1_000;
/// Unsolicited lines tolerated ahead of one reply.
pub const MAX_UNSOLICITED_LINES: usize = 4;

/// `AT+SEND=65535,240,` plus payload plus `\r\n`.
pub const MAX_COMMAND_LEN: usize = MAX_PAYLOAD_LEN + 24;

pub type Command = heapless::String<MAX_COMMAND_LEN>;

/// Byte pipe to the module.
pub trait AtTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), CommsError>;

    /// Read one line (without the terminator) into `buf`. Returns the line
    /// length, `0` when nothing arrived within `timeout_ms`.
    fn read_line(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, CommsError>;
}

/// Build the `AT+SEND` command for one payload.
pub fn at_send_command(address: u16, payload: &str) -> Result<Command, CommsError> {
    use core::fmt::Write;

    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CommsError::PayloadTooLong);
    }
    let mut cmd = Command::new();
    write!(cmd, "AT+SEND={},{},{}\r\n", address, payload.len(), payload)
        .map_err(|_| CommsError::PayloadTooLong)?;
    Ok(cmd)
}

/// One line read back from the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    Ok,
    /// `+ERR=<code>`.
    Error(&'a str),
    /// Nothing arrived before the timeout.
    Silent,
    /// Not an answer to the last command.
    Unsolicited(&'a str),
}

pub fn parse_reply(line: &str) -> Reply<'_> {
    let line = line.trim();
    if line == "+OK" {
        Reply::Ok
    } else if line.is_empty() {
        Reply::Silent
    } else if let Some(code) = line.strip_prefix("+ERR=") {
        Reply::Error(code)
    } else {
        Reply::Unsolicited(line)
    }
}

pub struct ReyaxLora<T, P, D> {
    transport: T,
    power_pin: P,
    delay: D,
    network_id: u8,
    node_address: u16,
    base_station_address: u16,
    setup_required: bool,
    settle_ms: u32,
    powered: bool,
}

impl<T: AtTransport, P: OutputPin, D: DelayNs> ReyaxLora<T, P, D> {
    pub fn new(transport: T, power_pin: P, delay: D, config: &SystemConfig) -> Self {
        Self {
            transport,
            power_pin,
            delay,
            network_id: config.lora_network_id,
            node_address: config.lora_node_address,
            base_station_address: config.lora_base_station_address,
            setup_required: config.lora_setup_required,
            settle_ms: config.radio_settle_ms,
            powered: false,
        }
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    fn command(&mut self, cmd: &str, reply_delay_ms: u32) -> Result<(), CommsError> {
        debug!("LoRa > {}", cmd.trim_end());
        self.transport.write_all(cmd.as_bytes())?;
        if reply_delay_ms > 0 {
            self.delay.delay_ms(reply_delay_ms);
        }
        let mut buf = [0u8; 64];
        for _ in 0..=MAX_UNSOLICITED_LINES {
            let n = self.transport.read_line(&mut buf, REPLY_TIMEOUT_MS)?;
            let Ok(line) = core::str::from_utf8(&buf[..n]) else {
                debug!("LoRa < {} bytes of noise, skipped", n);
                continue;
            };
            debug!("LoRa < {}", line);
            match parse_reply(line) {
                Reply::Ok => return Ok(()),
                Reply::Silent => return Err(CommsError::UartTimeout),
                Reply::Error(code) => {
                    warn!("LoRa: module error {}", code);
                    return Err(CommsError::RadioRejected);
                }
                Reply::Unsolicited(other) => debug!("LoRa: skipping {:?}", other),
            }
        }
        warn!("LoRa: no reply among {} unsolicited lines", MAX_UNSOLICITED_LINES + 1);
        Err(CommsError::RadioRejected)
    }

    /// Write network id and address into the module's EEPROM.
    fn one_time_setup(&mut self) -> Result<(), CommsError> {
        use core::fmt::Write;

        let mut cmd: heapless::String<32> = heapless::String::new();
        write!(cmd, "AT+NETWORKID={}\r\n", self.network_id).map_err(|_| CommsError::PayloadTooLong)?;
        self.command(&cmd, 0)?;

        cmd.clear();
        write!(cmd, "AT+ADDRESS={}\r\n", self.node_address).map_err(|_| CommsError::PayloadTooLong)?;
        self.command(&cmd, 0)?;

        info!(
            "LoRa: provisioned network {} address {}",
            self.network_id, self.node_address
        );
        Ok(())
    }

    fn cut_power(&mut self) {
        if let Err(e) = self.power_pin.set_low() {
            warn!("LoRa: power pin write failed ({:?})", e);
        }
        self.powered = false;
    }
}

impl<T: AtTransport, P: OutputPin, D: DelayNs> TelemetryLink for ReyaxLora<T, P, D> {
    fn power_on(&mut self) -> Result<(), CommsError> {
        if self.powered {
            return Ok(());
        }
        self.power_pin
            .set_high()
            .map_err(|_| CommsError::RadioNotResponding)?;
        self.delay.delay_ms(POWER_UP_MS);

        if self.command("AT\r\n", 0).is_err() {
            self.cut_power();
            return Err(CommsError::RadioNotResponding);
        }
        if self.setup_required {
            if let Err(e) = self.one_time_setup() {
                self.cut_power();
                return Err(e);
            }
        }
        self.powered = true;
        Ok(())
    }

    fn power_off(&mut self) {
        if !self.powered {
            return;
        }
        self.delay.delay_ms(self.settle_ms);
        self.cut_power();
        debug!("LoRa: powered down");
    }

    fn send(&mut self, payload: &str) -> Result<(), CommsError> {
        if !self.powered {
            return Err(CommsError::RadioNotResponding);
        }
        let cmd = at_send_command(self.base_station_address, payload)?;
        self.command(&cmd, SEND_REPLY_DELAY_MS)
    }
}

// ── UART transport (ESP32) ────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct UartTransport {
    uart: esp_idf_hal::uart::UartDriver<'static>,
}

#[cfg(target_os = "espidf")]
impl UartTransport {
    pub fn new(uart: esp_idf_hal::uart::UartDriver<'static>) -> Self {
        Self { uart }
    }
}

#[cfg(target_os = "espidf")]
impl AtTransport for UartTransport {
    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), CommsError> {
        while !bytes.is_empty() {
            let n = self.uart.write(bytes).map_err(|_| CommsError::UartTimeout)?;
            bytes = &bytes[n..];
        }
        Ok(())
    }

    fn read_line(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, CommsError> {
        use esp_idf_hal::delay::TickType;

        let ticks = TickType::new_millis(u64::from(timeout_ms)).ticks();
        let mut len = 0;
        let mut byte = [0u8; 1];
        loop {
            let n = self
                .uart
                .read(&mut byte, ticks)
                .map_err(|_| CommsError::UartTimeout)?;
            if n == 0 || byte[0] == b'\n' {
                break;
            }
            if byte[0] != b'\r' && len < buf.len() {
                buf[len] = byte[0];
                len += 1;
            }
        }
        Ok(len)
    }
}
