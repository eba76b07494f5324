//! Wire codec for telemetry messages (schema v1).
//!
//! ```text
//! <transmitter>%<reading>%<value>%<alarm_code>%<email_interval>%<max_emails>[%<stop_reason>]
//! ```
//!
//! The seventh field appears only on `Auto-fill` messages. Values are
//! fixed-point text: two decimals for `Voltage`, one for everything else.

use core::fmt::Write;

use crate::alarm::AlarmClassification;
use crate::error::CommsError;
use crate::sensors::ReadingName;

/// Field separator.
pub const DELIMITER: char = '%';

/// Largest payload the radio accepts in one `AT+SEND`.
pub const MAX_PAYLOAD_LEN: usize = 240;

pub type Payload = heapless::String<MAX_PAYLOAD_LEN>;

// ---------------------------------------------------------------------------
// Stop reason
// ---------------------------------------------------------------------------

/// Why an auto-fill run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StopReason {
    /// Stop volume reached.
    Fill,
    /// Cut-off timer expired.
    Timer,
    /// High-water float tripped.
    FloatSwitch,
}

impl StopReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fill => "Fill",
            Self::Timer => "TIMER",
            Self::FloatSwitch => "FL-SW",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        [Self::Fill, Self::Timer, Self::FloatSwitch]
            .into_iter()
            .find(|r| r.as_str() == s)
    }
}

impl core::fmt::Display for StopReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Fixed-point text for `value` at the precision `name` uses on the wire.
pub fn format_value(name: ReadingName, value: f32) -> heapless::String<48> {
    let mut out = heapless::String::new();
    if write!(out, "{:.*}", name.decimals(), value).is_err() {
        // Only |value| beyond ~1e40 overflows, which f32 cannot hold.
        out.clear();
    }
    out
}

/// Serialize one reading into the v1 field sequence.
pub fn encode(
    transmitter: &str,
    name: ReadingName,
    value: f32,
    classification: &AlarmClassification,
    stop_reason: Option<StopReason>,
) -> Result<Payload, CommsError> {
    if transmitter.contains(DELIMITER) {
        return Err(CommsError::InvalidField);
    }

    let mut out = Payload::new();
    write!(
        out,
        "{t}{d}{n}{d}{v}{d}{c}{d}{i}{d}{m}",
        t = transmitter,
        n = name.as_str(),
        v = format_value(name, value),
        c = classification.alarm_code,
        i = classification.email_interval,
        m = classification.max_emails,
        d = DELIMITER,
    )
    .map_err(|_| CommsError::PayloadTooLong)?;

    if let Some(reason) = stop_reason {
        write!(out, "{}{}", DELIMITER, reason).map_err(|_| CommsError::PayloadTooLong)?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Parse (base-station side; used by tests and the fuzz target)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedMessage<'a> {
    pub transmitter: &'a str,
    pub name: ReadingName,
    pub value: f32,
    pub alarm_code: u16,
    pub email_interval: u16,
    pub max_emails: u16,
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer than six or more than seven fields.
    FieldCount,
    EmptyTransmitter,
    UnknownReading,
    BadValue,
    BadInteger,
    UnknownStopReason,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FieldCount => write!(f, "wrong field count"),
            Self::EmptyTransmitter => write!(f, "empty transmitter name"),
            Self::UnknownReading => write!(f, "unknown reading name"),
            Self::BadValue => write!(f, "value is not a number"),
            Self::BadInteger => write!(f, "alarm field is not an integer"),
            Self::UnknownStopReason => write!(f, "unknown stop reason"),
        }
    }
}

/// Split a v1 message back into its fields.
pub fn parse(message: &str) -> Result<DecodedMessage<'_>, ParseError> {
    let mut fields: heapless::Vec<&str, 7> = heapless::Vec::new();
    for field in message.split(DELIMITER) {
        fields.push(field).map_err(|_| ParseError::FieldCount)?;
    }
    if fields.len() < 6 {
        return Err(ParseError::FieldCount);
    }

    let transmitter = fields[0];
    if transmitter.is_empty() {
        return Err(ParseError::EmptyTransmitter);
    }
    let name = ReadingName::from_wire(fields[1]).ok_or(ParseError::UnknownReading)?;
    let value: f32 = fields[2].parse().map_err(|_| ParseError::BadValue)?;
    let int = |s: &str| s.parse::<u16>().map_err(|_| ParseError::BadInteger);
    let stop_reason = match fields.get(6) {
        Some(token) => Some(StopReason::from_wire(token).ok_or(ParseError::UnknownStopReason)?),
        None => None,
    };

    Ok(DecodedMessage {
        transmitter,
        name,
        value,
        alarm_code: int(fields[3])?,
        email_interval: int(fields[4])?,
        max_emails: int(fields[5])?,
        stop_reason,
    })
}
