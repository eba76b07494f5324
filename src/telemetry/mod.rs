//! Telemetry encoder: reading + classification → wire message → radio.
//!
//! The encoder owns field order and numeric precision only. Transport is
//! the [`TelemetryLink`] port's job; a failed send is reported to the
//! caller and never retried.

pub mod codec;

pub use codec::{DecodedMessage, MAX_PAYLOAD_LEN, ParseError, Payload, StopReason, encode, parse};

use log::{debug, warn};

use crate::alarm::{AlarmClassification, AlarmLevel, AlarmThresholds};
use crate::app::ports::TelemetryLink;
use crate::error::CommsError;
use crate::sensors::{Reading, ReadingName};

/// Classification for an auto-fill result. A normal fill reports code 0;
/// a cut-off or float stop raises the configured auto-fill notice.
pub fn classify_stop(reason: StopReason, thresholds: &AlarmThresholds) -> AlarmClassification {
    match reason {
        StopReason::Fill => AlarmClassification::NORMAL,
        StopReason::Timer | StopReason::FloatSwitch => {
            AlarmClassification::raised(AlarmLevel::High, thresholds.auto_fill.high)
        }
    }
}

/// Encodes and sends messages for one transmitter.
pub struct TelemetryEncoder<'a> {
    transmitter: &'a str,
    thresholds: &'a AlarmThresholds,
}

impl<'a> TelemetryEncoder<'a> {
    pub fn new(transmitter: &'a str, thresholds: &'a AlarmThresholds) -> Self {
        Self {
            transmitter,
            thresholds,
        }
    }

    pub fn classify(&self, reading: Reading) -> AlarmClassification {
        self.thresholds.classify(reading.name, reading.value)
    }

    pub fn classify_stop(&self, reason: StopReason) -> AlarmClassification {
        classify_stop(reason, self.thresholds)
    }

    /// Classify `reading` against its threshold and send it.
    /// Returns the classification even when the send fails.
    pub fn send_reading(
        &self,
        link: &mut impl TelemetryLink,
        reading: Reading,
    ) -> (AlarmClassification, Result<(), CommsError>) {
        let classification = self.classify(reading);
        let sent = self.send(link, reading.name, reading.value, &classification, None);
        (classification, sent)
    }

    /// Send an auto-fill result with its stop reason.
    pub fn send_auto_fill(
        &self,
        link: &mut impl TelemetryLink,
        filled_gallons: f32,
        reason: StopReason,
    ) -> (AlarmClassification, Result<(), CommsError>) {
        let classification = self.classify_stop(reason);
        let sent = self.send(
            link,
            ReadingName::AutoFill,
            filled_gallons,
            &classification,
            Some(reason),
        );
        (classification, sent)
    }

    fn send(
        &self,
        link: &mut impl TelemetryLink,
        name: ReadingName,
        value: f32,
        classification: &AlarmClassification,
        stop_reason: Option<StopReason>,
    ) -> Result<(), CommsError> {
        let payload = encode(self.transmitter, name, value, classification, stop_reason)?;
        debug!("TX {}", payload);
        link.send(&payload).inspect_err(|e| {
            warn!("{} not sent: {}", name, e);
        })
    }
}
