//! Fuzz target: `telemetry::parse`
//!
//! Feeds arbitrary text to the base-station side parser. It must never
//! panic, and whatever it accepts must survive a re-encode and parse.
//!
//! cargo fuzz run fuzz_telemetry_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use towerlink::alarm::{AlarmClassification, AlarmLevel};
use towerlink::telemetry::{encode, parse};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(msg) = parse(text) else {
        return;
    };

    assert!(!msg.transmitter.is_empty());
    assert!(!msg.transmitter.contains('%'));

    if !msg.value.is_finite() {
        return;
    }
    let classification = AlarmClassification {
        level: AlarmLevel::Normal,
        alarm_code: msg.alarm_code,
        email_interval: msg.email_interval,
        max_emails: msg.max_emails,
    };
    // Long transmitter names or huge values may not fit one payload.
    if let Ok(again) = encode(msg.transmitter, msg.name, msg.value, &classification, msg.stop_reason) {
        let back = parse(&again).expect("re-encoded message must parse");
        assert_eq!(back.name, msg.name);
        assert_eq!(back.alarm_code, msg.alarm_code);
        assert_eq!(back.stop_reason, msg.stop_reason);
    }
});
