//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one console line per [`CycleEvent`]
//! through the `log` facade (UART on the board). The end-of-cycle report is
//! rendered as a single JSON line so it can be scraped off a serial capture.

use log::{error, info, warn};

use crate::app::events::CycleEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`CycleEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CycleEvent) {
        match event {
            CycleEvent::Started { wake, state } => {
                info!(
                    "WAKE  | reason={:?} | measure_next={} lockout={} high_float={} low_float={}",
                    wake,
                    !state.measure_this_cycle,
                    state.auto_fill_timed_out,
                    state.high_water_alarm_active,
                    state.low_water_alarm_active,
                );
            }
            CycleEvent::BootFault(e) => {
                error!("FAULT | boot aborted: {}", e);
            }
            CycleEvent::WaterIngress => {
                warn!("FLOAT | high-water float active on wake");
            }
            CycleEvent::ReadingSent {
                name,
                value,
                classification,
                delivered,
            } => {
                info!(
                    "READ  | {} = {:.2} | level={:?} code={} | {}",
                    name,
                    value,
                    classification.level,
                    classification.alarm_code,
                    if *delivered { "sent" } else { "NOT SENT" },
                );
            }
            CycleEvent::ReadingFailed { name, error } => {
                warn!("READ  | {} failed: {}", name, error);
            }
            CycleEvent::AutoFillSkipped(reason) => {
                info!("FILL  | skipped: {}", reason);
            }
            CycleEvent::AutoFillFinished(outcome) => {
                info!(
                    "FILL  | stopped by {} after {:.1}s ({} polls) | ~{:.2} gal",
                    outcome.stop_reason, outcome.elapsed_secs, outcome.polls, outcome.filled_volume,
                );
            }
            CycleEvent::Finished(report) => match serde_json::to_string(report) {
                Ok(json) => info!("CYCLE | {}", json),
                Err(e) => warn!("CYCLE | report not serialisable: {}", e),
            },
        }
    }
}
