//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger. A telemetry or UI adapter would implement the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | phase={state:?}");
            }
            AppEvent::Sampled { score, streak } => {
                info!("SAMPLE | score={score} streak={streak}");
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {from:?} -> {to:?}");
            }
            AppEvent::PulseApplied { command } => {
                info!("PULSE | {command:?} + dwell + Stop delivered");
            }
            AppEvent::HubOutput(payload) => {
                info!("HUB | {}", String::from_utf8_lossy(payload).trim_end());
            }
        }
    }
}
