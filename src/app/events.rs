//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them — the stock adapter writes
//! log lines.

use crate::fsm::StateId;
use crate::severity::SeverityScore;
use crate::wire::Command;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller started (carries the initial phase).
    Started(StateId),

    /// A sampling cycle completed: the score it saw and the sub-threshold
    /// streak after the cycle's bookkeeping.
    Sampled {
        score: SeverityScore,
        streak: u32,
    },

    /// The controller transitioned between phases.
    StateChanged { from: StateId, to: StateId },

    /// A command/dwell/STOP pulse was delivered to the hub.
    PulseApplied { command: Command },

    /// Passthrough output received from the hub's stream.
    HubOutput(Vec<u8>),
}
