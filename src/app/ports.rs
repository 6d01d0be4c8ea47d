//! Port traits — the hexagonal boundary between domain logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (the severity file reader, the hub link, clocks, event
//! sinks) implement these traits. The service consumes them via generics,
//! so the domain core never touches a file, a radio, or a wall clock
//! directly.

use std::time::Duration;

use crate::error::TransportError;
use crate::severity::SeverityScore;
use crate::wire::Command;

// ───────────────────────────────────────────────────────────────
// Severity port (driven adapter: input files → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the controller calls this once per sampling cycle.
///
/// Infallible by contract — implementations degrade every input failure
/// to [`SeverityScore::QUIET`] and log it, so a missing or malformed
/// source file can never stop the loop.
pub trait SeverityPort {
    fn sample(&mut self) -> SeverityScore;
}

// ───────────────────────────────────────────────────────────────
// Command link port (domain → hub session)
// ───────────────────────────────────────────────────────────────

/// Write-side port over the active hub session.
///
/// `send` must only be called while connected; a failed or unacknowledged
/// write returns a [`TransportError`] that the controller deliberately
/// does not catch — transport failure ends the run.
pub trait CommandLink {
    /// Frame and deliver one command, with delivery confirmation.
    fn send(&mut self, cmd: Command) -> Result<(), TransportError>;

    /// Drain one buffered passthrough payload from the hub's output
    /// stream, if any. Non-command traffic; the controller only logs it.
    fn poll_output(&mut self) -> Option<Vec<u8>>;

    /// Whether a session is currently established.
    fn is_connected(&self) -> bool;

    /// Tear the session down. Called once, best-effort, at shutdown.
    fn disconnect(&mut self) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (domain → time)
// ───────────────────────────────────────────────────────────────

/// Suspension points (dwell, sampling sleep, poll backoff) go through
/// this trait so tests run instantly and an acknowledgment-driven dwell
/// could replace the fixed sleep without touching the state machine.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
