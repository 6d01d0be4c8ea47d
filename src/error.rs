//! Unified error types.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they pass through the cycle machinery without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The wireless link failed; the control loop does not recover from
    /// these — they end the run.
    Transport(TransportError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Startup wiring failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failures of the host↔hub link.
///
/// Input and protocol errors are recovered where they occur; transport
/// errors are the fail-stop category and propagate out of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No active session; a write or disconnect was attempted anyway.
    NotConnected,
    /// The scan finished without finding the named hub.
    DeviceNotFound,
    /// The hub's GATT table has no command characteristic.
    CharacteristicMissing,
    /// A write failed or was not acknowledged.
    WriteFailed,
    /// The link dropped while a session was active.
    Disconnected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::DeviceNotFound => write!(f, "hub not found"),
            Self::CharacteristicMissing => write!(f, "command characteristic missing"),
            Self::WriteFailed => write!(f, "write failed or unacknowledged"),
            Self::Disconnected => write!(f, "link lost"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
