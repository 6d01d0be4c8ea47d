//! Shared mutable context threaded through every state handler.
//!
//! `CycleContext` is the single struct that state handlers read from and
//! write to: the latest severity sample, the sub-threshold streak, the
//! per-cycle actuation request, and the configuration. There is no other
//! controller state — everything observable lives here or in the engine's
//! current-state pointer.

use crate::config::SystemConfig;
use crate::severity::SeverityScore;
use crate::wire::Command;

// ---------------------------------------------------------------------------
// Actuation request (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// A one-shot motor actuation requested by a state transition.
///
/// The control service dispatches it as `command` → dwell → STOP and
/// discards it; at most one pulse per cycle by construction (only enter
/// and exit handlers write it, and a cycle takes at most one transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorPulse {
    pub command: Command,
}

// ---------------------------------------------------------------------------
// CycleContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct CycleContext {
    /// Severity sampled at the top of the current cycle.
    pub score: SeverityScore,
    /// Consecutive samples below the engage threshold. Increments on every
    /// sub-threshold cycle (even while idle, where it has no effect) and
    /// resets on engage, on disengage, and on any over-threshold sample
    /// while engaged.
    pub below_streak: u32,
    /// Actuation requested by this cycle's transition, if any.
    pub pulse: Option<MotorPulse>,
    /// System configuration (tunable parameters).
    pub config: SystemConfig,
}

impl CycleContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            score: SeverityScore::QUIET,
            below_streak: 0,
            pulse: None,
            config,
        }
    }

    /// Whether the current sample qualifies for engagement.
    pub fn over_threshold(&self) -> bool {
        self.score.value() >= self.config.engage_threshold
    }
}
