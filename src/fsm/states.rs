//! Concrete state handler functions and table builder.
//!
//! The hysteresis is asymmetric on purpose: one qualifying sample engages,
//! but disengaging takes a sustained run of weak samples. That keeps a
//! noisy signal crossing the threshold from chattering the motor.
//!
//! ```text
//!  IDLE ──[score ≥ threshold]──────────────▶ ENGAGED
//!    ▲                                          │
//!    └──[streak of sub-threshold samples]───────┘
//!
//!  enter ENGAGED: FORWARD pulse   ·   exit ENGAGED: REVERSE pulse
//! ```

use log::info;

use super::context::{CycleContext, MotorPulse};
use super::{StateDescriptor, StateId};
use crate::wire::Command;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — Engaged
        StateDescriptor {
            id: StateId::Engaged,
            name: "Engaged",
            on_enter: Some(engaged_enter),
            on_exit: Some(engaged_exit),
            on_update: engaged_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state — shutter open, watching the score
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(_ctx: &mut CycleContext) {
    // No actuation on entry: the initial start lands here, and the reverse
    // pulse for a disengage is issued by engaged_exit.
    info!("IDLE: shutter open, monitoring severity");
}

fn idle_update(ctx: &mut CycleContext) -> Option<StateId> {
    if ctx.over_threshold() {
        return Some(StateId::Engaged);
    }

    // The streak keeps counting while idle; it only matters once engaged.
    ctx.below_streak = ctx.below_streak.saturating_add(1);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ENGAGED state — shutter closed after one qualifying sample
// ═══════════════════════════════════════════════════════════════════════════

fn engaged_enter(ctx: &mut CycleContext) {
    ctx.pulse = Some(MotorPulse {
        command: Command::Forward,
    });
    ctx.below_streak = 0;
    info!(
        "ENGAGED: severity {} at or above {}, closing shutter",
        ctx.score, ctx.config.engage_threshold
    );
}

fn engaged_exit(ctx: &mut CycleContext) {
    ctx.pulse = Some(MotorPulse {
        command: Command::Reverse,
    });
    ctx.below_streak = 0;
    info!("ENGAGED exit: sustained quiet period, reopening shutter");
}

fn engaged_update(ctx: &mut CycleContext) -> Option<StateId> {
    if ctx.over_threshold() {
        // Still hot. No command is re-issued — the shutter is already
        // closed — but the quiet streak starts over.
        ctx.below_streak = 0;
        return None;
    }

    ctx.below_streak = ctx.below_streak.saturating_add(1);
    info!(
        "ENGAGED: severity {} below {}, streak {}/{}",
        ctx.score, ctx.config.engage_threshold, ctx.below_streak, ctx.config.disengage_streak
    );

    if ctx.below_streak >= ctx.config.disengage_streak {
        return Some(StateId::Idle);
    }

    None
}
