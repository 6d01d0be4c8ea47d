//! Control service — the hexagonal core.
//!
//! [`ControlService`] owns the FSM and its cycle context and exposes a
//! hardware-agnostic API. All I/O flows through port traits injected at
//! call sites, making the whole engage/disengage pipeline testable with
//! mock adapters.
//!
//! ```text
//!  SeverityPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                   │     ControlService      │
//!  CommandLink ◀────│  FSM · pulse dispatch   │
//!                   └────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{info, warn};

use crate::config::SystemConfig;
use crate::fsm::context::{CycleContext, MotorPulse};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::wire::Command;

use super::events::AppEvent;
use super::ports::{Clock, CommandLink, EventSink, SeverityPort};

/// Granularity of the interruptible end-of-cycle sleep. The dwell itself
/// is not sliced — cancellation lands between cycles, not mid-pulse.
const STOP_POLL: Duration = Duration::from_millis(250);

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

/// Orchestrates one severity-driven actuator over one hub link.
pub struct ControlService {
    fsm: Fsm,
    ctx: CycleContext,
    cycle_count: u64,
}

impl ControlService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let ctx = CycleContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Self {
            fsm,
            ctx,
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in its initial phase (Idle; each run forgets any
    /// prior engagement).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full sampling cycle: drain hub output → sample → FSM →
    /// pulse dispatch → events.
    ///
    /// Transport failures propagate — the loop is fail-stop on the link.
    pub fn tick(
        &mut self,
        severity: &mut impl SeverityPort,
        link: &mut impl CommandLink,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> crate::Result<()> {
        self.cycle_count += 1;
        let prev_state = self.fsm.current_state();

        // 1. Drain passthrough output buffered since the last cycle.
        while let Some(payload) = link.poll_output() {
            sink.emit(&AppEvent::HubOutput(payload));
        }

        // 2. Sample the severity score.
        self.ctx.score = severity.sample();

        // 3. FSM cycle (pure hysteresis logic).
        self.fsm.tick(&mut self.ctx);
        sink.emit(&AppEvent::Sampled {
            score: self.ctx.score,
            streak: self.ctx.below_streak,
        });

        // 4. Dispatch the pulse the transition requested, if any.
        if let Some(pulse) = self.ctx.pulse.take() {
            self.apply_pulse(pulse, link, clock, sink)?;
        }

        // 5. Surface the phase change.
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }

        Ok(())
    }

    /// Sampling loop: tick, then sleep out the remainder of the period,
    /// checking the stop flag between slices. Returns on stop request or
    /// on the first transport error.
    pub fn run(
        &mut self,
        severity: &mut impl SeverityPort,
        link: &mut impl CommandLink,
        clock: &impl Clock,
        sink: &mut impl EventSink,
        stop: &AtomicBool,
    ) -> crate::Result<()> {
        let interval = Duration::from_secs(self.ctx.config.sample_interval_secs);

        while !stop.load(Ordering::SeqCst) {
            self.tick(severity, link, clock, sink)?;

            let mut waited = Duration::ZERO;
            while waited < interval && !stop.load(Ordering::SeqCst) {
                let slice = STOP_POLL.min(interval - waited);
                clock.sleep(slice);
                waited += slice;
            }
        }

        info!("stop requested, leaving sampling loop");
        self.shutdown(link);
        Ok(())
    }

    /// One best-effort disconnect. Not retried; failures on the shutdown
    /// path are logged and dropped. The motor is not restored to STOP on
    /// exit — actuation is left to the hub runtime.
    pub fn shutdown(&self, link: &mut impl CommandLink) {
        match link.disconnect() {
            Ok(()) => info!("hub link closed"),
            Err(e) => warn!("disconnect failed ({e}), exiting anyway"),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current controller phase.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Consecutive sub-threshold samples observed so far.
    pub fn below_streak(&self) -> u32 {
        self.ctx.below_streak
    }

    /// Total sampling cycles executed since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    // ── Internal ──────────────────────────────────────────────

    /// Deliver one pulse: command, fixed dwell, STOP. Completion is
    /// timing-based (no device acknowledgment), so the dwell must cover
    /// the actuation time.
    fn apply_pulse(
        &self,
        pulse: MotorPulse,
        link: &mut impl CommandLink,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> crate::Result<()> {
        link.send(pulse.command)?;
        clock.sleep(Duration::from_secs(self.ctx.config.dwell_secs));
        link.send(Command::Stop)?;

        sink.emit(&AppEvent::PulseApplied {
            command: pulse.command,
        });
        Ok(())
    }
}
