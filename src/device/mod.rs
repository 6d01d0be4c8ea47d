//! Device-side command receiver.
//!
//! A single-threaded cooperative loop:
//!
//! ```text
//! READY ──▶ AWAIT ──▶ DISPATCH ──▶ READY ──▶ …
//!             │            │
//!             │ (no input: │ (bye)
//!             │  10 ms nap)▼
//!             └────── TERMINATED
//! ```
//!
//! READY emits the 3-byte readiness token on the output stream once per
//! cycle — a heartbeat the host may use to detect liveness. AWAIT is a
//! non-blocking poll with a fixed backoff, never a blocking read, so the
//! loop stays responsive within one backoff interval. DISPATCH reads
//! exactly one command frame and drives the motor; an unrecognised token
//! fail-safes to STOP.
//!
//! There is no partial-frame recovery: a frame that never completes
//! parks the loop in DISPATCH indefinitely.

pub mod motor;
pub mod transport;

use std::time::Duration;

use log::{debug, warn};

use crate::app::ports::Clock;
use crate::wire::{Command, COMMAND_LEN, READY_TOKEN};
use motor::{Direction, MotorPort};
use transport::Transport;

/// Duty for FORWARD (drive closed).
pub const FORWARD_DUTY: u8 = 30;
/// Duty for REVERSE (drive open). Higher: reopening works against the
/// shutter's resting bias.
pub const REVERSE_DUTY: u8 = 60;
/// Backoff between input polls.
pub const POLL_BACKOFF: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// Receive-loop phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Signal readiness on the output stream.
    Ready,
    /// Poll for input; nap and re-check when there is none.
    Await,
    /// Collect one 3-byte frame and execute it.
    Dispatch,
    /// Loop exited after a TERMINATE command.
    Terminated,
}

/// The device command receiver.
///
/// Generic over its channel, motor, and clock so the same loop runs on
/// the hub, under the loopback simulation, and in tests.
pub struct CommandReceiver<T: Transport, M: MotorPort, C: Clock> {
    transport: T,
    motor: M,
    clock: C,
    state: ReceiverState,
    frame: [u8; COMMAND_LEN],
    collected: usize,
}

impl<T: Transport, M: MotorPort, C: Clock> CommandReceiver<T, M, C> {
    pub fn new(transport: T, motor: M, clock: C) -> Self {
        Self {
            transport,
            motor,
            clock,
            state: ReceiverState::Ready,
            frame: [0; COMMAND_LEN],
            collected: 0,
        }
    }

    /// Advance the loop by one step and return the resulting phase.
    ///
    /// Exposed separately from [`run`](Self::run) so tests can drive the
    /// loop deterministically.
    pub fn step(&mut self) -> Result<ReceiverState, T::Error> {
        match self.state {
            ReceiverState::Ready => {
                self.transport.write(&READY_TOKEN)?;
                self.transport.flush()?;
                self.state = ReceiverState::Await;
            }

            ReceiverState::Await => {
                if self.transport.available() {
                    self.state = ReceiverState::Dispatch;
                } else {
                    self.clock.sleep(POLL_BACKOFF);
                }
            }

            ReceiverState::Dispatch => {
                let n = self.transport.read(&mut self.frame[self.collected..])?;
                self.collected += n;

                if self.collected == COMMAND_LEN {
                    self.collected = 0;
                    let cmd = Command::decode(self.frame);
                    if self.dispatch(cmd) {
                        self.state = ReceiverState::Ready;
                    } else {
                        self.state = ReceiverState::Terminated;
                    }
                } else if n == 0 {
                    // Frame incomplete and the stream is dry: keep waiting
                    // for the rest. The loop never gives up on a frame.
                    self.clock.sleep(POLL_BACKOFF);
                }
            }

            ReceiverState::Terminated => {}
        }

        Ok(self.state)
    }

    /// Drive the loop until a TERMINATE command arrives.
    pub fn run(&mut self) -> Result<(), T::Error> {
        while self.step()? != ReceiverState::Terminated {}
        Ok(())
    }

    /// Current loop phase.
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// The motor, for inspection.
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// The transport, for inspection.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable transport access (simulation harnesses feed input here).
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Execute one decoded command. Returns `false` when the loop should
    /// exit (stop is implicit via exit — the hub runtime halts actuation
    /// when the program ends).
    fn dispatch(&mut self, cmd: Command) -> bool {
        debug!("dispatch: {cmd:?}");
        match cmd {
            Command::Forward => self.motor.drive(FORWARD_DUTY, Direction::Forward),
            Command::Stop => self.motor.stop(),
            Command::Reverse => self.motor.drive(REVERSE_DUTY, Direction::Reverse),
            Command::Terminate => return false,
            Command::Unknown => {
                // Fail-safe: never leave the motor running on a token we
                // do not understand.
                warn!("unrecognised command frame {:?}, stopping motor", self.frame);
                self.motor.stop();
            }
        }
        true
    }
}
