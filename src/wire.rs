//! Fixed-width command protocol.
//!
//! Wire format, host to device (one GATT write):
//! ```text
//! ┌──────────┬────────────────────┐
//! │ Tag (1B) │ Command token (3B) │
//! │ 0x06     │ fwd / stp / rev /  │
//! │          │ bye                │
//! └──────────┴────────────────────┘
//! ```
//!
//! Device to host (GATT notification): `[0x01][N-byte free text]` — a
//! passthrough of the device's output stream, not a command frame. Any
//! other leading byte is ignored by the host.
//!
//! Command frames are exactly [`COMMAND_LEN`] bytes with no delimiters;
//! the decode side is total and maps every unrecognised token to
//! [`Command::Unknown`].

/// Width of one command frame.
pub const COMMAND_LEN: usize = 3;

/// Readiness token the device emits on its output stream once per receive
/// cycle.
pub const READY_TOKEN: [u8; COMMAND_LEN] = *b"rdy";

/// Leading byte of a host→device command write (stdin event).
pub const TAG_COMMAND: u8 = 0x06;

/// Leading byte of a device→host output notification (stdout event).
pub const TAG_OUTPUT: u8 = 0x01;

/// GATT characteristic carrying both directions of the protocol.
pub const CHAR_COMMAND: u128 = 0xc5f5_0002_8280_46da_89f4_6d80_51e4_aeef;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// The closed set of device instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Drive the shutter closed at moderate duty.
    Forward,
    /// Stop the motor.
    Stop,
    /// Drive the shutter open at higher duty.
    Reverse,
    /// End the receive loop on the device.
    Terminate,
    /// Anything not in the token table. Never encoded; dispatches to a
    /// fail-safe stop on the device.
    Unknown,
}

impl Command {
    /// The wire token for this command; `Unknown` has none.
    pub fn encode(self) -> Option<[u8; COMMAND_LEN]> {
        match self {
            Self::Forward => Some(*b"fwd"),
            Self::Stop => Some(*b"stp"),
            Self::Reverse => Some(*b"rev"),
            Self::Terminate => Some(*b"bye"),
            Self::Unknown => None,
        }
    }

    /// Total decode: every 3-byte token yields a variant.
    pub fn decode(raw: [u8; COMMAND_LEN]) -> Self {
        match &raw {
            b"fwd" => Self::Forward,
            b"stp" => Self::Stop,
            b"rev" => Self::Reverse,
            b"bye" => Self::Terminate,
            _ => Self::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Frame an outbound command for the hub's stdin channel.
pub fn frame_command(cmd: Command) -> Option<[u8; COMMAND_LEN + 1]> {
    let token = cmd.encode()?;
    let mut frame = [TAG_COMMAND; COMMAND_LEN + 1];
    frame[1..].copy_from_slice(&token);
    Some(frame)
}

/// Extract the passthrough payload from an inbound notification.
///
/// Returns `None` for frames that are not output events — the host
/// silently ignores those.
pub fn parse_output(data: &[u8]) -> Option<&[u8]> {
    match data.split_first() {
        Some((&TAG_OUTPUT, payload)) => Some(payload),
        _ => None,
    }
}
