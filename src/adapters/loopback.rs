//! In-memory hub link for simulation and tests.
//!
//! [`loopback_pair`] returns the two ends of a simulated hub session:
//! a [`LoopbackLink`] for the controller and a [`DeviceEndpoint`] for the
//! command receiver, joined by two bounded byte queues.
//!
//! The pair models the hub runtime's envelope handling: a command write
//! arrives on the device's input stream as the bare 3-byte token (the
//! stdin tag is stripped by the runtime), and device output is handed to
//! the host already unwrapped from its notification tag. The tag framing
//! itself lives in [`crate::wire`] and is exercised by the radio adapter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use heapless::Deque;

use crate::app::ports::CommandLink;
use crate::device::transport::Transport;
use crate::error::TransportError;
use crate::wire::Command;

/// Capacity of each direction's byte queue. Overflowing device output is
/// dropped (stdout with a slow reader); an overflowing command write
/// fails as unacknowledged.
const QUEUE_CAP: usize = 512;

type SharedQueue = Arc<Mutex<Deque<u8, QUEUE_CAP>>>;

fn locked(queue: &SharedQueue) -> MutexGuard<'_, Deque<u8, QUEUE_CAP>> {
    match queue.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Create a connected link/endpoint pair.
pub fn loopback_pair() -> (LoopbackLink, DeviceEndpoint) {
    let to_device: SharedQueue = Arc::new(Mutex::new(Deque::new()));
    let from_device: SharedQueue = Arc::new(Mutex::new(Deque::new()));
    let connected = Arc::new(AtomicBool::new(true));

    let link = LoopbackLink {
        to_device: Arc::clone(&to_device),
        from_device: Arc::clone(&from_device),
        connected: Arc::clone(&connected),
    };
    let endpoint = DeviceEndpoint {
        inbound: to_device,
        outbound: from_device,
        connected,
    };
    (link, endpoint)
}

// ---------------------------------------------------------------------------
// Host end
// ---------------------------------------------------------------------------

/// The controller's end of the simulated session.
pub struct LoopbackLink {
    to_device: SharedQueue,
    from_device: SharedQueue,
    connected: Arc<AtomicBool>,
}

impl CommandLink for LoopbackLink {
    fn send(&mut self, cmd: Command) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let token = cmd.encode().ok_or(TransportError::WriteFailed)?;

        let mut queue = locked(&self.to_device);
        if queue.len() + token.len() > QUEUE_CAP {
            return Err(TransportError::WriteFailed);
        }
        for byte in token {
            // Capacity checked above; a full queue cannot be hit here.
            let _ = queue.push_back(byte);
        }
        Ok(())
    }

    fn poll_output(&mut self) -> Option<Vec<u8>> {
        let mut queue = locked(&self.from_device);
        if queue.is_empty() {
            return None;
        }
        let mut payload = Vec::with_capacity(queue.len());
        while let Some(byte) = queue.pop_front() {
            payload.push(byte);
        }
        Some(payload)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Device end
// ---------------------------------------------------------------------------

/// The receiver's end of the simulated session.
///
/// Reads never fail — after a host disconnect the stream simply runs dry,
/// the same silence a real hub sees. Output written with no session is
/// discarded.
pub struct DeviceEndpoint {
    inbound: SharedQueue,
    outbound: SharedQueue,
    connected: Arc<AtomicBool>,
}

impl Transport for DeviceEndpoint {
    type Error = TransportError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut queue = locked(&self.inbound);
        let mut n = 0;
        while n < buf.len() {
            match queue.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if self.connected.load(Ordering::SeqCst) {
            let mut queue = locked(&self.outbound);
            for &byte in data {
                // On overflow the oldest unread output is dropped first.
                if queue.is_full() {
                    let _ = queue.pop_front();
                }
                let _ = queue.push_back(byte);
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn available(&self) -> bool {
        !locked(&self.inbound).is_empty()
    }
}
