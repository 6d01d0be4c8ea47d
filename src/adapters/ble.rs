//! Hub link over a host BLE central.
//!
//! Session lifecycle: scan for the hub by its advertised name, connect,
//! locate the command characteristic by UUID, subscribe to notifications,
//! then serve [`CommandLink`] to the controller:
//!
//! - writes go out as `[0x06][token]` frames with delivery confirmation;
//! - notifications tagged as hub output are buffered and drained by
//!   `poll_output`; anything else is ignored;
//! - a dying notification stream marks the link lost and is logged, but
//!   the controller only notices on its next write (fail-stop there, no
//!   reconnect).
//!
//! The BLE client is async; the sampling loop is not. Each call crosses
//! the boundary with `block_on`, and the notification pump runs on its
//! own thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures_lite::future;
use futures_lite::stream::StreamExt;
use log::{info, warn};
use uuid::Uuid;

use crate::app::ports::CommandLink;
use crate::error::TransportError;
use crate::wire::{self, Command, CHAR_COMMAND};

/// Pause between scan sweeps while looking for the hub.
const SCAN_POLL: Duration = Duration::from_secs(1);

/// Buffered notification payloads before the oldest is dropped.
const OUTPUT_BUFFER_CAP: usize = 64;

/// An established GATT session with the motor hub.
pub struct BleHubLink {
    peripheral: Peripheral,
    characteristic: Characteristic,
    output: Arc<Mutex<VecDeque<Vec<u8>>>>,
    connected: Arc<AtomicBool>,
}

impl BleHubLink {
    /// Scan for `hub_name`, connect, and subscribe to its output stream.
    pub fn connect(hub_name: &str, scan_timeout: Duration) -> Result<Self, TransportError> {
        let central = future::block_on(default_adapter())?;

        future::block_on(central.start_scan(ScanFilter::default()))
            .map_err(|e| backend("scan start", &e, TransportError::DeviceNotFound))?;

        let deadline = Instant::now() + scan_timeout;
        let peripheral = loop {
            if let Some(found) = future::block_on(find_by_name(&central, hub_name)) {
                break found;
            }
            if Instant::now() >= deadline {
                warn!("hub link: no peripheral named '{hub_name}' within {scan_timeout:?}");
                return Err(TransportError::DeviceNotFound);
            }
            std::thread::sleep(SCAN_POLL);
        };

        if let Err(e) = future::block_on(central.stop_scan()) {
            warn!("hub link: stop_scan failed: {e}");
        }

        future::block_on(Self::establish(peripheral))
    }

    async fn establish(peripheral: Peripheral) -> Result<Self, TransportError> {
        peripheral
            .connect()
            .await
            .map_err(|e| backend("connect", &e, TransportError::Disconnected))?;
        peripheral
            .discover_services()
            .await
            .map_err(|e| backend("service discovery", &e, TransportError::Disconnected))?;

        let command_uuid = Uuid::from_u128(CHAR_COMMAND);
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == command_uuid)
            .ok_or(TransportError::CharacteristicMissing)?;

        peripheral
            .subscribe(&characteristic)
            .await
            .map_err(|e| backend("subscribe", &e, TransportError::Disconnected))?;

        let notifications = peripheral
            .notifications()
            .await
            .map_err(|e| backend("notification stream", &e, TransportError::Disconnected))?;

        let output = Arc::new(Mutex::new(VecDeque::new()));
        let connected = Arc::new(AtomicBool::new(true));
        info!("hub link: connected and subscribed");

        // Notification pump. Detached; ends when the stream does, and the
        // flag flips so the next write fails instead of hanging on a dead
        // session.
        let pump_output = Arc::clone(&output);
        let pump_connected = Arc::clone(&connected);
        let _pump = std::thread::spawn(move || {
            future::block_on(async move {
                let mut stream = notifications;
                while let Some(notification) = stream.next().await {
                    if let Some(payload) = wire::parse_output(&notification.value) {
                        if let Ok(mut buffer) = pump_output.lock() {
                            if buffer.len() >= OUTPUT_BUFFER_CAP {
                                let _ = buffer.pop_front();
                            }
                            buffer.push_back(payload.to_vec());
                        }
                    }
                }
            });
            if pump_connected.swap(false, Ordering::SeqCst) {
                warn!("hub link: hub was disconnected");
            }
        });

        Ok(Self {
            peripheral,
            characteristic,
            output,
            connected,
        })
    }
}

impl CommandLink for BleHubLink {
    fn send(&mut self, cmd: Command) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let frame = wire::frame_command(cmd).ok_or(TransportError::WriteFailed)?;

        future::block_on(self.peripheral.write(
            &self.characteristic,
            &frame,
            WriteType::WithResponse,
        ))
        .map_err(|e| {
            self.connected.store(false, Ordering::SeqCst);
            backend("write", &e, TransportError::WriteFailed)
        })
    }

    fn poll_output(&mut self) -> Option<Vec<u8>> {
        self.output.lock().ok().and_then(|mut buf| buf.pop_front())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        future::block_on(self.peripheral.disconnect())
            .map_err(|e| backend("disconnect", &e, TransportError::Disconnected))
    }
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

async fn default_adapter() -> Result<Adapter, TransportError> {
    let manager = Manager::new()
        .await
        .map_err(|e| backend("manager init", &e, TransportError::DeviceNotFound))?;
    let adapters = manager
        .adapters()
        .await
        .map_err(|e| backend("adapter enumeration", &e, TransportError::DeviceNotFound))?;
    adapters.into_iter().next().ok_or_else(|| {
        warn!("hub link: no BLE adapter present");
        TransportError::DeviceNotFound
    })
}

/// One sweep over the currently known peripherals.
async fn find_by_name(central: &Adapter, hub_name: &str) -> Option<Peripheral> {
    let peripherals = central.peripherals().await.ok()?;
    for peripheral in peripherals {
        if let Ok(Some(properties)) = peripheral.properties().await {
            if properties.local_name.as_deref() == Some(hub_name) {
                return Some(peripheral);
            }
        }
    }
    None
}

fn backend(op: &str, err: &btleplug::Error, mapped: TransportError) -> TransportError {
    warn!("hub link: {op} failed: {err}");
    mapped
}
