//! Flaregate — entry point.
//!
//! Wires the adapters to the control service and runs the sampling loop
//! until interrupted. Built with the `ble` feature the controller drives
//! the real hub; without it, a simulated hub (loopback link plus the
//! command receiver on a background thread) stands in, so the full
//! host↔device pipeline runs on any machine.

#![deny(unused_must_use)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use flaregate::adapters::log_sink::LogEventSink;
use flaregate::adapters::severity_file::FileSeveritySource;
use flaregate::adapters::time::SystemClock;
use flaregate::app::service::ControlService;
use flaregate::config::SystemConfig;

/// Optional JSON overlay next to the process; defaults apply without it.
const CONFIG_OVERLAY: &str = "flaregate.json";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("flaregate v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config();
    info!(
        "hub '{}', threshold {}, sampling every {}s",
        config.hub_name, config.engage_threshold, config.sample_interval_secs
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("installing interrupt handler")?;
    }

    run(config, &stop)
}

fn load_config() -> SystemConfig {
    match std::fs::read_to_string(CONFIG_OVERLAY) {
        Ok(text) => match SystemConfig::from_json(&text) {
            Ok(config) => {
                info!("configuration loaded from {CONFIG_OVERLAY}");
                config
            }
            Err(e) => {
                warn!("ignoring {CONFIG_OVERLAY} ({e}), using defaults");
                SystemConfig::default()
            }
        },
        Err(_) => SystemConfig::default(),
    }
}

#[cfg(feature = "ble")]
fn run(config: SystemConfig, stop: &AtomicBool) -> Result<()> {
    use std::time::Duration;

    use flaregate::adapters::ble::BleHubLink;

    const SCAN_TIMEOUT: Duration = Duration::from_secs(30);

    info!("searching for hub '{}'", config.hub_name);
    let mut link = BleHubLink::connect(&config.hub_name, SCAN_TIMEOUT)
        .context("establishing hub session")?;
    info!("hub connected — start the receiver program on the hub if it is not running");

    let mut severity = FileSeveritySource::from_config(&config);
    let mut sink = LogEventSink::new();
    let clock = SystemClock;

    let mut service = ControlService::new(config);
    service.start(&mut sink);
    service
        .run(&mut severity, &mut link, &clock, &mut sink, stop)
        .context("control loop aborted")?;
    Ok(())
}

#[cfg(not(feature = "ble"))]
fn run(config: SystemConfig, stop: &AtomicBool) -> Result<()> {
    use flaregate::adapters::loopback::loopback_pair;
    use flaregate::device::motor::ShutterMotor;
    use flaregate::device::CommandReceiver;

    info!("no radio stack built in — running against the simulated hub");
    let (mut link, endpoint) = loopback_pair();

    // The simulated device: same receiver loop the hub runs, on its own
    // thread. Detached — it dies with the process; the controller's
    // disconnect just leaves it polling silence.
    let _device = std::thread::spawn(move || {
        let mut receiver = CommandReceiver::new(endpoint, ShutterMotor::new(), SystemClock);
        if let Err(e) = receiver.run() {
            warn!("simulated receiver stopped: {e:?}");
        }
    });

    let mut severity = FileSeveritySource::from_config(&config);
    let mut sink = LogEventSink::new();
    let clock = SystemClock;

    let mut service = ControlService::new(config);
    service.start(&mut sink);
    service
        .run(&mut severity, &mut link, &clock, &mut sink, stop)
        .context("control loop aborted")?;
    Ok(())
}
