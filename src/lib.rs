//! Flaregate library.
//!
//! Host-side hysteresis controller and device-side command receiver for a
//! wireless shutter motor, paired over a fixed-width byte protocol. The
//! domain core is pure logic behind port traits; everything that touches
//! files, clocks, or a radio lives in `adapters`.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod device;
pub mod fsm;
pub mod severity;
pub mod wire;

mod error;

pub mod adapters;

pub use error::{Error, Result, TransportError};
