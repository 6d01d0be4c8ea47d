//! Application layer: the control service and its port boundary.

pub mod events;
pub mod ports;
pub mod service;
