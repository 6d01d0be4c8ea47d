//! System configuration parameters
//!
//! All tunable parameters for the controller. Defaults match the bench
//! setup; an optional JSON overlay adjusts them without rebuilding (e.g.
//! the 10-minute production sampling period vs. the 60-second bench
//! period).

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Hub ---
    /// Advertised name of the motor hub to connect to.
    pub hub_name: String,

    // --- Severity inputs ---
    /// Path of the magnetogram analysis result (JSON document).
    pub magnetogram_path: String,
    /// Path of the continuum analysis result (JSON document).
    pub continuum_path: String,

    // --- Hysteresis ---
    /// Severity score at or above which the shutter engages.
    pub engage_threshold: u8,
    /// Consecutive sub-threshold samples required before disengaging.
    pub disengage_streak: u32,

    // --- Timing ---
    /// Sampling period (seconds). 60 for bench runs; 600 in production.
    pub sample_interval_secs: u64,
    /// Hold duration after FORWARD/REVERSE before the follow-up STOP.
    pub dwell_secs: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            hub_name: "PH1".into(),

            magnetogram_path: "magnetogram_result.txt".into(),
            continuum_path: "continuum_result.txt".into(),

            engage_threshold: 5,
            disengage_streak: 10,

            sample_interval_secs: 60,
            dwell_secs: 5,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON overlay. Missing fields fall back to the defaults;
    /// the result is validated before use.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed config document"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations that would break the hysteresis.
    pub fn validate(&self) -> crate::Result<()> {
        if self.hub_name.is_empty() {
            return Err(Error::Config("hub name must not be empty"));
        }
        if self.engage_threshold == 0 {
            return Err(Error::Config("engage threshold must be positive"));
        }
        if self.disengage_streak == 0 {
            return Err(Error::Config("disengage streak must be positive"));
        }
        if self.sample_interval_secs == 0 {
            return Err(Error::Config("sample interval must be positive"));
        }
        if self.dwell_secs == 0 {
            return Err(Error::Config("dwell must be positive"));
        }
        Ok(())
    }
}
