//! Severity ("Kp") evaluation.
//!
//! Two upstream analysis pipelines each publish an `alpha` and a `beta`
//! confidence for the same solar region. The score is deliberately coarse:
//! both pipelines must agree before anything escalates, and the beta
//! (flare-imminent) agreement always wins over the alpha one.

use core::fmt;

/// Both pipelines' detections must clear this level to count.
pub const STRONG_SIGNAL: f64 = 0.7;

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Discrete escalation score derived once per sampling cycle.
///
/// Currently three-valued; the representation leaves room for finer
/// grading without touching the comparison sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SeverityScore(u8);

impl SeverityScore {
    /// No qualifying activity.
    pub const QUIET: Self = Self(0);
    /// Both pipelines report a strong alpha signature.
    pub const ELEVATED: Self = Self(2);
    /// Both pipelines report a strong beta signature.
    pub const SEVERE: Self = Self(6);

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SeverityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One pipeline's alpha/beta pair. Missing fields read as 0.0 upstream, so
/// an absent metric can never satisfy a `>` comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceMetrics {
    pub alpha: f64,
    pub beta: f64,
}

/// Both pipelines sampled at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeveritySnapshot {
    pub magnetogram: SourceMetrics,
    pub continuum: SourceMetrics,
}

/// Derive the score from a snapshot, in strict priority order: the beta
/// agreement is checked first and wins regardless of the alpha values.
pub fn evaluate(snap: &SeveritySnapshot) -> SeverityScore {
    if snap.magnetogram.beta > STRONG_SIGNAL && snap.continuum.beta > STRONG_SIGNAL {
        SeverityScore::SEVERE
    } else if snap.magnetogram.alpha > STRONG_SIGNAL && snap.continuum.alpha > STRONG_SIGNAL {
        SeverityScore::ELEVATED
    } else {
        SeverityScore::QUIET
    }
}
