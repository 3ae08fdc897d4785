//! Weighted confidence aggregation.
//!
//! Confidence is the share of a target's applicable weight that was actually
//! observed, as an integer percentage:
//!
//! ```text
//! confidence = round(100 * Σ matched weights / Σ applicable weights)
//! ```
//!
//! A target with no applicable weight scores 0.

/// Accumulates applicable and matched weight for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfidenceTally {
    possible: f64,
    matched: f64,
}

impl ConfidenceTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `weight` as obtainable.
    pub fn consider(&mut self, weight: f64) {
        self.possible += weight;
    }

    /// Count `weight` as observed.
    pub fn record_match(&mut self, weight: f64) {
        self.matched += weight;
    }

    pub fn possible(&self) -> f64 {
        self.possible
    }

    pub fn matched(&self) -> f64 {
        self.matched
    }

    pub fn confidence(&self) -> u8 {
        confidence_score(self.matched, self.possible)
    }
}

/// `round(100 * matched / possible)`, clamped to `0..=100`.
pub fn confidence_score(matched: f64, possible: f64) -> u8 {
    if possible.is_nan() || possible <= 0.0 || !matched.is_finite() {
        return 0;
    }
    let pct = (100.0 * matched / possible).round();
    pct.clamp(0.0, 100.0) as u8
}
