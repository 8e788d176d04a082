//! The atomic unit of annotation: a labeled time span.

use serde::{Deserialize, Serialize};

use super::tier::TierError;

/// A labeled span `[start, end)` on a tier.
///
/// Intervals are immutable values. Correcting a label produces a new
/// interval via [`Interval::with_label`]; the bounds never change after
/// construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: f64,
    end: f64,
    label: String,
}

impl Interval {
    /// Creates a new interval.
    ///
    /// # Errors
    /// Returns [`TierError::InvalidInterval`] if either bound is not finite
    /// or if `start >= end`.
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Result<Self, TierError> {
        let label = label.into();
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(TierError::InvalidInterval { start, end, label });
        }
        Ok(Self { start, end, label })
    }

    /// Start time (inclusive).
    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    /// The text label. Empty labels represent silence.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Duration in time units.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Returns true if the label is empty after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.label.trim().is_empty()
    }

    /// Returns true if `t` lies within `[start, end)`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Returns true if the two spans share any time.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns a new interval over the same span with a different label.
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        Self {
            start: self.start,
            end: self.end,
            label: label.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawInterval {
    start: f64,
    end: f64,
    #[serde(default)]
    label: String,
}

impl TryFrom<RawInterval> for Interval {
    type Error = TierError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Interval::new(raw.start, raw.end, raw.label)
    }
}
