//! Tiers: ordered, non-overlapping sequences of intervals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::interval::Interval;

/// Default absolute tolerance for matching interval end times.
pub const DEFAULT_END_TOLERANCE: f64 = 0.01;

/// Errors raised when an interval or a tier mutation would break the
/// tier invariants.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TierError {
    #[error("invalid interval [{start}, {end}] '{label}': bounds must be finite with start < end")]
    InvalidInterval { start: f64, end: f64, label: String },

    #[error(
        "interval [{start}, {end}] '{label}' overlaps [{other_start}, {other_end}] on tier '{tier}'"
    )]
    Overlap {
        tier: String,
        start: f64,
        end: f64,
        label: String,
        other_start: f64,
        other_end: f64,
    },

    #[error("interval [{start}, {end}] '{label}' not found on tier '{tier}'")]
    NotFound {
        tier: String,
        start: f64,
        end: f64,
        label: String,
    },
}

impl TierError {
    fn overlap(tier: &str, new: &Interval, existing: &Interval) -> Self {
        Self::Overlap {
            tier: tier.to_string(),
            start: new.start(),
            end: new.end(),
            label: new.label().to_string(),
            other_start: existing.start(),
            other_end: existing.end(),
        }
    }

    fn not_found(tier: &str, entry: &Interval) -> Self {
        Self::NotFound {
            tier: tier.to_string(),
            start: entry.start(),
            end: entry.end(),
            label: entry.label().to_string(),
        }
    }
}

/// One labeled channel of time-aligned intervals.
///
/// Intervals are kept sorted by start time and never overlap: for any
/// `i < j`, `intervals[i].end() <= intervals[j].start()`. Every mutation
/// either preserves that invariant or fails and leaves the tier untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawTier")]
pub struct Tier {
    name: String,
    intervals: Vec<Interval>,
    #[serde(skip)]
    revision: u64,
}

impl Tier {
    /// Creates a tier from intervals in any order.
    ///
    /// # Errors
    /// Returns [`TierError::Overlap`] if any two intervals overlap.
    pub fn new(name: impl Into<String>, mut intervals: Vec<Interval>) -> Result<Self, TierError> {
        let name = name.into();
        intervals.sort_by(|a, b| a.start().total_cmp(&b.start()));

        for pair in intervals.windows(2) {
            if pair[0].end() > pair[1].start() {
                return Err(TierError::overlap(&name, &pair[1], &pair[0]));
            }
        }

        Ok(Self {
            name,
            intervals,
            revision: 0,
        })
    }

    /// Creates a tier with no intervals.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            intervals: Vec::new(),
            revision: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The intervals, sorted ascending by start.
    pub fn entries(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of successful mutations applied since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the interval active at `t` (half-open membership).
    pub fn interval_at(&self, t: f64) -> Option<&Interval> {
        let idx = self.intervals.partition_point(|i| i.start() <= t);
        idx.checked_sub(1)
            .map(|i| &self.intervals[i])
            .filter(|interval| t < interval.end())
    }

    /// Returns the first interval whose end lies within `tolerance` of `t`.
    ///
    /// End times are strictly increasing in a valid tier, so this is a
    /// binary search for the earliest end `>= t - tolerance`.
    pub fn find_at_endtime(&self, t: f64, tolerance: f64) -> Option<&Interval> {
        if !t.is_finite() || tolerance.is_nan() || tolerance < 0.0 {
            return None;
        }
        let idx = self.intervals.partition_point(|i| i.end() < t - tolerance);
        self.intervals
            .get(idx)
            .filter(|interval| interval.end() <= t + tolerance)
    }

    /// Inserts an interval, keeping the tier sorted.
    ///
    /// # Errors
    /// Returns [`TierError::Overlap`] if the interval overlaps a neighbor.
    pub fn insert(&mut self, interval: Interval) -> Result<(), TierError> {
        let idx = self.check_insertable(&interval)?;
        self.intervals.insert(idx, interval);
        self.revision += 1;
        Ok(())
    }

    /// Replaces `old` with `new`.
    ///
    /// On failure the tier is left exactly as it was.
    ///
    /// # Errors
    /// Returns [`TierError::NotFound`] if `old` is not on this tier, or
    /// [`TierError::Overlap`] if `new` would overlap another interval.
    pub fn replace(&mut self, old: &Interval, new: Interval) -> Result<(), TierError> {
        let pos = self
            .position(old)
            .ok_or_else(|| TierError::not_found(&self.name, old))?;
        let removed = self.intervals.remove(pos);

        match self.check_insertable(&new) {
            Ok(idx) => {
                self.intervals.insert(idx, new);
                self.revision += 1;
                Ok(())
            }
            Err(err) => {
                self.intervals.insert(pos, removed);
                Err(err)
            }
        }
    }

    /// Removes an interval and returns it.
    ///
    /// # Errors
    /// Returns [`TierError::NotFound`] if `entry` is not on this tier.
    pub fn delete(&mut self, entry: &Interval) -> Result<Interval, TierError> {
        let pos = self
            .position(entry)
            .ok_or_else(|| TierError::not_found(&self.name, entry))?;
        self.revision += 1;
        Ok(self.intervals.remove(pos))
    }

    /// Drops every interval whose label is blank.
    pub(crate) fn drop_blank(&mut self) {
        let before = self.intervals.len();
        self.intervals.retain(|interval| !interval.is_blank());
        if self.intervals.len() != before {
            self.revision += 1;
        }
    }

    fn position(&self, entry: &Interval) -> Option<usize> {
        let idx = self
            .intervals
            .partition_point(|i| i.start() < entry.start());
        self.intervals
            .get(idx)
            .filter(|candidate| *candidate == entry)
            .map(|_| idx)
    }

    fn check_insertable(&self, interval: &Interval) -> Result<usize, TierError> {
        let idx = self
            .intervals
            .partition_point(|i| i.start() < interval.start());

        if let Some(prev) = idx.checked_sub(1).map(|i| &self.intervals[i]) {
            if prev.end() > interval.start() {
                return Err(TierError::overlap(&self.name, interval, prev));
            }
        }
        if let Some(next) = self.intervals.get(idx) {
            if next.start() < interval.end() {
                return Err(TierError::overlap(&self.name, interval, next));
            }
        }
        Ok(idx)
    }
}

impl PartialEq for Tier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.intervals == other.intervals
    }
}

impl<'a> IntoIterator for &'a Tier {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

#[derive(Deserialize)]
struct RawTier {
    name: String,
    #[serde(default)]
    intervals: Vec<Interval>,
}

impl TryFrom<RawTier> for Tier {
    type Error = TierError;

    fn try_from(raw: RawTier) -> Result<Self, Self::Error> {
        Tier::new(raw.name, raw.intervals)
    }
}
