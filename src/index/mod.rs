//! Cross-tier temporal lookup.
//!
//! A [`TemporalIndex`] is an explicit, read-only value built from an
//! [`Annotation`] by [`build_index`]. It answers "what is active on tier T
//! at time t" and "which interval on tier T ends near t" without walking
//! the tiers.
//!
//! The index owns copies of the spans it was built from and is **not**
//! kept in sync with the annotation. After mutating any tier, rebuild it;
//! [`TemporalIndex::is_current`] tells whether a rebuild is needed.
//!
//! Lookups always name the tier they want. Results of
//! [`TemporalIndex::query_at`] come back in tier declaration order, so the
//! output never depends on hashing or insertion accidents.

mod finals;

pub use finals::{phrase_final_vowels, FinalVowel, FinalVowelOptions, DEFAULT_MIN_SILENCE};

use serde::Serialize;

use crate::ir::{Annotation, PHRASE_TIER, WORD_TIER};

/// One indexed interval, tagged with the tier it came from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexHit {
    pub tier: String,
    pub start: f64,
    pub end: f64,
    pub label: String,
}

#[derive(Clone, Debug)]
struct IndexedTier {
    name: String,
    /// Sorted by start; starts and ends are both strictly increasing.
    spans: Vec<IndexHit>,
}

impl IndexedTier {
    fn hit_at(&self, t: f64) -> Option<&IndexHit> {
        let idx = self.spans.partition_point(|s| s.start <= t);
        idx.checked_sub(1)
            .map(|i| &self.spans[i])
            .filter(|span| t < span.end)
    }

    fn first_end_within(&self, t: f64, tolerance: f64) -> Option<&IndexHit> {
        if !t.is_finite() || tolerance.is_nan() || tolerance < 0.0 {
            return None;
        }
        let idx = self.spans.partition_point(|s| s.end < t - tolerance);
        self.spans.get(idx).filter(|span| span.end <= t + tolerance)
    }

    fn nearest_boundary(&self, t: f64) -> Option<&IndexHit> {
        if !t.is_finite() || self.spans.is_empty() {
            return None;
        }
        let distance = |span: &IndexHit| (span.start - t).abs().min((span.end - t).abs());

        // The closest endpoint belongs to the span straddling t or to one of
        // its two neighbors.
        let idx = self.spans.partition_point(|s| s.end < t);
        let lo = idx.saturating_sub(1);
        let hi = (idx + 1).min(self.spans.len() - 1);
        self.spans[lo..=hi]
            .iter()
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))
    }
}

/// Point and endpoint queries over every tier of one annotation.
#[derive(Clone, Debug)]
pub struct TemporalIndex {
    tiers: Vec<IndexedTier>,
    revision: u64,
}

/// Builds an index over all tiers of `annotation`.
///
/// Building is idempotent: two indexes built from an unchanged annotation
/// answer every query identically.
pub fn build_index(annotation: &Annotation) -> TemporalIndex {
    let tiers = annotation
        .tiers()
        .iter()
        .map(|tier| IndexedTier {
            name: tier.name().to_string(),
            spans: tier
                .iter()
                .map(|interval| IndexHit {
                    tier: tier.name().to_string(),
                    start: interval.start(),
                    end: interval.end(),
                    label: interval.label().to_string(),
                })
                .collect(),
        })
        .collect();

    TemporalIndex {
        tiers,
        revision: annotation.revision(),
    }
}

impl TemporalIndex {
    /// Every tier's active interval at `t`, in tier declaration order.
    pub fn query_at(&self, t: f64) -> Vec<&IndexHit> {
        self.tiers.iter().filter_map(|tier| tier.hit_at(t)).collect()
    }

    /// The interval active at `t` on the named tier.
    pub fn hit_at(&self, tier: &str, t: f64) -> Option<&IndexHit> {
        self.tier(tier).and_then(|indexed| indexed.hit_at(t))
    }

    /// The label active at `t` on the named tier.
    pub fn label_at(&self, tier: &str, t: f64) -> Option<&str> {
        self.hit_at(tier, t).map(|hit| hit.label.as_str())
    }

    /// The word label at `t`, or `""` when no word is active.
    pub fn word_at(&self, t: f64) -> &str {
        self.label_at(WORD_TIER, t).unwrap_or("")
    }

    /// The phrase label at `t`, or `""` when no phrase is active.
    pub fn phrase_at(&self, t: f64) -> &str {
        self.label_at(PHRASE_TIER, t).unwrap_or("")
    }

    /// The first interval on `tier` whose end lies within `tolerance` of `t`.
    pub fn find_at_endtime(&self, tier: &str, t: f64, tolerance: f64) -> Option<&IndexHit> {
        self.tier(tier)
            .and_then(|indexed| indexed.first_end_within(t, tolerance))
    }

    /// The interval on `tier` with an endpoint closest to `t`.
    ///
    /// Ties go to the earlier interval.
    pub fn nearest_boundary(&self, tier: &str, t: f64) -> Option<&IndexHit> {
        self.tier(tier).and_then(|indexed| indexed.nearest_boundary(t))
    }

    /// Indexed tier names, in declaration order.
    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name.as_str()).collect()
    }

    /// Total number of indexed intervals.
    pub fn len(&self) -> usize {
        self.tiers.iter().map(|t| t.spans.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns false once `annotation` has been mutated since this index
    /// was built from it.
    pub fn is_current(&self, annotation: &Annotation) -> bool {
        self.revision == annotation.revision()
    }

    fn tier(&self, name: &str) -> Option<&IndexedTier> {
        self.tiers.iter().find(|t| t.name == name)
    }
}
