#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use tiercheck::ir::{Annotation, Interval, Tier, CANONICAL_TIERS};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A label that is never blank.
pub fn label_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-zëïÿãõ:_ ]{0,6}[a-z]")
        .expect("valid label regex")
        .boxed()
}

/// A sorted, non-overlapping tier of up to `max_intervals` entries.
///
/// Each seed is (gap, length) in ticks, so gaps of zero make adjacent
/// intervals.
pub fn arb_tier(name: &'static str, max_intervals: usize) -> BoxedStrategy<Tier> {
    proptest::collection::vec((0u32..5, 1u32..20, label_strategy()), 0..=max_intervals)
        .prop_map(move |seeds| build_tier(name, seeds))
        .boxed()
}

/// An annotation with the four canonical tiers.
pub fn arb_annotation(max_intervals: usize) -> BoxedStrategy<Annotation> {
    (
        arb_tier(CANONICAL_TIERS[0], max_intervals),
        arb_tier(CANONICAL_TIERS[1], max_intervals),
        arb_tier(CANONICAL_TIERS[2], max_intervals),
        arb_tier(CANONICAL_TIERS[3], max_intervals),
    )
        .prop_map(|(phone, word, phrase, notes)| {
            let tiers = vec![phone, word, phrase, notes];
            let xmax = tiers
                .iter()
                .filter_map(|t| t.entries().last())
                .map(Interval::end)
                .fold(1.0, f64::max);
            Annotation::new(0.0, xmax, tiers)
        })
        .boxed()
}

/// A query time inside or just around the generated range.
pub fn arb_time() -> BoxedStrategy<f64> {
    (0u32..1000).prop_map(|n| f64::from(n) / 200.0).boxed()
}

fn build_tier(name: &str, seeds: Vec<(u32, u32, String)>) -> Tier {
    let mut cursor = 0u32;
    let intervals = seeds
        .into_iter()
        .map(|(gap, length, label)| {
            let start = cursor + gap;
            let end = start + length;
            cursor = end;
            Interval::new(ticks(start), ticks(end), label).expect("generated bounds are valid")
        })
        .collect();
    Tier::new(name, intervals).expect("generated intervals do not overlap")
}

/// Generated times are hundredths of a second.
fn ticks(n: u32) -> f64 {
    f64::from(n) / 100.0
}

/// The interval active at `t`, found by scanning.
pub fn linear_interval_at(tier: &Tier, t: f64) -> Option<&Interval> {
    tier.iter().find(|i| i.start() <= t && t < i.end())
}
