use proptest::prelude::*;
use tiercheck::index::build_index;
use tiercheck::ir::io_json::{from_json_str, to_json_string};
use tiercheck::ir::io_textgrid::{from_textgrid_str, to_textgrid_string};
use tiercheck::ir::{Interval, Tier, TierError, CANONICAL_TIERS};

mod proptest_helpers;

/// A tier mutation. Targets are indices into the current tier, taken
/// modulo its length; spans are in hundredths of a second.
#[derive(Clone, Debug)]
enum TierOp {
    Insert { start: u32, len: u32 },
    Replace { target: usize, start: u32, len: u32 },
    Relabel { target: usize },
    Delete { target: usize },
    DeleteMissing,
}

fn arb_tier_op() -> impl Strategy<Value = TierOp> {
    prop_oneof![
        (0u32..300, 1u32..40).prop_map(|(start, len)| TierOp::Insert { start, len }),
        (any::<usize>(), 0u32..300, 1u32..40)
            .prop_map(|(target, start, len)| TierOp::Replace { target, start, len }),
        any::<usize>().prop_map(|target| TierOp::Relabel { target }),
        any::<usize>().prop_map(|target| TierOp::Delete { target }),
        Just(TierOp::DeleteMissing),
    ]
}

fn span(start: u32, len: u32) -> Interval {
    Interval::new(f64::from(start) / 100.0, f64::from(start + len) / 100.0, "op")
        .expect("positive length")
}

fn is_sorted_and_disjoint(tier: &Tier) -> bool {
    tier.entries().windows(2).all(|w| w[0].end() <= w[1].start())
}

fn collides(tier: &Tier, new: &Interval, ignore: Option<&Interval>) -> bool {
    tier.iter()
        .filter(|&i| Some(i) != ignore)
        .any(|i| i.overlaps(new))
}

/// Applies `op` and returns whether it was expected to succeed.
fn apply_op(tier: &mut Tier, op: &TierOp) -> (bool, Result<(), TierError>) {
    let pick = |target: usize| tier.entries().get(target % tier.len().max(1)).cloned();
    match *op {
        TierOp::Insert { start, len } => {
            let new = span(start, len);
            (!collides(tier, &new, None), tier.insert(new))
        }
        TierOp::Replace { target, start, len } => match pick(target) {
            Some(old) => {
                let new = span(start, len);
                (!collides(tier, &new, Some(&old)), tier.replace(&old, new))
            }
            None => (false, tier.replace(&span(start, len), span(start, len))),
        },
        TierOp::Relabel { target } => match pick(target) {
            Some(old) => (true, tier.replace(&old, old.with_label("relabelled"))),
            None => (true, Ok(())),
        },
        TierOp::Delete { target } => match pick(target) {
            Some(old) => (true, tier.delete(&old).map(|_| ())),
            None => (true, Ok(())),
        },
        TierOp::DeleteMissing => (false, tier.delete(&span(900, 1)).map(|_| ())),
    }
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn textgrid_roundtrip_preserves_tiers(annotation in proptest_helpers::arb_annotation(12)) {
        let text = to_textgrid_string(&annotation);
        let restored = from_textgrid_str(&text, false).expect("parse written textgrid");
        prop_assert_eq!(annotation.tiers(), restored.tiers());
    }

    #[test]
    fn json_roundtrip_preserves_annotation(annotation in proptest_helpers::arb_annotation(12)) {
        let json = to_json_string(&annotation).expect("serialize json");
        let restored = from_json_str(&json).expect("parse json");
        prop_assert_eq!(annotation, restored);
    }

    #[test]
    fn index_agrees_with_linear_scan(
        annotation in proptest_helpers::arb_annotation(12),
        t in proptest_helpers::arb_time(),
    ) {
        let index = build_index(&annotation);
        for name in CANONICAL_TIERS {
            let tier = annotation.tier(name).unwrap();
            let expected = proptest_helpers::linear_interval_at(tier, t);
            let hit = index.hit_at(name, t);
            prop_assert_eq!(
                hit.map(|h| (h.start, h.end, h.label.as_str())),
                expected.map(|i| (i.start(), i.end(), i.label()))
            );
            prop_assert_eq!(tier.interval_at(t), expected);
        }
    }

    #[test]
    fn query_at_lists_tiers_in_declaration_order(
        annotation in proptest_helpers::arb_annotation(8),
        t in proptest_helpers::arb_time(),
    ) {
        let index = build_index(&annotation);
        let tiers: Vec<&str> = index.query_at(t).iter().map(|h| h.tier.as_str()).collect();
        let expected: Vec<&str> = CANONICAL_TIERS
            .into_iter()
            .filter(|name| annotation.tier(name).unwrap().interval_at(t).is_some())
            .collect();
        prop_assert_eq!(tiers, expected);
    }

    #[test]
    fn end_time_match_is_within_tolerance(
        annotation in proptest_helpers::arb_annotation(12),
        t in proptest_helpers::arb_time(),
        tolerance in 0.0f64..0.2,
    ) {
        let tier = annotation.tier("word").unwrap();
        match tier.find_at_endtime(t, tolerance) {
            Some(found) => {
                prop_assert!((found.end() - t).abs() <= tolerance);
                // Nothing earlier also matches.
                let first = tier.iter().find(|i| (i.end() - t).abs() <= tolerance);
                prop_assert_eq!(first, Some(found));
            }
            None => prop_assert!(tier.iter().all(|i| (i.end() - t).abs() > tolerance)),
        }
    }

    #[test]
    fn widening_tolerance_never_loses_a_match(
        annotation in proptest_helpers::arb_annotation(12),
        t in proptest_helpers::arb_time(),
        narrow in 0.0f64..0.1,
        extra in 0.0f64..0.1,
    ) {
        let tier = annotation.tier("phrase").unwrap();
        if tier.find_at_endtime(t, narrow).is_some() {
            prop_assert!(tier.find_at_endtime(t, narrow + extra).is_some());
        }
    }

    #[test]
    fn mutations_keep_tier_sorted_and_disjoint(
        mut tier in proptest_helpers::arb_tier("word", 10),
        ops in proptest::collection::vec(arb_tier_op(), 1..30),
    ) {
        for op in &ops {
            let before = tier.clone();
            let revision = tier.revision();
            let (should_succeed, result) = apply_op(&mut tier, op);

            prop_assert!(is_sorted_and_disjoint(&tier), "after {:?}: {:?}", op, tier);
            prop_assert_eq!(result.is_ok(), should_succeed, "{:?} gave {:?}", op, result);
            match result {
                Ok(()) => {}
                Err(err) => {
                    let expected_kind = match op {
                        TierOp::Insert { .. } | TierOp::Replace { .. } if !before.is_empty() => {
                            matches!(err, TierError::Overlap { .. })
                        }
                        _ => matches!(err, TierError::NotFound { .. }),
                    };
                    prop_assert!(expected_kind, "{:?} gave {:?}", op, err);
                    prop_assert_eq!(&tier, &before);
                    prop_assert_eq!(tier.revision(), revision);
                }
            }
        }
    }
}
