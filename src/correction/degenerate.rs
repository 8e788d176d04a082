//! Removal of word entries too short to be words.
//!
//! Some word tiers contain stray phone labels. No word in the orthography
//! is shorter than two characters, so shorter entries are deleted.

use super::edit::{apply_edits, Edit};
use super::log::{AuditLog, Pass};
use super::CorrectionError;
use crate::ir::{Annotation, Tier, WORD_TIER};

/// Default minimum word length, in chars.
pub const DEFAULT_MIN_WORD_CHARS: usize = 2;

/// Proposes deleting every non-empty entry with fewer than `min_chars`
/// chars.
///
/// Length counts chars of the raw label, surrounding spaces included, so
/// `"a "` and a base letter plus combining mark are both two.
pub fn propose_deletions(tier: &Tier, min_chars: usize) -> Vec<Edit> {
    tier.iter()
        .filter(|entry| !entry.is_blank() && entry.label().chars().count() < min_chars)
        .map(|entry| Edit::Delete { old: entry.clone() })
        .collect()
}

/// Deletes degenerate entries from the word tier.
pub fn remove_degenerate_entries(
    annotation: &mut Annotation,
    min_chars: usize,
) -> Result<AuditLog, CorrectionError> {
    let tier = annotation.require_tier_mut(WORD_TIER)?;
    let edits = propose_deletions(tier, min_chars);
    let log = apply_edits(tier, edits, AuditLog::new(WORD_TIER, Pass::Deletion))?;
    tracing::info!(removed = log.len(), min_chars, "removed degenerate word entries");
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Interval;

    #[test]
    fn short_entries_are_deleted_and_logged() {
        let labels = ["a", "kas", "", "e\u{0303}", " o ", "b"];
        let intervals = labels
            .iter()
            .enumerate()
            .map(|(i, l)| Interval::new(i as f64, i as f64 + 1.0, *l).unwrap())
            .collect();
        let mut ann = Annotation::new(0.0, 6.0, vec![Tier::new("word", intervals).unwrap()]);

        let log = remove_degenerate_entries(&mut ann, DEFAULT_MIN_WORD_CHARS).unwrap();
        let kept: Vec<_> = ann.tier("word").unwrap().iter().map(|i| i.label()).collect();
        assert_eq!(kept, vec!["kas", "", "e\u{0303}", " o "]);

        let removed: Vec<_> = log.entries.iter().map(|e| e.old_label.as_str()).collect();
        assert_eq!(removed, vec!["a", "b"]);
        assert!(log.entries.iter().all(|e| e.new_label.is_none()));
    }

    #[test]
    fn padded_labels_count_their_spaces() {
        let intervals = ["a ", " o ", "b"]
            .iter()
            .enumerate()
            .map(|(i, l)| Interval::new(i as f64, i as f64 + 1.0, *l).unwrap())
            .collect();
        let mut ann = Annotation::new(0.0, 3.0, vec![Tier::new("word", intervals).unwrap()]);

        let log = remove_degenerate_entries(&mut ann, 2).unwrap();
        let kept: Vec<_> = ann.tier("word").unwrap().iter().map(|i| i.label()).collect();
        assert_eq!(kept, vec!["a ", " o "]);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries[0].old_label, "b");
    }
}
