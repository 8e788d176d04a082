//! Grapheme substitution: precomposed lookalikes to IPA sequences.
//!
//! Transcribers often type a precomposed letter (`ẽ`, U+1EBD) where IPA
//! wants a base letter plus combining diacritic (`e` + U+0303). The two
//! render the same but only the second passes IPA validation.

use std::collections::BTreeMap;
use std::fmt;

use super::edit::{apply_edits, Edit};
use super::log::{AuditLog, Pass};
use super::CorrectionError;
use crate::error::TiercheckError;
use crate::ir::{Annotation, Tier};

const DEFAULT_PAIRS: [(char, &str); 16] = [
    // nasalization
    ('ẽ', "e\u{0303}"),
    ('õ', "o\u{0303}"),
    ('ũ', "u\u{0303}"),
    ('ã', "a\u{0303}"),
    ('ĩ', "i\u{0303}"),
    // centralization
    ('ë', "e\u{0308}"),
    ('ö', "o\u{0308}"),
    ('ü', "u\u{0308}"),
    ('ä', "a\u{0308}"),
    ('ï', "i\u{0308}"),
    ('ÿ', "y\u{0308}"),
    // tone
    ('í', "i\u{0302}"),
    ('ô', "o\u{0302}"),
    ('â', "a\u{0302}"),
    ('ê', "e\u{0302}"),
    // length typed as a colon
    (':', "\u{02D0}"),
];

/// A char-to-string substitution table.
///
/// No replacement contains a mapped char, so applying a map twice is the
/// same as applying it once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphemeMap {
    map: BTreeMap<char, String>,
}

impl Default for GraphemeMap {
    fn default() -> Self {
        Self {
            map: DEFAULT_PAIRS
                .iter()
                .map(|(from, to)| (*from, (*to).to_string()))
                .collect(),
        }
    }
}

impl GraphemeMap {
    /// Builds a custom map.
    ///
    /// # Errors
    /// Returns [`TiercheckError::InvalidConfig`] if a replacement contains a
    /// char that is itself mapped.
    pub fn new(pairs: impl IntoIterator<Item = (char, String)>) -> Result<Self, TiercheckError> {
        let map: BTreeMap<char, String> = pairs.into_iter().collect();
        for (from, to) in &map {
            if let Some(c) = to.chars().find(|c| map.contains_key(c)) {
                return Err(TiercheckError::InvalidConfig {
                    message: format!(
                        "grapheme replacement for {:?} contains mapped char {:?}",
                        from, c
                    ),
                });
            }
        }
        Ok(Self { map })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Substitutes char by char; unmapped chars pass through.
    pub fn apply(&self, label: &str) -> String {
        let mut out = String::with_capacity(label.len() + 4);
        for c in label.chars() {
            match self.map.get(&c) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(c),
            }
        }
        out
    }

    fn touches(&self, label: &str) -> bool {
        label.chars().any(|c| self.map.contains_key(&c))
    }
}

impl fmt::Display for GraphemeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (from, to) in &self.map {
            let codes: Vec<String> = to.chars().map(|c| format!("U+{:04X}", c as u32)).collect();
            writeln!(f, "{} (U+{:04X}) -> {}", from, *from as u32, codes.join(" "))?;
        }
        Ok(())
    }
}

/// Proposes a relabel for every entry containing a mapped char.
pub fn propose_grapheme_edits(tier: &Tier, map: &GraphemeMap) -> Vec<Edit> {
    tier.iter()
        .filter(|entry| map.touches(entry.label()))
        .map(|entry| Edit::Replace {
            old: entry.clone(),
            new_label: map.apply(entry.label()),
        })
        .collect()
}

/// Rewrites lookalike graphemes on one tier.
pub fn substitute_graphemes(
    annotation: &mut Annotation,
    tier_name: &str,
    map: &GraphemeMap,
) -> Result<AuditLog, CorrectionError> {
    let tier = annotation.require_tier_mut(tier_name)?;
    let edits = propose_grapheme_edits(tier, map);
    let log = apply_edits(tier, edits, AuditLog::new(tier_name, Pass::Grapheme))?;
    tracing::info!(tier = tier_name, changed = log.len(), "substituted graphemes");
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Interval;
    use crate::reference::{IpaInventory, IpaPredicate};

    #[test]
    fn default_map_produces_valid_ipa() {
        let map = GraphemeMap::default();
        let ipa = IpaInventory::new();
        let fixed = map.apply("ẽõũãĩëöüäïÿíôâê:");
        assert!(fixed.chars().all(|c| ipa.is_valid_ipa_char(c)), "{fixed}");
        assert_eq!(map.apply("kas"), "kas");
        assert_eq!(map.apply("a:"), "a\u{02D0}");
    }

    #[test]
    fn applying_twice_is_a_no_op() {
        let map = GraphemeMap::default();
        let once = map.apply("pôôpy mÿn:");
        assert_eq!(map.apply(&once), once);
    }

    #[test]
    fn custom_map_rejects_chained_replacements() {
        let err = GraphemeMap::new([('a', "b".to_string()), ('b', "c".to_string())]).unwrap_err();
        assert!(err.to_string().contains("mapped char"));
        assert!(GraphemeMap::new([('a', "e\u{0303}".to_string())]).is_ok());
    }

    #[test]
    fn substitution_logs_changed_entries_only() {
        let phone = Tier::new(
            "phone",
            vec![
                Interval::new(0.0, 0.1, "k").unwrap(),
                Interval::new(0.1, 0.2, "ẽ").unwrap(),
                Interval::new(0.2, 0.3, "a:").unwrap(),
            ],
        )
        .unwrap();
        let mut ann = Annotation::new(0.0, 0.3, vec![phone]);
        let log = substitute_graphemes(&mut ann, "phone", &GraphemeMap::default()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries[0].old_label, "ẽ");
        assert_eq!(log.entries[0].new_label.as_deref(), Some("e\u{0303}"));

        let labels: Vec<_> = ann.tier("phone").unwrap().iter().map(|i| i.label()).collect();
        assert_eq!(labels, vec!["k", "e\u{0303}", "a\u{02D0}"]);
    }

    #[test]
    fn missing_tier_is_structural() {
        let mut ann = Annotation::new(0.0, 1.0, vec![]);
        let err = substitute_graphemes(&mut ann, "phone", &GraphemeMap::default()).unwrap_err();
        assert!(matches!(err, CorrectionError::Structural(_)));
    }
}
