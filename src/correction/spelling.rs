//! Cross-tier spelling recovery.
//!
//! Recordings are elicited with a carrier sentence ("inkja kas ..."), and
//! the phrase tier usually holds a correct transcription of the whole
//! sentence. A misspelled word entry can be recovered from the phrase that
//! ends at the same time by stripping the carrier tokens.

use serde::{Deserialize, Serialize};

use super::edit::{apply_edits, Edit};
use super::log::{AuditLog, Pass};
use super::CorrectionError;
use crate::ir::{Annotation, Tier, DEFAULT_END_TOLERANCE, PHRASE_TIER, WORD_TIER};
use crate::reference::Orthography;

/// Token prefixes that introduce the target word in a phrase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierPrefix(Vec<String>);

impl Default for CarrierPrefix {
    fn default() -> Self {
        Self(vec!["inkj".to_string(), "kas".to_string()])
    }
}

impl CarrierPrefix {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The phrase with the carrier removed, or `None` if the phrase does not
    /// start with the carrier or has nothing after it.
    ///
    /// Each phrase token only has to start with the matching prefix token,
    /// so inflected carriers still match.
    pub fn extract_word(&self, phrase: &str) -> Option<String> {
        let tokens: Vec<&str> = phrase.split_whitespace().collect();
        if tokens.len() <= self.0.len() {
            return None;
        }
        let carrier_matches = self
            .0
            .iter()
            .zip(&tokens)
            .all(|(prefix, token)| token.starts_with(prefix.as_str()));
        carrier_matches.then(|| tokens[self.0.len()..].join(" "))
    }
}

#[derive(Clone, Debug)]
pub struct SpellingOptions {
    pub carrier: CarrierPrefix,
    /// How far apart word and phrase ends may be and still match.
    pub end_tolerance: f64,
}

impl Default for SpellingOptions {
    fn default() -> Self {
        Self {
            carrier: CarrierPrefix::default(),
            end_tolerance: DEFAULT_END_TOLERANCE,
        }
    }
}

/// Proposes a fix for every word entry missing from the orthography.
///
/// Entries with no usable phrase become [`Edit::Unresolved`] so they still
/// show up in the log.
pub fn propose_spelling_edits(
    words: &Tier,
    phrases: &Tier,
    orthography: &Orthography,
    opts: &SpellingOptions,
) -> Vec<Edit> {
    words
        .iter()
        .filter(|entry| !entry.is_blank() && !orthography.contains(entry.label().trim()))
        .map(|entry| {
            let candidate = phrases
                .find_at_endtime(entry.end(), opts.end_tolerance)
                .and_then(|phrase| opts.carrier.extract_word(phrase.label()));
            match candidate {
                Some(new_label) => Edit::Replace {
                    old: entry.clone(),
                    new_label,
                },
                None => Edit::Unresolved { old: entry.clone() },
            }
        })
        .collect()
}

/// Replaces misspelled words with the spelling found on the phrase tier.
pub fn recover_spellings(
    annotation: &mut Annotation,
    orthography: &Orthography,
    opts: &SpellingOptions,
) -> Result<AuditLog, CorrectionError> {
    let edits = {
        let words = annotation.require_tier(WORD_TIER)?;
        let phrases = annotation.require_tier(PHRASE_TIER)?;
        propose_spelling_edits(words, phrases, orthography, opts)
    };
    let unresolved = edits
        .iter()
        .filter(|e| matches!(e, Edit::Unresolved { .. }))
        .count();

    let words = annotation.require_tier_mut(WORD_TIER)?;
    let log = apply_edits(words, edits, AuditLog::new(WORD_TIER, Pass::Typo))?;
    tracing::info!(
        recovered = log.len() - unresolved,
        unresolved,
        "recovered spellings from phrase tier"
    );
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Interval;

    fn iv(start: f64, end: f64, label: &str) -> Interval {
        Interval::new(start, end, label).unwrap()
    }

    #[test]
    fn carrier_is_stripped() {
        let carrier = CarrierPrefix::default();
        assert_eq!(carrier.extract_word("inkja kas pjo"), Some("pjo".into()));
        assert_eq!(
            carrier.extract_word("  inkjë  kasa sïï   pjo "),
            Some("sïï pjo".into())
        );
        assert_eq!(carrier.extract_word("inkja kas"), None);
        assert_eq!(carrier.extract_word("kas inkja pjo"), None);
        assert_eq!(carrier.extract_word(""), None);
    }

    #[test]
    fn custom_carrier() {
        let carrier = CarrierPrefix::new(["say"]);
        assert_eq!(carrier.extract_word("say it again"), Some("it again".into()));
        assert_eq!(carrier.extract_word("say"), None);
    }

    fn recording(word: &str, phrase: &str, phrase_end: f64) -> Annotation {
        Annotation::new(
            0.0,
            2.0,
            vec![
                Tier::empty("phone"),
                Tier::new("word", vec![iv(0.6, 1.0, word)]).unwrap(),
                Tier::new("phrase", vec![iv(0.0, phrase_end, phrase)]).unwrap(),
                Tier::empty("notes"),
            ],
        )
    }

    #[test]
    fn misspelled_word_is_recovered() {
        let ortho = Orthography::from_words(["pjo"]);
        let mut ann = recording("pyo", "inkja kas pjo", 1.005);
        let log = recover_spellings(&mut ann, &ortho, &SpellingOptions::default()).unwrap();
        assert_eq!(ann.tier("word").unwrap().entries()[0].label(), "pjo");
        assert_eq!(log.entries[0].old_label, "pyo");
        assert_eq!(log.entries[0].new_label.as_deref(), Some("pjo"));
    }

    #[test]
    fn phrase_too_far_away_is_unresolved() {
        let ortho = Orthography::from_words(["pjo"]);
        let mut ann = recording("pyo", "inkja kas pjo", 1.05);
        let log = recover_spellings(&mut ann, &ortho, &SpellingOptions::default()).unwrap();
        assert_eq!(ann.tier("word").unwrap().entries()[0].label(), "pyo");
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries[0].new_label, None);
    }

    #[test]
    fn known_words_are_left_alone() {
        let ortho = Orthography::from_words(["pjo"]);
        let mut ann = recording(" pjo", "inkja kas pyo", 1.0);
        let log = recover_spellings(&mut ann, &ortho, &SpellingOptions::default()).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn missing_phrase_tier_is_structural() {
        let ortho = Orthography::from_words(["pjo"]);
        let mut ann = Annotation::new(0.0, 1.0, vec![Tier::empty("word")]);
        let err = recover_spellings(&mut ann, &ortho, &SpellingOptions::default()).unwrap_err();
        assert!(matches!(err, CorrectionError::Structural(_)));
    }
}
