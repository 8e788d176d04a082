//! Phrase-final vowel detection on the phone tier.
//!
//! A vowel counts as phrase-final when the silence after it, up to the next
//! labelled phone or the end of the recording, lasts at least
//! [`FinalVowelOptions::min_silence`]. Silence is either an empty-labelled
//! interval, a gap between intervals, or any run of both.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::ir::{Annotation, Interval, StructuralError, PHONE_TIER};

/// Default minimum silence after a phrase-final vowel, in seconds.
pub const DEFAULT_MIN_SILENCE: f64 = 0.3;

const DEFAULT_VOWELS: &str = "aeiouyæøœɐɑɒɔəɘɛɜɞɤɨɪɯɵɶʉʊʌʏ";

#[derive(Clone, Debug)]
pub struct FinalVowelOptions {
    pub min_silence: f64,
    /// A phone is a vowel when its first character is in this set.
    pub vowels: BTreeSet<char>,
}

impl Default for FinalVowelOptions {
    fn default() -> Self {
        Self {
            min_silence: DEFAULT_MIN_SILENCE,
            vowels: DEFAULT_VOWELS.chars().collect(),
        }
    }
}

impl FinalVowelOptions {
    fn is_vowel(&self, label: &str) -> bool {
        label
            .trim_start()
            .chars()
            .next()
            .is_some_and(|c| self.vowels.contains(&c))
    }
}

/// A vowel phone and the silence that follows it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinalVowel {
    pub interval: Interval,
    pub silence: f64,
}

/// Finds phrase-final vowels on the phone tier, in time order.
///
/// # Errors
/// Returns a [`StructuralError`] if the annotation has no phone tier.
pub fn phrase_final_vowels(
    annotation: &Annotation,
    opts: &FinalVowelOptions,
) -> Result<Vec<FinalVowel>, StructuralError> {
    let phones = annotation.require_tier(PHONE_TIER)?.entries();

    let finals = phones
        .iter()
        .enumerate()
        .filter(|(_, phone)| !phone.is_blank() && opts.is_vowel(phone.label()))
        .filter_map(|(idx, phone)| {
            let resume = phones[idx + 1..]
                .iter()
                .find(|next| !next.is_blank())
                .map_or(annotation.xmax, Interval::start);
            let silence = resume - phone.end();
            (silence >= opts.min_silence).then(|| FinalVowel {
                interval: phone.clone(),
                silence,
            })
        })
        .collect();

    Ok(finals)
}
