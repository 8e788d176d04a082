//! Character-level IPA validity.
//!
//! Validation only needs a yes/no answer per character, so the inventory is
//! modelled as a predicate. [`IpaInventory`] is the built-in table; tests
//! and callers with a different inventory can pass any `Fn(char) -> bool`.

use std::collections::BTreeSet;

/// Decides whether a single character is a valid IPA symbol.
pub trait IpaPredicate: Send + Sync {
    fn is_valid_ipa_char(&self, c: char) -> bool;
}

impl<F> IpaPredicate for F
where
    F: Fn(char) -> bool + Send + Sync,
{
    fn is_valid_ipa_char(&self, c: char) -> bool {
        self(c)
    }
}

/// The built-in IPA inventory, optionally widened with extra characters.
///
/// Precomposed accented letters (`ẽ`, `ë`, `ô`, ...) are *not* members:
/// diacritics must be written as a base letter followed by a combining mark.
/// The grapheme substitution pass rewrites the common lookalikes.
#[derive(Clone, Debug, Default)]
pub struct IpaInventory {
    extra: BTreeSet<char>,
}

impl IpaInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `chars` in addition to the built-in table.
    pub fn with_extra_chars(chars: impl IntoIterator<Item = char>) -> Self {
        Self {
            extra: chars.into_iter().collect(),
        }
    }
}

impl IpaPredicate for IpaInventory {
    fn is_valid_ipa_char(&self, c: char) -> bool {
        is_builtin_ipa(c) || self.extra.contains(&c)
    }
}

fn is_builtin_ipa(c: char) -> bool {
    matches!(c,
        // base letters
        'a'..='z'
        | 'æ' | 'ç' | 'ð' | 'ø' | 'ħ' | 'ŋ' | 'œ'
        | 'β' | 'θ' | 'χ' | 'ⱱ'
        | '\u{0250}'..='\u{02AF}'
        // clicks
        | '\u{01C0}'..='\u{01C3}'
        // modifier letters: aspiration, length, stress, tone bars
        | '\u{02B0}'..='\u{02B8}'
        | 'ʼ' | '\u{02C0}' | '\u{02C1}' | '\u{02C8}' | '\u{02CC}'
        | '\u{02D0}' | '\u{02D1}' | '\u{02DE}'
        | '\u{02E0}'..='\u{02E9}'
        | '\u{02EC}' | '\u{02ED}' | '\u{207F}' | '\u{1D4A}'
        // combining diacritics
        | '\u{0300}'..='\u{0304}'
        | '\u{0306}' | '\u{0308}'
        | '\u{030A}'..='\u{030C}'
        | '\u{030F}'
        | '\u{0318}'..='\u{0320}'
        | '\u{0323}'..='\u{0325}'
        | '\u{0329}' | '\u{032A}' | '\u{032C}' | '\u{032F}' | '\u{0330}'
        | '\u{0334}'
        | '\u{0339}'..='\u{033D}'
        | '\u{035C}' | '\u{0361}'
        // suprasegmentals and intonation
        | '|' | '‖' | '.' | '‿' | '↓' | '↑' | '↗' | '↘'
    )
}
