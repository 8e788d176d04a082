//! Annotation validation.
//!
//! Three independent checks, each recorded separately in the report:
//! - Tier shape: exactly `phone`, `word`, `phrase`, `notes`, in that order
//! - Words: every non-empty word label is in the orthography
//! - Phones: every character of every non-empty phone label is valid IPA
//!
//! Validation never fails; it loads with [`ShapeRequirement::Unchecked`]
//! and describes whatever it finds.

mod report;

pub use report::{
    invalid_items_report_name, validity_report_name, write_invalid_items, write_validity_rows,
    InvalidItem, IssueCode, IssueContext, PhoneValidity, ReportFormat, ReportWithIssues,
    Severity, ValidationIssue, ValidityReport, ValidityRow, WordCheck, WordValidity,
};

use std::collections::BTreeSet;

use crate::ir::{Annotation, ShapeRequirement, PHONE_TIER, WORD_TIER};
use crate::reference::{IpaPredicate, Orthography};

/// Validates an annotation against an optional orthography and an IPA
/// predicate.
pub fn validate_annotation(
    annotation: &Annotation,
    orthography: Option<&Orthography>,
    ipa: &dyn IpaPredicate,
) -> ValidityReport {
    let file_name = annotation
        .source_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| annotation.display_name());

    ValidityReport {
        file_name,
        tier_names: annotation
            .tier_names()
            .into_iter()
            .map(String::from)
            .collect(),
        structure: annotation.check_shape(ShapeRequirement::Strict).err(),
        words: validate_words(annotation, orthography),
        phones: validate_phones(annotation, ipa),
    }
}

/// Checks word spellings.
///
/// Without an orthography the check is skipped and reported as such. With
/// one, a missing word tier is invalid. Labels are trimmed before lookup;
/// empty labels are ignored.
pub fn validate_words(annotation: &Annotation, orthography: Option<&Orthography>) -> WordValidity {
    let Some(orthography) = orthography else {
        return WordValidity {
            check: WordCheck::SkippedNoOrthography,
            tier_present: annotation.tier(WORD_TIER).is_some(),
            invalid_words: BTreeSet::new(),
            invalid_entries: Vec::new(),
        };
    };

    let Some(tier) = annotation.tier(WORD_TIER) else {
        return WordValidity {
            check: WordCheck::Checked,
            tier_present: false,
            invalid_words: BTreeSet::new(),
            invalid_entries: Vec::new(),
        };
    };

    let mut invalid_words = BTreeSet::new();
    let mut invalid_entries = Vec::new();
    for entry in tier.iter().filter(|e| !e.is_blank()) {
        let word = entry.label().trim();
        if !orthography.contains(word) {
            invalid_words.insert(word.to_string());
            invalid_entries.push(entry.clone());
        }
    }

    WordValidity {
        check: WordCheck::Checked,
        tier_present: true,
        invalid_words,
        invalid_entries,
    }
}

/// Checks every character of every non-empty phone label.
///
/// An entry with several bad characters is listed once.
pub fn validate_phones(annotation: &Annotation, ipa: &dyn IpaPredicate) -> PhoneValidity {
    let Some(tier) = annotation.tier(PHONE_TIER) else {
        return PhoneValidity {
            tier_present: false,
            invalid_phones: BTreeSet::new(),
            invalid_entries: Vec::new(),
        };
    };

    let mut invalid_phones = BTreeSet::new();
    let mut invalid_entries = Vec::new();
    for entry in tier.iter().filter(|e| !e.is_blank()) {
        let mut bad = false;
        for c in entry.label().chars().filter(|c| !ipa.is_valid_ipa_char(*c)) {
            invalid_phones.insert(c);
            bad = true;
        }
        if bad {
            invalid_entries.push(entry.clone());
        }
    }

    PhoneValidity {
        tier_present: true,
        invalid_phones,
        invalid_entries,
    }
}
