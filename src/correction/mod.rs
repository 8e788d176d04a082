//! Auditable label corrections.
//!
//! Every pass works the same way: propose [`Edit`]s from a read-only view,
//! apply them through [`Tier::replace`](crate::ir::Tier::replace) and
//! [`Tier::delete`](crate::ir::Tier::delete), and record each change in an
//! [`AuditLog`]. Interval bounds are never touched, so a corrected tier
//! keeps the exact segmentation it was loaded with.
//!
//! Passes:
//! - [`substitute_graphemes`]: precomposed lookalikes to IPA sequences
//! - [`apply_pattern_replacements`]: ordered substring rules
//! - [`remove_degenerate_entries`]: drop too-short word entries
//! - [`recover_spellings`]: take misspelled words from the phrase tier
//!
//! [`fix_ipa`] and [`fix_tiers`] chain these into the two workflows the
//! CLI exposes.

mod degenerate;
mod edit;
mod graphemes;
mod log;
mod replace;
mod spelling;

pub use degenerate::{propose_deletions, remove_degenerate_entries, DEFAULT_MIN_WORD_CHARS};
pub use edit::{apply_edits, Edit};
pub use graphemes::{propose_grapheme_edits, substitute_graphemes, GraphemeMap};
pub use log::{AuditEntry, AuditLog, Pass, NONE_LABEL};
pub use replace::{apply_pattern_replacements, default_rules, propose_replacements, ReplacementRule};
pub use spelling::{propose_spelling_edits, recover_spellings, CarrierPrefix, SpellingOptions};

use thiserror::Error;

use crate::ir::{Annotation, StructuralError, TierError, PHONE_TIER, PHRASE_TIER, WORD_TIER};
use crate::reference::Orthography;

/// A correction pass could not run or could not finish.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// A tier the pass needs is missing.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// An edit failed to apply. Earlier edits of the same pass stay applied
    /// and are recorded in `partial`.
    #[error(
        "{} pass on tier '{}' stopped after {} change(s): {source}",
        .partial.pass,
        .partial.tier,
        .partial.len()
    )]
    Apply {
        partial: AuditLog,
        #[source]
        source: TierError,
    },
}

/// Settings for [`fix_tiers`].
#[derive(Clone, Debug)]
pub struct TierFixOptions {
    pub replacements: Vec<ReplacementRule>,
    /// Tiers the replacement rules run on, in order.
    pub replace_tiers: Vec<String>,
    pub min_word_chars: usize,
    pub spelling: SpellingOptions,
}

impl Default for TierFixOptions {
    fn default() -> Self {
        Self {
            replacements: default_rules(),
            replace_tiers: vec![PHRASE_TIER.to_string(), WORD_TIER.to_string()],
            min_word_chars: DEFAULT_MIN_WORD_CHARS,
            spelling: SpellingOptions::default(),
        }
    }
}

/// Runs grapheme substitution on each of `tiers`.
///
/// Returns one log per tier, in order.
pub fn fix_ipa(
    annotation: &mut Annotation,
    map: &GraphemeMap,
    tiers: &[String],
) -> Result<Vec<AuditLog>, CorrectionError> {
    tiers
        .iter()
        .map(|tier| substitute_graphemes(annotation, tier, map))
        .collect()
}

/// Default tiers for [`fix_ipa`].
pub fn default_grapheme_tiers() -> Vec<String> {
    vec![PHONE_TIER.to_string()]
}

/// Cleans the word and phrase tiers.
///
/// Order: replacement rules on each configured tier, then degenerate word
/// removal, then spelling recovery against `orthography`. Returns every
/// log in the order the passes ran.
pub fn fix_tiers(
    annotation: &mut Annotation,
    orthography: &Orthography,
    opts: &TierFixOptions,
) -> Result<Vec<AuditLog>, CorrectionError> {
    let mut logs = Vec::with_capacity(opts.replace_tiers.len() + 2);
    for tier in &opts.replace_tiers {
        logs.push(apply_pattern_replacements(annotation, tier, &opts.replacements)?);
    }
    logs.push(remove_degenerate_entries(annotation, opts.min_word_chars)?);
    logs.push(recover_spellings(annotation, orthography, &opts.spelling)?);
    Ok(logs)
}
