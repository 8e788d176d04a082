//! Run configuration.
//!
//! Every setting has a default that reproduces the original field-recording
//! workflow, so a config file is only needed to change something. Command
//! line flags override the file.
//!
//! # File format
//!
//! YAML, all keys optional:
//!
//! ```yaml
//! include_empty: false
//! end_tolerance: 0.01
//! min_word_chars: 2
//! carrier_prefix: [inkj, kas]
//! replacements:
//!   - { pattern: "ː", replacement: "" }
//!   - { pattern: "_", replacement: " " }
//! replace_tiers: [phrase, word]
//! grapheme_tiers: [phone]
//! grapheme_map: { ":": "ː" }
//! extra_ipa_chars: "?"
//! suffix: textgrid
//! log_prefix: file_stem
//! min_silence: 0.3
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::correction::{
    default_grapheme_tiers, default_rules, CarrierPrefix, GraphemeMap, ReplacementRule,
    SpellingOptions, TierFixOptions, DEFAULT_MIN_WORD_CHARS,
};
use crate::error::TiercheckError;
use crate::index::{FinalVowelOptions, DEFAULT_MIN_SILENCE};
use crate::ir::{DEFAULT_END_TOLERANCE, PHRASE_TIER, WORD_TIER};
use crate::reference::IpaInventory;

/// How audit log file names are prefixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogPrefix {
    /// The whole file stem: `rec_01.TextGrid` logs as `rec_01_...`.
    #[default]
    FileStem,
    /// The name up to its first `_`: `rec_01.TextGrid` logs as `rec_...`.
    FirstUnderscore,
}

impl LogPrefix {
    pub fn for_path(self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self {
            LogPrefix::FileStem => stem,
            LogPrefix::FirstUnderscore => {
                let name = path
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match name.split_once('_') {
                    Some((head, _)) => head.to_string(),
                    None => stem,
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Keep empty-labelled intervals when loading.
    pub include_empty: bool,
    /// Seconds within which a word end and a phrase end are the same time.
    pub end_tolerance: f64,
    /// Word entries shorter than this (in chars) are deleted.
    pub min_word_chars: usize,
    pub carrier_prefix: CarrierPrefix,
    pub replacements: Vec<ReplacementRule>,
    pub replace_tiers: Vec<String>,
    pub grapheme_tiers: Vec<String>,
    /// Overrides the built-in grapheme map when non-empty.
    pub grapheme_map: BTreeMap<char, String>,
    /// Characters accepted as IPA on top of the built-in inventory.
    pub extra_ipa_chars: String,
    /// Case-insensitive file name suffix for directory scans.
    pub suffix: String,
    pub log_prefix: LogPrefix,
    /// Minimum silence after a phrase-final vowel, in seconds.
    pub min_silence: f64,
    /// Overrides the built-in vowel set for phrase-final detection.
    pub vowels: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_empty: false,
            end_tolerance: DEFAULT_END_TOLERANCE,
            min_word_chars: DEFAULT_MIN_WORD_CHARS,
            carrier_prefix: CarrierPrefix::default(),
            replacements: default_rules(),
            replace_tiers: vec![PHRASE_TIER.to_string(), WORD_TIER.to_string()],
            grapheme_tiers: default_grapheme_tiers(),
            grapheme_map: BTreeMap::new(),
            extra_ipa_chars: String::new(),
            suffix: "textgrid".to_string(),
            log_prefix: LogPrefix::default(),
            min_silence: DEFAULT_MIN_SILENCE,
            vowels: None,
        }
    }
}

impl Config {
    /// Reads and validates a YAML config file.
    pub fn load(path: &Path) -> Result<Self, TiercheckError> {
        let text = fs::read_to_string(path).map_err(|source| TiercheckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_yaml::from_str(&text).map_err(|source| TiercheckError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Parses a YAML string without validating it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Rejects settings no pass can run with.
    pub fn validate(&self) -> Result<(), TiercheckError> {
        let invalid = |message: String| Err(TiercheckError::InvalidConfig { message });

        if !self.end_tolerance.is_finite() || self.end_tolerance < 0.0 {
            return invalid(format!(
                "end_tolerance must be a finite, non-negative number (got {})",
                self.end_tolerance
            ));
        }
        if self.min_word_chars == 0 {
            return invalid("min_word_chars must be at least 1".to_string());
        }
        if self.carrier_prefix.is_empty()
            || self.carrier_prefix.tokens().iter().any(|t| t.is_empty())
        {
            return invalid("carrier_prefix must list at least one non-empty token".to_string());
        }
        if !self.min_silence.is_finite() || self.min_silence < 0.0 {
            return invalid(format!(
                "min_silence must be a finite, non-negative number (got {})",
                self.min_silence
            ));
        }
        if self.suffix.is_empty() {
            return invalid("suffix must not be empty".to_string());
        }
        if self.vowels.as_deref().is_some_and(str::is_empty) {
            return invalid("vowels must not be empty when given".to_string());
        }
        for rule in &self.replacements {
            rule.check()?;
        }
        self.grapheme_map()?;
        Ok(())
    }

    pub fn grapheme_map(&self) -> Result<GraphemeMap, TiercheckError> {
        if self.grapheme_map.is_empty() {
            Ok(GraphemeMap::default())
        } else {
            GraphemeMap::new(self.grapheme_map.clone())
        }
    }

    pub fn ipa_inventory(&self) -> IpaInventory {
        IpaInventory::with_extra_chars(self.extra_ipa_chars.chars())
    }

    pub fn tier_fix_options(&self) -> TierFixOptions {
        TierFixOptions {
            replacements: self.replacements.clone(),
            replace_tiers: self.replace_tiers.clone(),
            min_word_chars: self.min_word_chars,
            spelling: SpellingOptions {
                carrier: self.carrier_prefix.clone(),
                end_tolerance: self.end_tolerance,
            },
        }
    }

    pub fn final_vowel_options(&self) -> FinalVowelOptions {
        let defaults = FinalVowelOptions::default();
        FinalVowelOptions {
            min_silence: self.min_silence,
            vowels: match &self.vowels {
                Some(v) => v.chars().collect::<BTreeSet<char>>(),
                None => defaults.vowels,
            },
        }
    }
}
