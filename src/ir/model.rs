//! The tiered recording: a named, ordered collection of tiers.
//!
//! An [`Annotation`] owns its tiers outright. Interval-level invariants are
//! enforced by [`Tier`] at construction and on every mutation; the tier
//! *shape* (which tiers exist and in what order) is checked separately
//! against a [`ShapeRequirement`], so that the validator can load any file
//! and report its shape instead of refusing it.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tier::Tier;
use super::{io_json, io_textgrid};
use crate::error::TiercheckError;

pub const PHONE_TIER: &str = "phone";
pub const WORD_TIER: &str = "word";
pub const PHRASE_TIER: &str = "phrase";
pub const NOTES_TIER: &str = "notes";

/// Tier names, in the order a fully annotated recording declares them.
pub const CANONICAL_TIERS: [&str; 4] = [PHONE_TIER, WORD_TIER, PHRASE_TIER, NOTES_TIER];

/// Tiers that point-lookup workflows need; `notes` is optional there.
pub const LOOKUP_TIERS: [&str; 3] = [PHONE_TIER, WORD_TIER, PHRASE_TIER];

/// How strictly a loaded annotation's tier layout is checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeRequirement {
    /// Exactly `phone`, `word`, `phrase`, `notes`, in that order.
    #[default]
    Strict,
    /// At least `phone`, `word` and `phrase`, in any order.
    Lenient,
    /// No shape requirement.
    Unchecked,
}

/// Options controlling how an annotation file is loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOptions {
    /// Keep intervals whose label is blank (silence). When false they are
    /// dropped at load time.
    pub include_empty: bool,
    /// Tier layout required of the file.
    pub shape: ShapeRequirement,
}

impl LoadOptions {
    pub fn new(include_empty: bool, shape: ShapeRequirement) -> Self {
        Self {
            include_empty,
            shape,
        }
    }
}

/// Which tier-shape check failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum StructuralErrorKind {
    /// Wrong number of tiers.
    TierCount { expected: String, actual: usize },
    /// Required tier names are missing, or unexpected names are present.
    TierNames {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    /// Names are right but declared in the wrong order.
    TierOrder,
    /// A specific tier needed by an operation is absent.
    MissingTier { name: String },
}

impl fmt::Display for StructuralErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralErrorKind::TierCount { expected, actual } => {
                write!(f, "wrong tier count: expected {}, found {}", expected, actual)
            }
            StructuralErrorKind::TierNames {
                missing,
                unexpected,
            } => {
                write!(f, "wrong tier names")?;
                if !missing.is_empty() {
                    write!(f, ": missing {:?}", missing)?;
                }
                if !unexpected.is_empty() {
                    write!(f, ": unexpected {:?}", unexpected)?;
                }
                Ok(())
            }
            StructuralErrorKind::TierOrder => write!(
                f,
                "wrong tier order: expected {:?}",
                CANONICAL_TIERS
            ),
            StructuralErrorKind::MissingTier { name } => {
                write!(f, "missing required tier '{}'", name)
            }
        }
    }
}

/// A tier-shape invariant violation, with the tiers actually present.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[error("{kind}; tiers present: {found:?}")]
pub struct StructuralError {
    pub kind: StructuralErrorKind,
    pub found: Vec<String>,
}

/// Checks a declared tier-name list against a shape requirement.
///
/// Checks run in order: count, then names (as a set), then order (strict
/// only). The first failing check is reported.
pub fn check_tier_shape(
    names: &[&str],
    requirement: ShapeRequirement,
) -> Result<(), StructuralError> {
    let found = || names.iter().map(|n| n.to_string()).collect::<Vec<_>>();

    let required: &[&str] = match requirement {
        ShapeRequirement::Unchecked => return Ok(()),
        ShapeRequirement::Strict => &CANONICAL_TIERS,
        ShapeRequirement::Lenient => &LOOKUP_TIERS,
    };

    let count_ok = match requirement {
        ShapeRequirement::Strict => names.len() == CANONICAL_TIERS.len(),
        _ => names.len() >= LOOKUP_TIERS.len(),
    };
    if !count_ok {
        let expected = match requirement {
            ShapeRequirement::Strict => CANONICAL_TIERS.len().to_string(),
            _ => format!("at least {}", LOOKUP_TIERS.len()),
        };
        return Err(StructuralError {
            kind: StructuralErrorKind::TierCount {
                expected,
                actual: names.len(),
            },
            found: found(),
        });
    }

    let present: BTreeSet<&str> = names.iter().copied().collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !present.contains(*name))
        .map(|name| name.to_string())
        .collect();
    let unexpected: Vec<String> = if requirement == ShapeRequirement::Strict {
        present
            .iter()
            .filter(|name| !CANONICAL_TIERS.contains(name))
            .map(|name| name.to_string())
            .collect()
    } else {
        Vec::new()
    };
    // Four tiers with a duplicated canonical name also lands here.
    let duplicated = requirement == ShapeRequirement::Strict && present.len() != names.len();
    if !missing.is_empty() || !unexpected.is_empty() || duplicated {
        return Err(StructuralError {
            kind: StructuralErrorKind::TierNames {
                missing,
                unexpected,
            },
            found: found(),
        });
    }

    if requirement == ShapeRequirement::Strict && names != &CANONICAL_TIERS[..] {
        return Err(StructuralError {
            kind: StructuralErrorKind::TierOrder,
            found: found(),
        });
    }

    Ok(())
}

/// A time-aligned annotation of one recording.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Annotation {
    /// Start of the annotated time domain.
    pub xmin: f64,

    /// End of the annotated time domain.
    pub xmax: f64,

    tiers: Vec<Tier>,

    #[serde(skip)]
    source_path: Option<PathBuf>,
}

impl Annotation {
    /// Creates an annotation over `[xmin, xmax]` with tiers in declared order.
    ///
    /// No shape requirement is applied; see [`Annotation::check_shape`].
    pub fn new(xmin: f64, xmax: f64, tiers: Vec<Tier>) -> Self {
        Self {
            xmin,
            xmax,
            tiers,
            source_path: None,
        }
    }

    /// Loads an annotation file and checks its tier shape.
    ///
    /// Files ending in `.json` are read as the JSON model; anything else is
    /// read as a Praat TextGrid.
    ///
    /// # Errors
    /// Returns a read/parse error if the file cannot be loaded, or
    /// [`TiercheckError::Structural`] naming the failed check and the tiers
    /// present if the shape requirement is not met.
    pub fn load(path: &Path, opts: &LoadOptions) -> Result<Self, TiercheckError> {
        let annotation = if is_json_path(path) {
            io_json::read_annotation_json(path, opts.include_empty)?
        } else {
            io_textgrid::read_textgrid(path, opts.include_empty)?
        };

        annotation
            .check_shape(opts.shape)
            .map_err(|source| TiercheckError::structural(path, source))?;

        tracing::debug!(
            path = %path.display(),
            tiers = ?annotation.tier_names(),
            "loaded annotation"
        );
        Ok(annotation)
    }

    /// Writes the annotation, picking the format from the extension.
    ///
    /// # Errors
    /// Returns [`TiercheckError::OutputExists`] if `path` exists and
    /// `overwrite` is false, or a write error.
    pub fn save(&self, path: &Path, overwrite: bool) -> Result<(), TiercheckError> {
        if is_json_path(path) {
            io_json::write_annotation_json(path, self, overwrite)
        } else {
            io_textgrid::write_textgrid(path, self, overwrite)
        }
    }

    /// Records where this annotation was loaded from.
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// File name used in reports (`<memory>` when not loaded from disk).
    pub fn display_name(&self) -> String {
        self.source_path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<memory>".to_string())
    }

    /// Tiers in declared order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Declared tier names, in order.
    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// The first tier with the given name.
    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name() == name)
    }

    /// Mutable access to a tier. Tiers only expose invariant-preserving
    /// mutations, so handing out `&mut Tier` cannot corrupt ordering.
    pub fn tier_mut(&mut self, name: &str) -> Option<&mut Tier> {
        self.tiers.iter_mut().find(|t| t.name() == name)
    }

    /// The named tier, or a [`StructuralError`] naming it.
    pub fn require_tier(&self, name: &str) -> Result<&Tier, StructuralError> {
        self.tier(name).ok_or_else(|| self.missing_tier(name))
    }

    /// Mutable variant of [`Annotation::require_tier`].
    pub fn require_tier_mut(&mut self, name: &str) -> Result<&mut Tier, StructuralError> {
        match self.tiers.iter().position(|t| t.name() == name) {
            Some(idx) => Ok(&mut self.tiers[idx]),
            None => Err(self.missing_tier(name)),
        }
    }

    /// Checks the tier layout against a shape requirement.
    pub fn check_shape(&self, requirement: ShapeRequirement) -> Result<(), StructuralError> {
        check_tier_shape(&self.tier_names(), requirement)
    }

    /// Sum of all tier revisions; changes whenever any tier is mutated.
    pub fn revision(&self) -> u64 {
        self.tiers.iter().map(Tier::revision).sum()
    }

    /// Drops blank intervals from every tier.
    pub(crate) fn drop_blank_intervals(&mut self) {
        for tier in &mut self.tiers {
            tier.drop_blank();
        }
    }

    fn missing_tier(&self, name: &str) -> StructuralError {
        StructuralError {
            kind: StructuralErrorKind::MissingTier {
                name: name.to_string(),
            },
            found: self.tier_names().iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl PartialEq for Annotation {
    /// Compares content only; where the annotation was loaded from is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.xmin == other.xmin && self.xmax == other.xmax && self.tiers == other.tiers
    }
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
