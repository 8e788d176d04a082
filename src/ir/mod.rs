//! The time-aligned annotation model.
//!
//! This module defines the in-memory representation of a segmented
//! recording: [`Interval`]s grouped into [`Tier`]s grouped into an
//! [`Annotation`]. Every reader produces this model and every writer
//! consumes it.
//!
//! # Invariants
//!
//! 1. **Intervals**: finite bounds with `start < end`; immutable once built.
//!
//! 2. **Tiers**: sorted by start, non-overlapping. Mutations go through
//!    [`Tier::replace`], [`Tier::delete`] and [`Tier::insert`], which either
//!    keep the invariant or fail without touching the tier.
//!
//! 3. **Shape**: which tiers exist is *not* enforced by construction, so
//!    malformed files can still be loaded and reported on. Workflows state
//!    the shape they need with a [`ShapeRequirement`].
//!
//! # Example
//!
//! ```
//! use tiercheck::ir::{Annotation, Interval, Tier};
//!
//! let word = Tier::new(
//!     "word",
//!     vec![Interval::new(0.0, 0.4, "kas").unwrap()],
//! ).unwrap();
//! let annotation = Annotation::new(0.0, 1.0, vec![word]);
//! assert_eq!(annotation.tier("word").unwrap().len(), 1);
//! ```

mod interval;
pub mod io_json;
pub mod io_textgrid;
mod model;
mod tier;

// Re-export core types for convenient access
pub use interval::Interval;
pub use model::{
    check_tier_shape, Annotation, LoadOptions, ShapeRequirement, StructuralError,
    StructuralErrorKind, CANONICAL_TIERS, LOOKUP_TIERS, NOTES_TIER, PHONE_TIER, PHRASE_TIER,
    WORD_TIER,
};
pub use tier::{Tier, TierError, DEFAULT_END_TOLERANCE};
