//! JSON serialization of the annotation model.
//!
//! This is not an interchange format; it exists for:
//! - Inspecting what the TextGrid reader actually produced
//! - Test fixtures that are easier to write by hand than TextGrids
//!
//! Interval and tier invariants are re-checked on deserialization, so a
//! hand-written file with overlapping intervals is rejected on load.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::model::Annotation;
use crate::error::TiercheckError;

/// Reads an annotation from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if any tier
/// violates the interval invariants.
pub fn read_annotation_json(path: &Path, include_empty: bool) -> Result<Annotation, TiercheckError> {
    let file = File::open(path).map_err(|source| TiercheckError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut annotation: Annotation =
        serde_json::from_reader(reader).map_err(|source| TiercheckError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    if !include_empty {
        annotation.drop_blank_intervals();
    }
    Ok(annotation.with_source_path(path))
}

/// Writes an annotation to a JSON file.
///
/// # Errors
/// Returns [`TiercheckError::OutputExists`] if the file exists and
/// `overwrite` is false, or an error if the file cannot be written.
pub fn write_annotation_json(
    path: &Path,
    annotation: &Annotation,
    overwrite: bool,
) -> Result<(), TiercheckError> {
    if !overwrite && path.exists() {
        return Err(TiercheckError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    let file = File::create(path).map_err(|source| TiercheckError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, annotation).map_err(|source| TiercheckError::JsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an annotation from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<Annotation, serde_json::Error> {
    serde_json::from_str(json)
}

/// Writes an annotation to a JSON string.
///
/// Useful for testing without file I/O.
pub fn to_json_string(annotation: &Annotation) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(annotation)
}
