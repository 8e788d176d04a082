//! Proposed edits and their application.
//!
//! Passes first compute a list of [`Edit`]s from an immutable view of the
//! annotation, then [`apply_edits`] writes them through the tier's
//! invariant-preserving mutators and records each one in the audit log.

use serde::Serialize;

use super::log::{AuditEntry, AuditLog};
use super::CorrectionError;
use crate::ir::{Interval, Tier};

/// One proposed change to a tier entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Edit {
    /// Relabel `old`, keeping its span.
    Replace { old: Interval, new_label: String },
    /// Remove `old`.
    Delete { old: Interval },
    /// `old` needs a fix but none was found; logged, tier untouched.
    Unresolved { old: Interval },
}

impl Edit {
    pub fn old(&self) -> &Interval {
        match self {
            Edit::Replace { old, .. } | Edit::Delete { old } | Edit::Unresolved { old } => old,
        }
    }

    fn audit_entry(&self) -> AuditEntry {
        match self {
            Edit::Replace { old, new_label } => AuditEntry::new(old, Some(new_label.clone())),
            Edit::Delete { old } | Edit::Unresolved { old } => AuditEntry::new(old, None),
        }
    }
}

/// Applies edits in order, logging each successful one.
///
/// Stops at the first failing edit. Edits applied before the failure stay
/// applied and are in the partial log carried by the error.
pub fn apply_edits(
    tier: &mut Tier,
    edits: Vec<Edit>,
    mut log: AuditLog,
) -> Result<AuditLog, CorrectionError> {
    for edit in edits {
        let result = match &edit {
            Edit::Replace { old, new_label } => tier.replace(old, old.with_label(new_label.as_str())),
            Edit::Delete { old } => tier.delete(old).map(|_| ()),
            Edit::Unresolved { .. } => Ok(()),
        };
        if let Err(source) = result {
            tracing::warn!(
                tier = %log.tier,
                pass = %log.pass,
                applied = log.len(),
                error = %source,
                "correction pass stopped early"
            );
            return Err(CorrectionError::Apply {
                partial: log,
                source,
            });
        }
        log.push(edit.audit_entry());
    }
    Ok(log)
}
