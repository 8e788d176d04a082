//! Audit logs for correction passes.
//!
//! Every pass records one entry per change (or per failed recovery) and the
//! log is written as TSV next to the corrected file, header always present.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::TiercheckError;
use crate::ir::Interval;

/// Rendered in place of a new label when a recovery found nothing.
pub const NONE_LABEL: &str = "NONE";

const HEADER: [&str; 4] = ["START", "END", "OLD_LABEL", "NEW_LABEL"];

/// Which correction pass produced a log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Grapheme,
    PatternReplace,
    Deletion,
    Typo,
}

impl Pass {
    fn suffix(self) -> &'static str {
        match self {
            Pass::Grapheme => "grapheme",
            Pass::PatternReplace => "pattern_replace",
            Pass::Deletion => "deletion",
            Pass::Typo => "typo",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One logged change.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditEntry {
    pub start: f64,
    pub end: f64,
    pub old_label: String,
    /// `None` for deletions and unresolved recoveries.
    pub new_label: Option<String>,
}

impl AuditEntry {
    pub fn new(entry: &Interval, new_label: Option<String>) -> Self {
        Self {
            start: entry.start(),
            end: entry.end(),
            old_label: entry.label().to_string(),
            new_label,
        }
    }
}

/// The changes one pass made to one tier.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditLog {
    pub tier: String,
    pub pass: Pass,
    pub entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new(tier: impl Into<String>, pass: Pass) -> Self {
        Self {
            tier: tier.into(),
            pass,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `<prefix>_<tier>_tier_<pass>_log.tsv`
    pub fn file_name(&self, prefix: &str) -> String {
        format!("{}_{}_tier_{}_log.tsv", prefix, self.tier, self.pass.suffix())
    }

    /// Writes the log as TSV.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(HEADER)?;
        for entry in &self.entries {
            wtr.write_record([
                entry.start.to_string().as_str(),
                entry.end.to_string().as_str(),
                entry.old_label.as_str(),
                entry.new_label.as_deref().unwrap_or(NONE_LABEL),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_tsv_string(&self) -> Result<String, csv::Error> {
        let mut buf = Vec::new();
        self.write_tsv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Writes the log into `dir` under [`AuditLog::file_name`].
    pub fn save(&self, dir: &Path, prefix: &str) -> Result<PathBuf, TiercheckError> {
        let path = dir.join(self.file_name(prefix));
        let file = File::create(&path).map_err(|source| TiercheckError::Write {
            path: path.clone(),
            source,
        })?;
        self.write_tsv(file)
            .map_err(|source| TiercheckError::ReportWrite {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), entries = self.len(), "wrote audit log");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_still_has_header() {
        let log = AuditLog::new("word", Pass::Deletion);
        assert_eq!(
            log.to_tsv_string().unwrap(),
            "START\tEND\tOLD_LABEL\tNEW_LABEL\n"
        );
    }

    #[test]
    fn missing_new_label_renders_as_none() {
        let mut log = AuditLog::new("word", Pass::Typo);
        let entry = Interval::new(1.5, 2.0, "kaz").unwrap();
        log.push(AuditEntry::new(&entry, None));
        log.push(AuditEntry::new(&entry, Some("kas".into())));
        let text = log.to_tsv_string().unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1], "1.5\t2\tkaz\tNONE");
        assert_eq!(lines[2], "1.5\t2\tkaz\tkas");
    }

    #[test]
    fn file_names_follow_tier_and_pass() {
        assert_eq!(
            AuditLog::new("phone", Pass::Grapheme).file_name("rec"),
            "rec_phone_tier_grapheme_log.tsv"
        );
        assert_eq!(
            AuditLog::new("phrase", Pass::PatternReplace).file_name("rec"),
            "rec_phrase_tier_pattern_replace_log.tsv"
        );
        assert_eq!(
            AuditLog::new("word", Pass::Typo).file_name("rec"),
            "rec_word_tier_typo_log.tsv"
        );
    }

    #[test]
    fn save_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new("word", Pass::Deletion);
        let path = log.save(dir.path(), "rec").unwrap();
        assert!(path.ends_with("rec_word_tier_deletion_log.tsv"));
        assert!(path.exists());
    }
}
