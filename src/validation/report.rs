//! Validation report types for structured reporting.
//!
//! A [`ValidityReport`] holds everything found in one file. It can be
//! rendered for people (`Display`), flattened into report rows for the
//! CSV/TSV outputs, or serialized as JSON together with its
//! [`ValidationIssue`]s.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::error::TiercheckError;
use crate::ir::{Interval, StructuralError, PHONE_TIER, WORD_TIER};

/// The result of validating one annotation.
#[derive(Clone, Debug, Serialize)]
pub struct ValidityReport {
    /// The file the annotation came from, as given on the command line.
    pub file_name: String,
    /// Declared tier names, in order.
    pub tier_names: Vec<String>,
    /// The strict tier-shape violation, if any.
    pub structure: Option<StructuralError>,
    pub words: WordValidity,
    pub phones: PhoneValidity,
}

/// Whether word spellings were actually checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WordCheck {
    Checked,
    /// No orthography was supplied; words are vacuously valid.
    SkippedNoOrthography,
}

#[derive(Clone, Debug, Serialize)]
pub struct WordValidity {
    pub check: WordCheck,
    pub tier_present: bool,
    /// Distinct trimmed labels missing from the orthography.
    pub invalid_words: BTreeSet<String>,
    /// Every offending entry, in tier order.
    pub invalid_entries: Vec<Interval>,
}

impl WordValidity {
    pub fn is_valid(&self) -> bool {
        match self.check {
            WordCheck::SkippedNoOrthography => true,
            WordCheck::Checked => self.tier_present && self.invalid_words.is_empty(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PhoneValidity {
    pub tier_present: bool,
    /// Distinct characters rejected by the IPA predicate.
    pub invalid_phones: BTreeSet<char>,
    /// Every entry containing at least one rejected character, in tier order.
    pub invalid_entries: Vec<Interval>,
}

impl PhoneValidity {
    pub fn is_valid(&self) -> bool {
        self.tier_present && self.invalid_phones.is_empty()
    }
}

impl ValidityReport {
    pub fn tiers_valid(&self) -> bool {
        self.structure.is_none()
    }

    pub fn words_valid(&self) -> bool {
        self.words.is_valid()
    }

    pub fn phones_valid(&self) -> bool {
        self.phones.is_valid()
    }

    /// True when tiers, words and phones all pass.
    pub fn is_valid(&self) -> bool {
        self.tiers_valid() && self.words_valid() && self.phones_valid()
    }

    /// Individual findings, errors first in the order they were checked.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if let Some(err) = &self.structure {
            issues.push(ValidationIssue::error(
                IssueCode::TierShape,
                err.to_string(),
                IssueContext::File,
            ));
        }

        if !self.phones.tier_present {
            issues.push(ValidationIssue::error(
                IssueCode::MissingPhoneTier,
                "no phone tier to validate",
                IssueContext::File,
            ));
        }
        for entry in &self.phones.invalid_entries {
            issues.push(ValidationIssue::error(
                IssueCode::InvalidPhone,
                format!("'{}' is not valid IPA", entry.label()),
                IssueContext::entry(PHONE_TIER, entry),
            ));
        }

        match self.words.check {
            WordCheck::SkippedNoOrthography => issues.push(ValidationIssue::warning(
                IssueCode::OrthographySkipped,
                "no orthography given; words were not checked",
                IssueContext::File,
            )),
            WordCheck::Checked if !self.words.tier_present => {
                issues.push(ValidationIssue::error(
                    IssueCode::MissingWordTier,
                    "no word tier to validate",
                    IssueContext::File,
                ))
            }
            WordCheck::Checked => {}
        }
        for entry in &self.words.invalid_entries {
            issues.push(ValidationIssue::error(
                IssueCode::InvalidWord,
                format!("'{}' is not in the orthography", entry.label().trim()),
                IssueContext::entry(WORD_TIER, entry),
            ));
        }

        issues
    }

    /// The one-line summary row for the validation report.
    pub fn to_row(&self) -> ValidityRow {
        ValidityRow {
            file_name: self.file_name.clone(),
            tiers_valid: self.tiers_valid(),
            phones_valid: self.phones_valid(),
            words_valid: self.words_valid(),
            invalid_phones: join_sorted(self.phones.invalid_phones.iter()),
            invalid_words: join_sorted(self.words.invalid_words.iter()),
        }
    }

    /// One row per offending entry, phones before words.
    pub fn invalid_items(&self) -> Vec<InvalidItem> {
        let phones = self
            .phones
            .invalid_entries
            .iter()
            .map(|e| InvalidItem::new(&self.file_name, PHONE_TIER, e));
        let words = self
            .words
            .invalid_entries
            .iter()
            .map(|e| InvalidItem::new(&self.file_name, WORD_TIER, e));
        phones.chain(words).collect()
    }
}

fn join_sorted<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
}

fn emoji_bool(b: bool) -> &'static str {
    if b {
        "✅"
    } else {
        "❌"
    }
}

impl fmt::Display for ValidityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FILE:\t{}", self.file_name)?;
        writeln!(
            f,
            "TIERS:\t{}\t{:?}",
            emoji_bool(self.tiers_valid()),
            self.tier_names
        )?;
        writeln!(f, "PHONES:\t{}", emoji_bool(self.phones_valid()))?;
        match self.words.check {
            WordCheck::Checked => writeln!(f, "WORDS:\t{}", emoji_bool(self.words_valid()))?,
            WordCheck::SkippedNoOrthography => writeln!(f, "WORDS:\t(not checked)")?,
        }

        if let Some(err) = &self.structure {
            writeln!(f, "STRUCTURE:\t{}", err)?;
        }
        if !self.words.invalid_words.is_empty() {
            let words: Vec<&str> = self.words.invalid_words.iter().map(String::as_str).collect();
            writeln!(f, "INVALID_WORDS:\t{}", words.join(", "))?;
        }
        if !self.phones.invalid_phones.is_empty() {
            let phones: Vec<String> = self
                .phones
                .invalid_phones
                .iter()
                .map(char::to_string)
                .collect();
            writeln!(f, "INVALID_PHONES:\t{}", phones.join(", "))?;
        }

        let issues = self.issues();
        if !issues.is_empty() {
            writeln!(f, "ISSUES:")?;
            for issue in &issues {
                writeln!(f, "  {}", issue)?;
            }
        }
        Ok(())
    }
}

/// JSON view of a report: its fields plus the issue list.
#[derive(Serialize)]
pub struct ReportWithIssues<'a> {
    #[serde(flatten)]
    pub report: &'a ValidityReport,
    pub issues: Vec<ValidationIssue>,
}

impl ValidityReport {
    pub fn with_issues(&self) -> ReportWithIssues<'_> {
        ReportWithIssues {
            report: self,
            issues: self.issues(),
        }
    }
}

// ============================================================================
// Report rows
// ============================================================================

/// A row of `validation_report.{csv,tsv}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidityRow {
    #[serde(rename = "FILENAME")]
    pub file_name: String,
    #[serde(rename = "TIERS_VALID", serialize_with = "bool_as_int")]
    pub tiers_valid: bool,
    #[serde(rename = "PHONES_VALID", serialize_with = "bool_as_int")]
    pub phones_valid: bool,
    #[serde(rename = "WORDS_VALID", serialize_with = "bool_as_int")]
    pub words_valid: bool,
    /// Space-separated.
    #[serde(rename = "INVALID_PHONES")]
    pub invalid_phones: String,
    /// Space-separated.
    #[serde(rename = "INVALID_WORDS")]
    pub invalid_words: String,
}

/// A row of `invalid_items_report.{csv,tsv}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvalidItem {
    #[serde(rename = "FILENAME")]
    pub file_name: String,
    #[serde(rename = "TIER")]
    pub tier: String,
    #[serde(rename = "INVALID_TOKEN")]
    pub token: String,
    #[serde(rename = "START_TIME")]
    pub start: f64,
    #[serde(rename = "END_TIME")]
    pub end: f64,
}

impl InvalidItem {
    fn new(file_name: &str, tier: &str, entry: &Interval) -> Self {
        Self {
            file_name: file_name.to_string(),
            tier: tier.to_string(),
            token: entry.label().trim().to_string(),
            start: entry.start(),
            end: entry.end(),
        }
    }
}

fn bool_as_int<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Delimiter used for the report files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Tsv => "tsv",
        }
    }

    fn delimiter(self) -> u8 {
        match self {
            ReportFormat::Csv => b',',
            ReportFormat::Tsv => b'\t',
        }
    }
}

/// File name of the per-file summary report.
pub fn validity_report_name(format: ReportFormat) -> String {
    format!("validation_report.{}", format.extension())
}

/// File name of the per-entry report.
pub fn invalid_items_report_name(format: ReportFormat) -> String {
    format!("invalid_items_report.{}", format.extension())
}

/// Writes summary rows. The header is written even when `rows` is empty.
pub fn write_validity_rows(
    path: &Path,
    rows: &[ValidityRow],
    format: ReportFormat,
) -> Result<(), TiercheckError> {
    write_rows(path, rows, &VALIDITY_HEADERS, format)
}

/// Writes invalid-item rows. The header is written even when `items` is empty.
pub fn write_invalid_items(
    path: &Path,
    items: &[InvalidItem],
    format: ReportFormat,
) -> Result<(), TiercheckError> {
    write_rows(path, items, &INVALID_ITEM_HEADERS, format)
}

const VALIDITY_HEADERS: [&str; 6] = [
    "FILENAME",
    "TIERS_VALID",
    "PHONES_VALID",
    "WORDS_VALID",
    "INVALID_PHONES",
    "INVALID_WORDS",
];

const INVALID_ITEM_HEADERS: [&str; 5] =
    ["FILENAME", "TIER", "INVALID_TOKEN", "START_TIME", "END_TIME"];

fn write_rows<T: Serialize>(
    path: &Path,
    rows: &[T],
    headers: &[&str],
    format: ReportFormat,
) -> Result<(), TiercheckError> {
    let to_err = |source| TiercheckError::ReportWrite {
        path: path.to_path_buf(),
        source,
    };

    // Serde headers are only emitted with the first record, so write them
    // by hand to keep empty reports well-formed.
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(false)
        .from_path(path)
        .map_err(to_err)?;
    writer.write_record(headers).map_err(to_err)?;
    for row in rows {
        writer.serialize(row).map_err(to_err)?;
    }
    writer.flush().map_err(|e| to_err(e.into()))?;
    Ok(())
}

// ============================================================================
// Issues
// ============================================================================

/// A single validation finding.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// A stable code identifying the kind of finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Tier count, names or order differ from phone/word/phrase/notes.
    TierShape,
    MissingPhoneTier,
    MissingWordTier,
    /// A phone label contains a non-IPA character.
    InvalidPhone,
    /// A word label is not in the orthography.
    InvalidWord,
    OrthographySkipped,
}

/// Where a finding was made.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    File,
    Entry { tier: String, start: f64, end: f64 },
}

impl IssueContext {
    fn entry(tier: &str, interval: &Interval) -> Self {
        IssueContext::Entry {
            tier: tier.to_string(),
            start: interval.start(),
            end: interval.end(),
        }
    }
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::File => write!(f, "file"),
            IssueContext::Entry { tier, start, end } => {
                write!(f, "{} [{:.3}, {:.3})", tier, start, end)
            }
        }
    }
}
