//! Accepted spellings, loaded from a tab-separated orthography file.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::TiercheckError;

/// The set of spellings a word tier may use.
///
/// The file format is one word per line in the first tab-separated column.
/// Further columns (usually a pronunciation) are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Orthography {
    words: BTreeSet<String>,
}

impl Orthography {
    /// Loads an orthography file.
    ///
    /// # Errors
    /// Returns [`TiercheckError::OrthographyRead`] if the file cannot be
    /// opened or read. Individual malformed lines are skipped.
    pub fn load(path: &Path) -> Result<Self, TiercheckError> {
        let file = File::open(path).map_err(|source| TiercheckError::OrthographyRead {
            path: path.to_path_buf(),
            source: source.into(),
        })?;
        let orthography =
            Self::from_reader(file).map_err(|source| TiercheckError::OrthographyRead {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(
            path = %path.display(),
            words = orthography.len(),
            "loaded orthography"
        );
        Ok(orthography)
    }

    /// Parses orthography lines from any reader.
    ///
    /// Blank lines and lines that are not valid UTF-8 are skipped; only I/O
    /// failures are errors.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut words = BTreeSet::new();
        for result in rdr.records() {
            let record = match result {
                Ok(record) => record,
                Err(err) if err.is_io_error() => return Err(err),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed orthography line");
                    continue;
                }
            };
            if let Some(word) = record.get(0).map(str::trim).filter(|w| !w.is_empty()) {
                words.insert(word.to_string());
            }
        }
        Ok(Self { words })
    }

    /// Builds an orthography from an explicit word list.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_column_is_the_word() {
        let text = "kas\tkas\n  pjo \tpjo\textra\n\nmÿn\n";
        let ortho = Orthography::from_reader(text.as_bytes()).unwrap();
        assert_eq!(ortho.len(), 3);
        assert!(ortho.contains("pjo"));
        assert!(ortho.contains("mÿn"));
        assert!(!ortho.contains("Kas"));
    }

    #[test]
    fn duplicates_collapse_and_quotes_are_literal() {
        let text = "kas\na\n\"kas\nkas\tother\n";
        let ortho = Orthography::from_reader(text.as_bytes()).unwrap();
        assert_eq!(ortho.iter().collect::<Vec<_>>(), vec!["\"kas", "a", "kas"]);
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let mut bytes = b"kas\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        bytes.extend_from_slice(b"pjo\n");
        let ortho = Orthography::from_reader(bytes.as_slice()).unwrap();
        assert!(ortho.contains("kas"));
        assert!(ortho.contains("pjo"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Orthography::load(Path::new("/nonexistent/orthography.tsv")).unwrap_err();
        assert!(matches!(err, TiercheckError::OrthographyRead { .. }));
    }
}
