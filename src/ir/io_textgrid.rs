//! Praat TextGrid reader and writer.
//!
//! # Format Reference
//!
//! Praat stores TextGrids as text in either a "long" form with
//! `key = value` lines or a "short" form with bare values, one per line.
//! Both forms carry the same sequence of values once the keys are ignored:
//!
//! ```text
//! "ooTextFile" "TextGrid" xmin xmax <exists> tier_count
//!   "IntervalTier" name xmin xmax interval_count
//!     xmin xmax "text"   (repeated interval_count times)
//! ```
//!
//! so the reader tokenizes the file into numbers and quoted strings,
//! skipping everything else (keys, `=`, `[1]:`, `<exists>` flags and `!`
//! comments). Inside strings, `""` is an escaped quote.
//!
//! Files may be UTF-8 (with or without BOM) or UTF-16 with a BOM, which is
//! what Praat writes when labels contain non-ASCII characters.
//!
//! # Writer
//!
//! The writer emits the long form as UTF-8. Praat requires interval tiers to
//! cover the whole time domain, so gaps between intervals (for example where
//! silence was dropped at load time) are written back as empty intervals.
//! Reloading with `include_empty = false` therefore reproduces the original
//! tier contents exactly.
//!
//! # Limitations
//!
//! Point tiers (`TextTier`) and binary TextGrids are not supported.

use std::fs;
use std::path::Path;

use super::interval::Interval;
use super::model::Annotation;
use super::tier::Tier;
use crate::error::TiercheckError;

const INTERVAL_TIER: &str = "IntervalTier";
const POINT_TIER: &str = "TextTier";

// ============================================================================
// Public API
// ============================================================================

/// Reads an annotation from a TextGrid file.
///
/// # Arguments
/// * `path` - Path to the TextGrid file
/// * `include_empty` - Keep intervals with blank labels
///
/// # Errors
/// Returns an error if the file cannot be read, decoded or parsed, or if a
/// tier's intervals overlap.
pub fn read_textgrid(path: &Path, include_empty: bool) -> Result<Annotation, TiercheckError> {
    let bytes = fs::read(path).map_err(|source| TiercheckError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&bytes, include_empty, path).map(|annotation| annotation.with_source_path(path))
}

/// Writes an annotation as a long-form TextGrid.
///
/// # Errors
/// Returns [`TiercheckError::OutputExists`] if the file exists and
/// `overwrite` is false, or an I/O error.
pub fn write_textgrid(
    path: &Path,
    annotation: &Annotation,
    overwrite: bool,
) -> Result<(), TiercheckError> {
    if !overwrite && path.exists() {
        return Err(TiercheckError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    fs::write(path, to_textgrid_string(annotation)).map_err(|source| TiercheckError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an annotation from TextGrid text.
///
/// Useful for testing without file I/O.
pub fn from_textgrid_str(text: &str, include_empty: bool) -> Result<Annotation, TiercheckError> {
    parse_text(text, include_empty, Path::new("<string>"))
}

/// Reads an annotation from raw TextGrid bytes, detecting the encoding.
///
/// Useful for fuzzing and for input whose encoding is not known upfront.
pub fn from_textgrid_slice(bytes: &[u8], include_empty: bool) -> Result<Annotation, TiercheckError> {
    parse_bytes(bytes, include_empty, Path::new("<bytes>"))
}

/// Renders an annotation as long-form TextGrid text.
pub fn to_textgrid_string(annotation: &Annotation) -> String {
    let (xmin, xmax) = time_domain(annotation);
    let mut out = String::new();

    out.push_str("File type = \"ooTextFile\"\n");
    out.push_str("Object class = \"TextGrid\"\n\n");
    out.push_str(&format!("xmin = {} \n", xmin));
    out.push_str(&format!("xmax = {} \n", xmax));

    if annotation.tiers().is_empty() {
        out.push_str("tiers? <absent> \n");
        return out;
    }

    out.push_str("tiers? <exists> \n");
    out.push_str(&format!("size = {} \n", annotation.tiers().len()));
    out.push_str("item []: \n");

    for (tier_idx, tier) in annotation.tiers().iter().enumerate() {
        let rows = covering_rows(tier, xmin, xmax);

        out.push_str(&format!("    item [{}]:\n", tier_idx + 1));
        out.push_str(&format!("        class = \"{}\" \n", INTERVAL_TIER));
        out.push_str(&format!("        name = \"{}\" \n", escape(tier.name())));
        out.push_str(&format!("        xmin = {} \n", xmin));
        out.push_str(&format!("        xmax = {} \n", xmax));
        out.push_str(&format!("        intervals: size = {} \n", rows.len()));

        for (row_idx, (start, end, text)) in rows.iter().enumerate() {
            out.push_str(&format!("        intervals [{}]:\n", row_idx + 1));
            out.push_str(&format!("            xmin = {} \n", start));
            out.push_str(&format!("            xmax = {} \n", end));
            out.push_str(&format!("            text = \"{}\" \n", escape(text)));
        }
    }

    out
}

// ============================================================================
// Writing helpers
// ============================================================================

/// The domain covers every interval even if the stored bounds do not.
fn time_domain(annotation: &Annotation) -> (f64, f64) {
    let mut xmin = annotation.xmin;
    let mut xmax = annotation.xmax;
    for tier in annotation.tiers() {
        if let Some(first) = tier.entries().first() {
            xmin = xmin.min(first.start());
        }
        if let Some(last) = tier.entries().last() {
            xmax = xmax.max(last.end());
        }
    }
    (xmin, xmax)
}

/// Tier rows with gaps filled by empty intervals.
fn covering_rows(tier: &Tier, xmin: f64, xmax: f64) -> Vec<(f64, f64, &str)> {
    let mut rows = Vec::with_capacity(tier.len() * 2 + 1);
    let mut cursor = xmin;

    for interval in tier {
        if interval.start() > cursor {
            rows.push((cursor, interval.start(), ""));
        }
        rows.push((interval.start(), interval.end(), interval.label()));
        cursor = interval.end();
    }
    if cursor < xmax {
        rows.push((cursor, xmax, ""));
    }

    rows
}

fn escape(text: &str) -> String {
    text.replace('"', "\"\"")
}

// ============================================================================
// Decoding
// ============================================================================

fn parse_bytes(bytes: &[u8], include_empty: bool, path: &Path) -> Result<Annotation, TiercheckError> {
    let text = decode(bytes).map_err(|message| TiercheckError::TextGridParse {
        path: path.to_path_buf(),
        line: 0,
        message,
    })?;
    parse_text(&text, include_empty, path)
}

fn decode(bytes: &[u8]) -> Result<String, String> {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => {
            String::from_utf8(rest.to_vec()).map_err(|e| format!("invalid UTF-8: {}", e))
        }
        _ => String::from_utf8(bytes.to_vec()).map_err(|e| format!("invalid UTF-8: {}", e)),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err("truncated UTF-16 input (odd byte count)".to_string());
    }
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| format!("invalid UTF-16: {}", e))
}

// ============================================================================
// Tokenizing
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    line: usize,
}

/// Splits TextGrid text into numbers and strings; everything else is noise.
fn tokenize(text: &str) -> Result<Vec<Token>, (usize, String)> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
        } else if c.is_whitespace() {
            chars.next();
        } else if c == '!' {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
            }
        } else if c == '"' {
            let start_line = line;
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('"') => {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            value.push('"');
                        } else {
                            break;
                        }
                    }
                    Some(ch) => {
                        if ch == '\n' {
                            line += 1;
                        }
                        value.push(ch);
                    }
                    None => return Err((start_line, "unterminated string".to_string())),
                }
            }
            tokens.push(Token {
                kind: TokenKind::Text(value),
                line: start_line,
            });
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '"' {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            let numeric_start = word
                .chars()
                .next()
                .is_some_and(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.'));
            if numeric_start {
                if let Ok(value) = word.parse::<f64>() {
                    tokens.push(Token {
                        kind: TokenKind::Number(value),
                        line,
                    });
                }
            }
        }
    }

    Ok(tokens)
}

// ============================================================================
// Parsing
// ============================================================================

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    path: &'a Path,
}

impl<'a> Cursor<'a> {
    fn error(&self, message: impl Into<String>) -> TiercheckError {
        let line = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.line);
        TiercheckError::TextGridParse {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn number(&mut self, what: &str) -> Result<f64, TiercheckError> {
        match self.tokens.get(self.pos).map(|t| &t.kind) {
            Some(TokenKind::Number(value)) => {
                self.pos += 1;
                Ok(*value)
            }
            Some(TokenKind::Text(text)) => {
                Err(self.error(format!("expected {}, found string \"{}\"", what, text)))
            }
            None => Err(self.error(format!("expected {}, found end of file", what))),
        }
    }

    fn count(&mut self, what: &str) -> Result<usize, TiercheckError> {
        let value = self.number(what)?;
        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            self.pos -= 1;
            return Err(self.error(format!("expected {} as a non-negative integer, found {}", what, value)));
        }
        Ok(value as usize)
    }

    /// Caps a declared element count by the tokens left to read.
    fn capacity_hint(&self, declared: usize) -> usize {
        declared.min(self.tokens.len().saturating_sub(self.pos))
    }

    fn text(&mut self, what: &str) -> Result<String, TiercheckError> {
        match self.tokens.get(self.pos).map(|t| &t.kind) {
            Some(TokenKind::Text(text)) => {
                self.pos += 1;
                Ok(text.clone())
            }
            Some(TokenKind::Number(value)) => {
                Err(self.error(format!("expected {}, found number {}", what, value)))
            }
            None => Err(self.error(format!("expected {}, found end of file", what))),
        }
    }

    fn expect_text(&mut self, expected: &str) -> Result<(), TiercheckError> {
        let found = self.text(&format!("\"{}\"", expected))?;
        if found != expected {
            self.pos -= 1;
            return Err(self.error(format!("expected \"{}\", found \"{}\"", expected, found)));
        }
        Ok(())
    }
}

fn parse_text(text: &str, include_empty: bool, path: &Path) -> Result<Annotation, TiercheckError> {
    let tokens = tokenize(text).map_err(|(line, message)| TiercheckError::TextGridParse {
        path: path.to_path_buf(),
        line,
        message,
    })?;

    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
        path,
    };

    cursor.expect_text("ooTextFile")?;
    cursor.expect_text("TextGrid")?;
    let xmin = cursor.number("TextGrid xmin")?;
    let xmax = cursor.number("TextGrid xmax")?;

    // `tiers? <absent>` is followed by nothing at all.
    let tier_count = if cursor.is_done() {
        0
    } else {
        cursor.count("tier count")?
    };

    // Each tier takes at least one token, so the declared count is capped.
    let mut tiers = Vec::with_capacity(cursor.capacity_hint(tier_count));
    for _ in 0..tier_count {
        tiers.push(parse_tier(&mut cursor, include_empty)?);
    }

    Ok(Annotation::new(xmin, xmax, tiers))
}

fn parse_tier(cursor: &mut Cursor<'_>, include_empty: bool) -> Result<Tier, TiercheckError> {
    let class = cursor.text("tier class")?;
    let name = cursor.text("tier name")?;

    if class == POINT_TIER {
        return Err(cursor.error(format!("point tier '{}' is not supported", name)));
    }
    if class != INTERVAL_TIER {
        return Err(cursor.error(format!("unknown tier class \"{}\" for tier '{}'", class, name)));
    }

    cursor.number("tier xmin")?;
    cursor.number("tier xmax")?;
    let interval_count = cursor.count("interval count")?;

    let mut intervals = Vec::with_capacity(cursor.capacity_hint(interval_count));
    for idx in 0..interval_count {
        let what = |field: &str| format!("{} of interval {} on tier '{}'", field, idx + 1, name);
        let start = cursor.number(&what("xmin"))?;
        let end = cursor.number(&what("xmax"))?;
        let label = cursor.text(&what("text"))?;

        if !include_empty && label.trim().is_empty() {
            continue;
        }
        let interval = Interval::new(start, end, label)
            .map_err(|err| cursor.error(format!("tier '{}': {}", name, err)))?;
        intervals.push(interval);
    }

    Tier::new(name, intervals).map_err(|err| cursor.error(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::CANONICAL_TIERS;

    const LONG: &str = r#"File type = "ooTextFile"
Object class = "TextGrid"

xmin = 0
xmax = 1.5
tiers? <exists>
size = 2
item []:
    item [1]:
        class = "IntervalTier"
        name = "phone"
        xmin = 0
        xmax = 1.5
        intervals: size = 3
        intervals [1]:
            xmin = 0
            xmax = 0.4
            text = ""
        intervals [2]:
            xmin = 0.4
            xmax = 0.9
            text = "a"
        intervals [3]:
            xmin = 0.9
            xmax = 1.5
            text = "say ""hi"""
    item [2]:
        class = "IntervalTier"
        name = "word"
        xmin = 0
        xmax = 1.5
        intervals: size = 1
        intervals [1]:
            xmin = 0
            xmax = 1.5
            text = "ka"
"#;

    const SHORT: &str = "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n\n0\n1.5\n<exists>\n2\n\"IntervalTier\"\n\"phone\"\n0\n1.5\n3\n0\n0.4\n\"\"\n0.4\n0.9\n\"a\"\n0.9\n1.5\n\"say \"\"hi\"\"\"\n\"IntervalTier\"\n\"word\"\n0\n1.5\n1\n0\n1.5\n\"ka\"\n";

    #[test]
    fn long_and_short_forms_agree() {
        let long = from_textgrid_str(LONG, true).unwrap();
        let short = from_textgrid_str(SHORT, true).unwrap();
        assert_eq!(long, short);
        assert_eq!(long.tier_names(), vec!["phone", "word"]);
        assert_eq!(long.xmax, 1.5);
    }

    #[test]
    fn include_empty_controls_silence() {
        let with_empty = from_textgrid_str(LONG, true).unwrap();
        let without = from_textgrid_str(LONG, false).unwrap();
        assert_eq!(with_empty.tier("phone").unwrap().len(), 3);
        assert_eq!(without.tier("phone").unwrap().len(), 2);
    }

    #[test]
    fn escaped_quotes_are_unescaped() {
        let annotation = from_textgrid_str(LONG, false).unwrap();
        let phone = annotation.tier("phone").unwrap();
        assert_eq!(phone.entries()[1].label(), "say \"hi\"");
    }

    #[test]
    fn writer_fills_gaps_and_round_trips() {
        let annotation = from_textgrid_str(LONG, false).unwrap();
        let text = to_textgrid_string(&annotation);
        assert!(text.contains("intervals: size = 3"));

        let reloaded = from_textgrid_str(&text, false).unwrap();
        assert_eq!(reloaded, annotation);
    }

    #[test]
    fn utf16_with_bom_decodes() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in SHORT.replace("\"a\"", "\"ɐ\"").encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let annotation = from_textgrid_slice(&bytes, false).unwrap();
        assert_eq!(annotation.tier("phone").unwrap().entries()[0].label(), "ɐ");
    }

    #[test]
    fn point_tiers_are_rejected() {
        let text = "\"ooTextFile\"\n\"TextGrid\"\n0\n1\n<exists>\n1\n\"TextTier\"\n\"bells\"\n0\n1\n1\n0.5\n\"ding\"\n";
        let err = from_textgrid_str(text, false).unwrap_err();
        assert!(err.to_string().contains("point tier 'bells'"));
    }

    #[test]
    fn overlapping_intervals_are_rejected() {
        let text = "\"ooTextFile\"\n\"TextGrid\"\n0\n1\n<exists>\n1\n\"IntervalTier\"\n\"word\"\n0\n1\n2\n0\n0.6\n\"a\"\n0.5\n1\n\"b\"\n";
        let err = from_textgrid_str(text, false).unwrap_err();
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn truncated_input_reports_line() {
        let text = "\"ooTextFile\"\n\"TextGrid\"\n0\n1\n<exists>\n1\n\"IntervalTier\"\n\"word\"\n0\n";
        match from_textgrid_str(text, false) {
            Err(TiercheckError::TextGridParse { line, message, .. }) => {
                assert_eq!(line, 9);
                assert!(message.contains("tier xmax"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn huge_declared_counts_fail_without_allocating() {
        let tiers = "\"ooTextFile\"\n\"TextGrid\"\n0\n1\n<exists>\n4000000000\n";
        assert!(matches!(
            from_textgrid_str(tiers, false),
            Err(TiercheckError::TextGridParse { .. })
        ));

        let intervals = "\"ooTextFile\"\n\"TextGrid\"\n0\n1\n<exists>\n1\n\"IntervalTier\"\n\"word\"\n0\n1\n4000000000\n0\n1\n\"a\"\n";
        let err = from_textgrid_str(intervals, false).unwrap_err();
        assert!(err.to_string().contains("interval 2 on tier 'word'"));
    }

    #[test]
    fn absent_tiers_parse_as_empty() {
        let text = "\"ooTextFile\"\n\"TextGrid\"\n0\n1\n<absent>\n";
        let annotation = from_textgrid_str(text, false).unwrap();
        assert!(annotation.tiers().is_empty());
        assert!(to_textgrid_string(&annotation).contains("tiers? <absent>"));
    }

    #[test]
    fn comments_are_ignored() {
        let text = "\"ooTextFile\" ! header\n\"TextGrid\"\n0 ! start\n1\n<exists>\n0\n";
        let annotation = from_textgrid_str(text, false).unwrap();
        assert_eq!(annotation.xmax, 1.0);
    }

    #[test]
    fn canonical_layout_survives_round_trip() {
        let tiers = CANONICAL_TIERS
            .iter()
            .map(|name| {
                Tier::new(*name, vec![Interval::new(0.1, 0.2, format!("{}-x", name)).unwrap()])
                    .unwrap()
            })
            .collect();
        let annotation = Annotation::new(0.0, 1.0, tiers);
        let reloaded = from_textgrid_str(&to_textgrid_string(&annotation), false).unwrap();
        assert_eq!(reloaded.tier_names(), CANONICAL_TIERS.to_vec());
        assert_eq!(reloaded, annotation);
    }
}
