//! Ordered pattern multi-replace over whole labels.

use serde::{Deserialize, Serialize};

use super::edit::{apply_edits, Edit};
use super::log::{AuditLog, Pass};
use super::CorrectionError;
use crate::error::TiercheckError;
use crate::ir::{Annotation, Tier};

/// Replace every occurrence of `pattern` with `replacement`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplacementRule {
    pub pattern: String,
    pub replacement: String,
}

impl ReplacementRule {
    /// # Errors
    /// Returns [`TiercheckError::InvalidConfig`] if `pattern` is empty.
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, TiercheckError> {
        let rule = Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        };
        rule.check()?;
        Ok(rule)
    }

    pub(crate) fn check(&self) -> Result<(), TiercheckError> {
        if self.pattern.is_empty() {
            return Err(TiercheckError::InvalidConfig {
                message: format!(
                    "replacement rule with empty pattern (replacement {:?})",
                    self.replacement
                ),
            });
        }
        Ok(())
    }

    fn apply(&self, label: &str) -> Option<String> {
        label
            .contains(self.pattern.as_str())
            .then(|| label.replace(self.pattern.as_str(), &self.replacement))
            .filter(|new| new != label)
    }
}

/// The cleanup rules used for the phrase and word tiers of the field
/// recordings this tool was built for.
pub fn default_rules() -> Vec<ReplacementRule> {
    [
        ("ː", ""),
        ("_", " "),
        ("myn", "mÿn"),
        ("pëëpjo", "pëëpjo"),
        ("sïïpjo", "sïï pjo"),
        ("sêêpjo", "sïï pjo"),
        ("puutä", "puu ttä"),
        ("pôôpy", "pôpy"),
        ("jykrii", "jy krii"),
        ("mÿnpjo", "mÿn pjo"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| ReplacementRule {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
    })
    .collect()
}

/// Proposes the chain of relabels the rules make to each entry.
///
/// Entries are handled one at a time and every rule sees the output of the
/// rules before it, so one entry can yield several edits, each starting
/// from the previous one's result.
pub fn propose_replacements(tier: &Tier, rules: &[ReplacementRule]) -> Vec<Edit> {
    let mut edits = Vec::new();
    for entry in tier.iter() {
        let mut current = entry.clone();
        for rule in rules {
            if let Some(new_label) = rule.apply(current.label()) {
                let next = current.with_label(new_label.as_str());
                edits.push(Edit::Replace {
                    old: current,
                    new_label,
                });
                current = next;
            }
        }
    }
    edits
}

/// Applies `rules` in order to every entry of one tier.
pub fn apply_pattern_replacements(
    annotation: &mut Annotation,
    tier_name: &str,
    rules: &[ReplacementRule],
) -> Result<AuditLog, CorrectionError> {
    let tier = annotation.require_tier_mut(tier_name)?;
    let edits = propose_replacements(tier, rules);
    let log = apply_edits(tier, edits, AuditLog::new(tier_name, Pass::PatternReplace))?;
    tracing::info!(tier = tier_name, changed = log.len(), "applied replacement rules");
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Interval;

    fn annotation(labels: &[&str]) -> Annotation {
        let intervals = labels
            .iter()
            .enumerate()
            .map(|(i, l)| Interval::new(i as f64, i as f64 + 1.0, *l).unwrap())
            .collect();
        Annotation::new(0.0, 10.0, vec![Tier::new("word", intervals).unwrap()])
    }

    fn labels(ann: &Annotation) -> Vec<&str> {
        ann.tier("word").unwrap().iter().map(|i| i.label()).collect()
    }

    #[test]
    fn later_rules_see_earlier_results() {
        let mut ann = annotation(&["myn_pjo"]);
        let rules = vec![
            ReplacementRule::new("_", "").unwrap(),
            ReplacementRule::new("mynpjo", "mÿn pjo").unwrap(),
        ];
        let log = apply_pattern_replacements(&mut ann, "word", &rules).unwrap();
        assert_eq!(labels(&ann), vec!["mÿn pjo"]);
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries[0].old_label, "myn_pjo");
        assert_eq!(log.entries[1].old_label, "mynpjo");
        assert_eq!(log.entries[1].new_label.as_deref(), Some("mÿn pjo"));
    }

    #[test]
    fn default_rules_clean_typical_labels() {
        let mut ann = annotation(&["kasː", "sïïpjo", "myn", "pëëpjo", "kas"]);
        let log = apply_pattern_replacements(&mut ann, "word", &default_rules()).unwrap();
        assert_eq!(labels(&ann), vec!["kas", "sïï pjo", "mÿn", "pëëpjo", "kas"]);
        // identity rules never log
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn replacement_is_global_within_a_label() {
        let mut ann = annotation(&["a_b_c"]);
        let rules = vec![ReplacementRule::new("_", " ").unwrap()];
        let log = apply_pattern_replacements(&mut ann, "word", &rules).unwrap();
        assert_eq!(labels(&ann), vec!["a b c"]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(ReplacementRule::new("", "x").is_err());
    }
}
