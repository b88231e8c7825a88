use super::engine::{replace_counted, FormatRule, RuleOutput};
use crate::config::CustomRegexRule;
use crate::error::FormatError;
use regex::Regex;

/// Custom rules run after every built-in, in the order they were listed.
const CUSTOM_PRIORITY_BASE: i32 = 100;

// RegexSubstitutionRule - user-authored pattern -> replacement
//
// Unlike the built-ins this runs over the whole document, fenced code
// included: the user wrote the pattern and gets exactly what it matches.
pub struct RegexSubstitutionRule {
    name: String,
    priority: i32,
    pattern: Regex,
    replacement: String,
}

impl RegexSubstitutionRule {
    /// Name of the custom rule at `index` in the configured list.
    pub fn rule_name(index: usize) -> String {
        format!("custom:{index}")
    }

    pub fn new(index: usize, rule: &CustomRegexRule) -> Result<Self, FormatError> {
        let pattern = Regex::new(&rule.pattern).map_err(|e| FormatError::InvalidPattern {
            pattern: rule.pattern.clone(),
            message: e.to_string(),
        })?;
        let offset = i32::try_from(index).unwrap_or(i32::MAX - CUSTOM_PRIORITY_BASE);
        Ok(Self {
            name: Self::rule_name(index),
            priority: CUSTOM_PRIORITY_BASE.saturating_add(offset),
            pattern,
            replacement: rule.replacement.clone(),
        })
    }
}

impl FormatRule for RegexSubstitutionRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, text: &str) -> RuleOutput {
        let (out, count) = replace_counted(&self.pattern, text, self.replacement.as_str());
        RuleOutput::new(out, count)
    }
}
