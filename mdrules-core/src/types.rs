use serde::{Deserialize, Serialize};

// ===== FORMAT RESULT TYPES =====
// These are what a host sees after a format call: the text, a substitution
// count for status messages, and any non-fatal warnings.

/// Non-fatal problem encountered while building or running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatWarning {
    /// Name the rule would have had in the active set (e.g. "custom:2")
    pub rule: String,
    pub message: String,
}

impl FormatWarning {
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FormatWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

/// Output of one `Formatter::format` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOutcome {
    /// Final text, trimmed of leading/trailing whitespace
    pub text: String,
    /// Total substitutions across every applied rule
    pub substitutions: usize,
    pub warnings: Vec<FormatWarning>,
    /// Rule names in the order they were applied
    pub applied: Vec<String>,
}

impl FormatOutcome {
    pub fn changed(&self, original: &str) -> bool {
        self.text != original
    }
}
