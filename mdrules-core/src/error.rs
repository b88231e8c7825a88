// Error taxonomy for the formatting pipeline
//
// Structural errors (unknown rule, dependency cycle, bad config) abort a whole
// format call. InvalidPattern is only ever raised while building a custom rule;
// the formatter downgrades it to a FormatWarning and keeps going.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Configuration asked for a rule the catalog doesn't know about
    #[error("unknown rule '{name}' (not registered in the rule catalog)")]
    UnknownRule { name: String },

    /// The active rule set can't be ordered
    #[error("cyclic rule dependency involving '{rule}': {}", cycle.join(" -> "))]
    CyclicDependency { rule: String, cycle: Vec<String> },

    /// A user-supplied regex failed to compile
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Configuration values out of range
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FormatError {
    /// Structural errors abort the format call; everything else is recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FormatError::InvalidPattern { .. })
    }
}
