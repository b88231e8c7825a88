// mdrules Core Library
//
// Formats Markdown by running a configurable set of text rules.
// Main interface: FormatterConfig + text -> FormatOutcome.

pub mod config;
pub mod error;
pub mod formatter;
pub mod rules;
pub mod types;

// Re-export main types and functions for easy use
pub use config::{
    CustomRegexRule, FormatterConfig, HeadingConversionConfig, RuleConfig, SpecialCharHandling,
};
pub use error::FormatError;
pub use formatter::{format, ActiveRuleSet, Formatter};
pub use rules::{ExecutionPlanner, FormatRule, RuleCatalog, RuleOutput};
pub use types::*;
