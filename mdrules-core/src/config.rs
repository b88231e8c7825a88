use crate::error::FormatError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_list_indent_width() -> usize {
    2
}

/// Top-level formatting configuration.
///
/// Keys are camelCase so settings files written by editor integrations load
/// unchanged. Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterConfig {
    /// Drop numbered link listings such as `[1] https://...`
    #[serde(default)]
    pub enable_link_removal: bool,
    /// Re-level ATX headings according to `heading_conversion`
    #[serde(default)]
    pub enable_heading_conversion: bool,
    #[serde(default)]
    pub heading_conversion: HeadingConversionConfig,
    /// Unwrap `**bold**` and `__bold__`
    #[serde(default)]
    pub enable_bold_removal: bool,
    /// Drop inline citation markers and footnotes
    #[serde(default)]
    pub enable_reference_removal: bool,
    #[serde(default)]
    pub enable_table_format: bool,
    #[serde(default)]
    pub enable_list_indent_format: bool,
    /// Spaces per nesting level for list items
    #[serde(default = "default_list_indent_width")]
    pub list_indent_width: usize,
    #[serde(default)]
    pub enable_link_format: bool,
    #[serde(default)]
    pub enable_blockquote_format: bool,
    #[serde(default)]
    pub enable_code_highlight: bool,
    /// Language tag given to fenced blocks that have none
    #[serde(default)]
    pub code_default_language: Option<String>,
    #[serde(default)]
    pub enable_image_optimization: bool,
    #[serde(default)]
    pub enable_yaml_metadata_format: bool,
    #[serde(default)]
    pub enable_math_format: bool,
    /// Trailing whitespace and blank-line runs
    #[serde(default = "default_true")]
    pub enable_spacing_fix: bool,
    #[serde(default)]
    pub special_char_handling: SpecialCharHandling,
    /// User-authored substitutions, applied after the built-ins in list order
    #[serde(default)]
    pub custom_regex_rules: Vec<CustomRegexRule>,
    /// Extra catalog rules to activate by name
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingConversionConfig {
    /// Source level (1-6) -> target level (0-6, 0 leaves the level unchanged)
    #[serde(default)]
    pub mappings: BTreeMap<u8, u8>,
    /// Shift deeper headings along with the mapped level
    #[serde(default = "default_true")]
    pub cascading: bool,
}

impl Default for HeadingConversionConfig {
    fn default() -> Self {
        Self {
            mappings: BTreeMap::new(),
            cascading: true,
        }
    }
}

/// What to do with invisible and control characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialCharHandling {
    Remove,
    Escape,
    #[default]
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRegexRule {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl CustomRegexRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            description: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Name of the rule in the catalog
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RuleConfig {
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enable_link_removal: false,
            enable_heading_conversion: false,
            heading_conversion: HeadingConversionConfig::default(),
            enable_bold_removal: false,
            enable_reference_removal: false,
            enable_table_format: false,
            enable_list_indent_format: false,
            list_indent_width: default_list_indent_width(),
            enable_link_format: false,
            enable_blockquote_format: false,
            enable_code_highlight: false,
            code_default_language: None,
            enable_image_optimization: false,
            enable_yaml_metadata_format: false,
            enable_math_format: false,
            enable_spacing_fix: true,
            special_char_handling: SpecialCharHandling::Ignore,
            custom_regex_rules: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl FormatterConfig {
    /// Config with every built-in rule switched off.
    pub fn empty() -> Self {
        Self {
            enable_spacing_fix: false,
            ..Self::default()
        }
    }

    /// Load config from a YAML file, or JSON when the extension says so
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: FormatterConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON config {}", path.display()))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("invalid YAML config {}", path.display()))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {p}, using defaults: {e:#}");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Range checks that serde can't express.
    pub fn validate(&self) -> std::result::Result<(), FormatError> {
        for (&from, &to) in &self.heading_conversion.mappings {
            if !(1..=6).contains(&from) {
                return Err(FormatError::Config(format!(
                    "heading mapping source level {from} is outside 1..=6"
                )));
            }
            if to > 6 {
                return Err(FormatError::Config(format!(
                    "heading mapping target level {to} (from {from}) is outside 0..=6"
                )));
            }
        }
        if self.enable_list_indent_format && self.list_indent_width == 0 {
            return Err(FormatError::Config(
                "listIndentWidth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
