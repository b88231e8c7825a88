//! Rule catalog: name -> factory registry.
//!
//! The catalog is an explicit value owned by whoever assembles a
//! [`Formatter`](crate::Formatter). Registration happens during setup; lookups
//! during formatting only read the table, so one catalog can serve concurrent
//! format calls.

use super::engine::FormatRule;
use crate::config::FormatterConfig;
use crate::error::FormatError;
use std::collections::HashMap;

/// Constructor for a rule, parameterized by the run's configuration.
pub type RuleFactory =
    Box<dyn Fn(&FormatterConfig) -> Result<Box<dyn FormatRule>, FormatError> + Send + Sync>;

pub struct RuleCatalog {
    factories: HashMap<String, RuleFactory>,
}

impl RuleCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Catalog pre-populated with every built-in rule.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        super::register_builtins(&mut catalog);
        catalog
    }

    /// Register a factory under `name`.
    ///
    /// If a factory with the same name already exists, it will be replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&FormatterConfig) -> Result<Box<dyn FormatRule>, FormatError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Instantiate a fresh rule by name.
    pub fn create(
        &self,
        name: &str,
        config: &FormatterConfig,
    ) -> Result<Box<dyn FormatRule>, FormatError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| FormatError::UnknownRule {
                name: name.to_string(),
            })?;
        factory(config)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// All registered names, sorted for stable display.
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::engine::RuleOutput;

    struct Upper;

    impl FormatRule for Upper {
        fn name(&self) -> &str {
            "upper"
        }
        fn priority(&self) -> i32 {
            1
        }
        fn apply(&self, text: &str) -> RuleOutput {
            RuleOutput::new(text.to_uppercase(), 1)
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut catalog = RuleCatalog::new();
        catalog.register("upper", |_| Ok(Box::new(Upper) as Box<dyn FormatRule>));
        let rule = catalog.create("upper", &FormatterConfig::default()).unwrap();
        assert_eq!(rule.name(), "upper");
        assert_eq!(rule.apply("abc").text, "ABC");
    }

    #[test]
    fn test_unknown_rule() {
        let catalog = RuleCatalog::new();
        let err = catalog
            .create("missing", &FormatterConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            FormatError::UnknownRule {
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_register_overwrites() {
        let mut catalog = RuleCatalog::new();
        catalog.register("r", |_| Err(FormatError::Config("first".to_string())));
        catalog.register("r", |_| Ok(Box::new(Upper) as Box<dyn FormatRule>));
        assert!(catalog.create("r", &FormatterConfig::default()).is_ok());
        assert_eq!(catalog.list_names(), vec!["r".to_string()]);
    }

    #[test]
    fn test_builtins_are_registered() {
        let catalog = RuleCatalog::with_builtins();
        for name in [
            "link_removal",
            "reference_removal",
            "bold_removal",
            "heading_conversion",
            "table_format",
            "spacing_fix",
        ] {
            assert!(catalog.contains(name), "missing built-in {name}");
        }
    }

    #[test]
    fn test_catalog_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleCatalog>();
    }
}
