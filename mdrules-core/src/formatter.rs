use crate::config::FormatterConfig;
use crate::error::FormatError;
use crate::rules::{
    enabled_builtins, ExecutionPlanner, FormatRule, RegexSubstitutionRule, RuleCatalog,
};
use crate::types::{FormatOutcome, FormatWarning};
use tracing::{debug, info, warn};

/// Rules selected for one run, plus warnings raised while building them.
///
/// Built fresh on every call and dropped afterwards; config may change
/// between runs.
pub struct ActiveRuleSet {
    pub rules: Vec<Box<dyn FormatRule>>,
    pub warnings: Vec<FormatWarning>,
}

/// Config + text -> formatted text.
///
/// Owns its [`RuleCatalog`]; register extra rules through [`Formatter::catalog_mut`]
/// before sharing the formatter. `format` only reads the catalog, so a
/// `Formatter` behind an `Arc` can serve many threads.
pub struct Formatter {
    catalog: RuleCatalog,
}

impl Formatter {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self { catalog }
    }

    /// Formatter over the built-in rule catalog
    pub fn with_builtins() -> Self {
        Self::new(RuleCatalog::with_builtins())
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut RuleCatalog {
        &mut self.catalog
    }

    /// Instantiate every rule the config switches on.
    ///
    /// Unknown rule names, invalid config and two active rules sharing a name
    /// are fatal. A custom rule whose pattern doesn't compile is left out and
    /// reported as a warning.
    pub fn build_active_set(&self, config: &FormatterConfig) -> Result<ActiveRuleSet, FormatError> {
        config.validate()?;

        let mut names: Vec<&str> = enabled_builtins(config);
        for rule_config in &config.rules {
            if !rule_config.enabled {
                debug!("skipping disabled rule: {}", rule_config.name);
                continue;
            }
            if names.contains(&rule_config.name.as_str()) {
                continue;
            }
            names.push(&rule_config.name);
        }

        let mut rules = Vec::with_capacity(names.len() + config.custom_regex_rules.len());
        for name in &names {
            rules.push(self.catalog.create(name, config)?);
        }

        let mut warnings = Vec::new();
        for (index, custom) in config.custom_regex_rules.iter().enumerate() {
            if !custom.enabled {
                debug!("skipping disabled custom rule #{index}");
                continue;
            }
            let rule_name = RegexSubstitutionRule::rule_name(index);
            if names.contains(&rule_name.as_str()) {
                // The planner keys rules by name; two with one name can't be ordered
                return Err(FormatError::Config(format!(
                    "rule '{rule_name}' is activated by name and also defined as a custom rule"
                )));
            }
            match RegexSubstitutionRule::new(index, custom) {
                Ok(rule) => rules.push(Box::new(rule)),
                Err(e) => {
                    warn!("skipping {rule_name}: {e}");
                    let message = match &custom.description {
                        Some(description) => format!("{e} ({description})"),
                        None => e.to_string(),
                    };
                    warnings.push(FormatWarning::new(rule_name, message));
                }
            }
        }

        Ok(ActiveRuleSet { rules, warnings })
    }

    /// Execution order for `config`, without touching any text.
    pub fn plan(&self, config: &FormatterConfig) -> Result<Vec<String>, FormatError> {
        let active = self.build_active_set(config)?;
        ExecutionPlanner::plan_names(&active.rules)
    }

    /// Run every active rule over `text` in planned order.
    ///
    /// Either every rule runs or none does: planning errors surface before
    /// the first rule is applied. The result is trimmed.
    pub fn format(&self, text: &str, config: &FormatterConfig) -> Result<FormatOutcome, FormatError> {
        let ActiveRuleSet { rules, warnings } = self.build_active_set(config)?;
        let ordered = ExecutionPlanner::plan(rules)?;

        let applied: Vec<String> = ordered.iter().map(|r| r.name().to_string()).collect();
        info!("applying {} rules: {}", applied.len(), applied.join(", "));

        let mut current = text.to_string();
        let mut substitutions = 0;
        for rule in &ordered {
            let output = rule.apply(&current);
            debug!(
                rule = rule.name(),
                substitutions = output.substitutions,
                "applied rule"
            );
            substitutions += output.substitutions;
            current = output.text;
        }

        Ok(FormatOutcome {
            text: current.trim().to_string(),
            substitutions,
            warnings,
            applied,
        })
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// One-shot format with the built-in catalog.
pub fn format(text: &str, config: &FormatterConfig) -> Result<FormatOutcome, FormatError> {
    Formatter::with_builtins().format(text, config)
}
