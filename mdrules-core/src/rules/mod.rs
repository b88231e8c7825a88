// Main rules module - delegates to semantic sub-modules
// This file coordinates the rule system but actual implementations are in:
// - engine.rs: FormatRule contract and shared text utilities
// - catalog.rs: name -> factory registry
// - planner.rs: dependency/priority execution order
// - text_cleanup.rs: link, reference, bold, spacing and special-char cleanup
// - heading_remap.rs: heading level remapping
// - table_align.rs: pipe-table padding
// - inline_format.rs: link, image and math touch-ups
// - block_format.rs: lists, blockquotes, code fences, front matter
// - custom.rs: user regex substitutions

pub mod block_format;
pub mod catalog;
pub mod custom;
pub mod engine;
pub mod heading_remap;
pub mod inline_format;
pub mod planner;
pub mod table_align;
pub mod text_cleanup;

pub use catalog::{RuleCatalog, RuleFactory};
pub use custom::RegexSubstitutionRule;
pub use engine::{FormatRule, RuleOutput};
pub use planner::ExecutionPlanner;

use crate::config::{FormatterConfig, SpecialCharHandling};
use block_format::{BlockquoteRule, CodeFenceRule, FrontMatterRule, ListIndentRule};
use heading_remap::HeadingRemapRule;
use inline_format::{ImageOptimizationRule, LinkFormatRule, MathFormatRule};
use table_align::TableAlignRule;
use text_cleanup::{
    BoldRemovalRule, LinkRemovalRule, ReferenceRemovalRule, SpacingFixRule, SpecialCharRule,
};

/// Built-in rules switched on by `config`, in catalog declaration order.
pub fn enabled_builtins(config: &FormatterConfig) -> Vec<&'static str> {
    let toggles = [
        (
            SpecialCharRule::NAME,
            config.special_char_handling != SpecialCharHandling::Ignore,
        ),
        (FrontMatterRule::NAME, config.enable_yaml_metadata_format),
        (LinkRemovalRule::NAME, config.enable_link_removal),
        (ReferenceRemovalRule::NAME, config.enable_reference_removal),
        (BoldRemovalRule::NAME, config.enable_bold_removal),
        (HeadingRemapRule::NAME, config.enable_heading_conversion),
        (MathFormatRule::NAME, config.enable_math_format),
        (ImageOptimizationRule::NAME, config.enable_image_optimization),
        (LinkFormatRule::NAME, config.enable_link_format),
        (BlockquoteRule::NAME, config.enable_blockquote_format),
        (ListIndentRule::NAME, config.enable_list_indent_format),
        (TableAlignRule::NAME, config.enable_table_format),
        (CodeFenceRule::NAME, config.enable_code_highlight),
        (SpacingFixRule::NAME, config.enable_spacing_fix),
    ];
    toggles
        .into_iter()
        .filter_map(|(name, enabled)| enabled.then_some(name))
        .collect()
}

/// Register every built-in factory. Parameterized rules read their settings
/// from the config handed to `create`.
pub fn register_builtins(catalog: &mut RuleCatalog) {
    catalog.register(SpecialCharRule::NAME, |c| {
        Ok(Box::new(SpecialCharRule::new(c.special_char_handling)) as Box<dyn FormatRule>)
    });
    catalog.register(FrontMatterRule::NAME, |_| {
        Ok(Box::new(FrontMatterRule) as Box<dyn FormatRule>)
    });
    catalog.register(LinkRemovalRule::NAME, |_| {
        Ok(Box::new(LinkRemovalRule) as Box<dyn FormatRule>)
    });
    catalog.register(ReferenceRemovalRule::NAME, |_| {
        Ok(Box::new(ReferenceRemovalRule) as Box<dyn FormatRule>)
    });
    catalog.register(BoldRemovalRule::NAME, |_| {
        Ok(Box::new(BoldRemovalRule) as Box<dyn FormatRule>)
    });
    catalog.register(HeadingRemapRule::NAME, |c| {
        Ok(Box::new(HeadingRemapRule::new(&c.heading_conversion)) as Box<dyn FormatRule>)
    });
    catalog.register(MathFormatRule::NAME, |_| {
        Ok(Box::new(MathFormatRule) as Box<dyn FormatRule>)
    });
    catalog.register(ImageOptimizationRule::NAME, |_| {
        Ok(Box::new(ImageOptimizationRule) as Box<dyn FormatRule>)
    });
    catalog.register(LinkFormatRule::NAME, |_| {
        Ok(Box::new(LinkFormatRule) as Box<dyn FormatRule>)
    });
    catalog.register(BlockquoteRule::NAME, |_| {
        Ok(Box::new(BlockquoteRule) as Box<dyn FormatRule>)
    });
    catalog.register(ListIndentRule::NAME, |c| {
        Ok(Box::new(ListIndentRule::new(c.list_indent_width)) as Box<dyn FormatRule>)
    });
    catalog.register(TableAlignRule::NAME, |_| {
        Ok(Box::new(TableAlignRule) as Box<dyn FormatRule>)
    });
    catalog.register(CodeFenceRule::NAME, |c| {
        Ok(Box::new(CodeFenceRule::new(c.code_default_language.clone())) as Box<dyn FormatRule>)
    });
    catalog.register(SpacingFixRule::NAME, |_| {
        Ok(Box::new(SpacingFixRule) as Box<dyn FormatRule>)
    });
}
