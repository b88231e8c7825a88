use super::engine::{map_prose_lines, FormatRule, RuleOutput};
use crate::config::HeadingConversionConfig;
use regex::Regex;
use std::sync::LazyLock;

static ATX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( {0,3})(#{1,6})([ \t]+.*|[ \t]*)$").unwrap());

const MIN_LEVEL: i32 = 1;
const MAX_LEVEL: i32 = 6;

// HeadingRemapRule - re-levels ATX headings from a from->to mapping table
//
// Mappings run one after another in ascending source level, each on the
// levels produced by the previous one. In cascading mode a mapping shifts
// every heading at or below its source level; otherwise only exact matches.
pub struct HeadingRemapRule {
    /// (from, to) pairs, ascending by `from`, no-ops already dropped
    mappings: Vec<(u8, u8)>,
    cascading: bool,
}

impl HeadingRemapRule {
    pub const NAME: &'static str = "heading_conversion";

    pub fn new(config: &HeadingConversionConfig) -> Self {
        // BTreeMap iteration is already ascending by source level
        let mappings = config
            .mappings
            .iter()
            .filter(|(&from, &to)| to != 0 && to != from)
            .map(|(&from, &to)| (from, to))
            .collect();
        Self {
            mappings,
            cascading: config.cascading,
        }
    }

    /// Final level for a heading that starts at `level`.
    pub fn remap_level(&self, level: u8) -> u8 {
        let mut current = i32::from(level);
        for &(from, to) in &self.mappings {
            let from = i32::from(from);
            let affected = if self.cascading {
                current >= from
            } else {
                current == from
            };
            if affected {
                current = (current + i32::from(to) - from).clamp(MIN_LEVEL, MAX_LEVEL);
            }
        }
        // Always within 1..=6, so the cast can't truncate
        current as u8
    }
}

impl FormatRule for HeadingRemapRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        40
    }

    fn apply(&self, text: &str) -> RuleOutput {
        if self.mappings.is_empty() {
            return RuleOutput::unchanged(text);
        }

        map_prose_lines(text, |line| {
            let caps = ATX_HEADING.captures(line)?;
            let level = caps[2].len() as u8;
            let remapped = self.remap_level(level);
            if remapped == level {
                return None;
            }
            Some(format!(
                "{}{}{}",
                &caps[1],
                "#".repeat(usize::from(remapped)),
                &caps[3]
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rule(pairs: &[(u8, u8)], cascading: bool) -> HeadingRemapRule {
        HeadingRemapRule::new(&HeadingConversionConfig {
            mappings: pairs.iter().copied().collect::<BTreeMap<_, _>>(),
            cascading,
        })
    }

    #[test]
    fn test_cascading_promotes_descendants() {
        let out = rule(&[(2, 1)], true).apply("## A\n### B\n#### C");
        assert_eq!(out.text, "# A\n## B\n### C");
        assert_eq!(out.substitutions, 3);
    }

    #[test]
    fn test_non_cascading_touches_exact_level_only() {
        let out = rule(&[(2, 1)], false).apply("## A\n### B\n# Top");
        assert_eq!(out.text, "# A\n### B\n# Top");
        assert_eq!(out.substitutions, 1);
    }

    #[test]
    fn test_zero_and_identity_mappings_are_noops() {
        let input = "# A\n## B";
        assert_eq!(rule(&[(1, 0), (2, 2)], true).apply(input).text, input);
    }

    #[test]
    fn test_levels_clamp_to_six() {
        let r = rule(&[(1, 3)], true);
        assert_eq!(r.remap_level(1), 3);
        assert_eq!(r.remap_level(5), 6);
        assert_eq!(r.apply("###### Deep").text, "###### Deep");
    }

    #[test]
    fn test_overlapping_mappings_apply_sequentially() {
        // 2 -> 3 first, then 3 -> 1 sees the already shifted level
        let r = rule(&[(3, 1), (2, 3)], true);
        assert_eq!(r.remap_level(2), 1);
        assert_eq!(r.remap_level(3), 2);
        assert_eq!(r.remap_level(1), 1);
    }

    #[test]
    fn test_non_headings_untouched() {
        let input = "#hashtag\n####### seven\n    # indented code\n```\n# comment\n```";
        assert_eq!(rule(&[(1, 2)], true).apply(input).text, input);
    }

    #[test]
    fn test_heading_text_preserved() {
        let out = rule(&[(1, 2)], true).apply("  # Title with # inside #\n#");
        assert_eq!(out.text, "  ## Title with # inside #\n##");
    }
}
