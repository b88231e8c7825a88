use super::engine::{map_prose, replace_counted, split_terminator, FormatRule, RuleOutput};
use crate::config::SpecialCharHandling;
use regex::Regex;
use std::sync::LazyLock;

// Pattern-driven cleanup rules. All of them skip fenced code except
// SpecialCharRule, which treats invisible characters as junk everywhere.

/// Numbered link listings: `[1] https://...`, `[1]: https://...`, `1. https://...`
static LINK_LISTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(?:\[\d+\]:?|\d+[.)])[ \t]+https?://").unwrap());

static FOOTNOTE_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\[\^[^\]\s]+\]:[^\n]*(?:\n|$)").unwrap());

/// `[1]`, `[1, 2]`, `[3-5]`, `[^note]`, with any whitespace in front
static INLINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ \t]*\[(?:\^[^\]\s]+|\d+(?:[ \t]*[,\-–][ \t]*\d+)*)\]").unwrap()
});

static BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(\S(?:[^\n]*?\S)?)\*\*").unwrap());

static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w\\])__(\S(?:[^\n]*?\S)?)__").unwrap());

// LinkRemovalRule - drops lines that only list a numbered URL
pub struct LinkRemovalRule;

impl LinkRemovalRule {
    pub const NAME: &'static str = "link_removal";
}

impl FormatRule for LinkRemovalRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        10
    }

    fn apply(&self, text: &str) -> RuleOutput {
        map_prose(text, |prose| {
            let mut out = String::with_capacity(prose.len());
            let mut count = 0;
            for raw in prose.split_inclusive('\n') {
                if is_link_listing(split_terminator(raw).0) {
                    count += 1;
                    continue;
                }
                out.push_str(raw);
            }
            (out, count)
        })
    }
}

/// A listing line, or one that becomes a listing once citation markers are
/// stripped (`1. [3] https://...`). Reference removal runs after this rule,
/// so both shapes have to go here.
fn is_link_listing(line: &str) -> bool {
    LINK_LISTING.is_match(line)
        || (INLINE_MARKER.is_match(line) && LINK_LISTING.is_match(&strip_all_markers(line).0))
}

// ReferenceRemovalRule - strips citation markers and footnotes
pub struct ReferenceRemovalRule;

impl ReferenceRemovalRule {
    pub const NAME: &'static str = "reference_removal";
}

impl FormatRule for ReferenceRemovalRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        20
    }

    /// Link listings start with `[n]`; stripping the marker first would leave
    /// a bare URL line that link removal no longer recognizes.
    fn dependencies(&self) -> Vec<String> {
        vec![LinkRemovalRule::NAME.to_string()]
    }

    /// Repeats until nothing changes: removing `[1]` from `[[1]2]` exposes
    /// a new marker.
    fn apply(&self, text: &str) -> RuleOutput {
        map_prose(text, |prose| {
            let mut current = prose.to_string();
            let mut total = 0;
            loop {
                let (without_defs, defs) = replace_counted(&FOOTNOTE_DEFINITION, &current, "");
                let (out, markers) = strip_inline_markers(&without_defs);
                current = out;
                if defs + markers == 0 {
                    return (current, total);
                }
                total += defs + markers;
            }
        })
    }
}

/// `strip_inline_markers` until no marker is left.
fn strip_all_markers(text: &str) -> (String, usize) {
    let mut current = text.to_string();
    let mut total = 0;
    loop {
        let (next, count) = strip_inline_markers(&current);
        if count == 0 {
            return (current, total);
        }
        current = next;
        total += count;
    }
}

/// Remove inline markers, leaving link syntax (`[1](url)`, `[text][1]`,
/// `[1]: target`) alone.
fn strip_inline_markers(text: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;

    for m in INLINE_MARKER.find_iter(text) {
        let bracket = m.start() + m.as_str().find('[').unwrap_or(0);
        let before = text[..bracket].chars().next_back();
        let after = text[m.end()..].chars().next();
        if matches!(before, Some(']' | '!' | '\\')) || matches!(after, Some('(' | '[' | ':')) {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        last = m.end();
        count += 1;
    }

    out.push_str(&text[last..]);
    (out, count)
}

// BoldRemovalRule - unwraps strong emphasis
pub struct BoldRemovalRule;

impl BoldRemovalRule {
    pub const NAME: &'static str = "bold_removal";
}

impl FormatRule for BoldRemovalRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        30
    }

    /// Lazy matching pairs the outer opener of `**a **b** c**` with the inner
    /// closer, so passes repeat until neither pattern matches. Every pass
    /// drops four characters per match, which bounds the loop.
    fn apply(&self, text: &str) -> RuleOutput {
        map_prose(text, |prose| {
            let mut current = prose.to_string();
            let mut total = 0;
            loop {
                let (stars, a) = replace_counted(&BOLD_STARS, &current, "${1}");
                let (out, b) = replace_counted(&BOLD_UNDERSCORES, &stars, "${1}${2}");
                current = out;
                if a + b == 0 {
                    return (current, total);
                }
                total += a + b;
            }
        })
    }
}

// SpacingFixRule - trailing whitespace and runs of blank lines
pub struct SpacingFixRule;

impl SpacingFixRule {
    pub const NAME: &'static str = "spacing_fix";
}

impl FormatRule for SpacingFixRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        90
    }

    fn apply(&self, text: &str) -> RuleOutput {
        map_prose(text, |prose| {
            let mut out = String::with_capacity(prose.len());
            let mut count = 0;
            let mut previous_blank = false;

            for raw in prose.split_inclusive('\n') {
                let (content, terminator) = split_terminator(raw);
                let trimmed = content.trim_end_matches([' ', '\t']);
                let blank = trimmed.is_empty();

                if blank && previous_blank {
                    count += 1;
                    continue;
                }
                if trimmed.len() != content.len() {
                    count += 1;
                }
                out.push_str(trimmed);
                out.push_str(terminator);
                previous_blank = blank;
            }

            (out, count)
        })
    }
}

// SpecialCharRule - invisible and control characters
pub struct SpecialCharRule {
    handling: SpecialCharHandling,
}

impl SpecialCharRule {
    pub const NAME: &'static str = "special_chars";

    pub fn new(handling: SpecialCharHandling) -> Self {
        Self { handling }
    }

    fn is_special(c: char) -> bool {
        matches!(
            c,
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00A0}'
        ) || (c.is_control() && !matches!(c, '\n' | '\t' | '\r'))
    }
}

impl FormatRule for SpecialCharRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        0
    }

    fn apply(&self, text: &str) -> RuleOutput {
        if self.handling == SpecialCharHandling::Ignore || !text.chars().any(Self::is_special) {
            return RuleOutput::unchanged(text);
        }

        let mut out = String::with_capacity(text.len());
        let mut count = 0;
        for c in text.chars() {
            if !Self::is_special(c) {
                out.push(c);
                continue;
            }
            count += 1;
            match self.handling {
                SpecialCharHandling::Remove if c == '\u{00A0}' => out.push(' '),
                SpecialCharHandling::Remove => {}
                SpecialCharHandling::Escape => out.push_str(&format!("&#x{:X};", c as u32)),
                SpecialCharHandling::Ignore => out.push(c),
            }
        }
        RuleOutput::new(out, count)
    }
}
