use super::engine::{
    map_prose_lines, split_segments, split_terminator, FormatRule, RuleOutput, Segment,
};
use regex::Regex;
use std::sync::LazyLock;

// Block-level normalizers: list indentation, blockquote markers, code fence
// info strings and YAML front matter.

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)([-*+]|\d{1,9}[.)])[ \t]+(\S.*)$").unwrap());

static FENCE_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( {0,3})(`{3,}|~{3,})[ \t]*(.*?)[ \t]*$").unwrap());

static FRONT_MATTER_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_][A-Za-z0-9_\-]*)[ \t]*:(?:[ \t]*(.*))?$").unwrap());

// ListIndentRule - one indentation step per nesting level
pub struct ListIndentRule {
    indent_width: usize,
}

impl ListIndentRule {
    pub const NAME: &'static str = "list_indent_format";

    pub fn new(indent_width: usize) -> Self {
        Self {
            indent_width: indent_width.max(1),
        }
    }

    /// Smallest non-zero space indentation used by any list item; this is
    /// the document's own nesting step.
    fn detect_unit(text: &str) -> usize {
        split_segments(text)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Prose(prose) => Some(prose),
                Segment::Code(_) => None,
            })
            .flat_map(str::lines)
            .filter_map(|line| LIST_ITEM.captures(line))
            .map(|caps| caps[1].chars().filter(|&c| c == ' ').count())
            .filter(|&spaces| spaces > 0)
            .min()
            .unwrap_or(1)
    }
}

impl FormatRule for ListIndentRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        60
    }

    fn apply(&self, text: &str) -> RuleOutput {
        let unit = Self::detect_unit(text);

        map_prose_lines(text, |line| {
            let caps = LIST_ITEM.captures(line)?;
            let indent = &caps[1];
            let tabs = indent.chars().filter(|&c| c == '\t').count();
            let spaces = indent.len() - tabs;
            // Round to the nearest level so off-by-one indents snap into place
            let level = tabs + (spaces + unit / 2) / unit;
            Some(format!(
                "{}{} {}",
                " ".repeat(level * self.indent_width),
                &caps[2],
                &caps[3]
            ))
        })
    }
}

// BlockquoteRule - `>text` / `>>text` -> `> text` / `> > text`
pub struct BlockquoteRule;

impl BlockquoteRule {
    pub const NAME: &'static str = "blockquote_format";

    fn normalize(line: &str) -> Option<String> {
        let body = line.trim_start_matches(' ');
        let indent = &line[..line.len() - body.len()];
        if indent.len() > 3 || !body.starts_with('>') {
            return None;
        }

        let mut rest = body;
        let mut depth = 0;
        while let Some(after) = rest.strip_prefix('>') {
            depth += 1;
            rest = after.trim_start_matches([' ', '\t']);
        }

        let markers = vec![">"; depth].join(" ");
        if rest.is_empty() {
            Some(format!("{indent}{markers}"))
        } else {
            Some(format!("{indent}{markers} {rest}"))
        }
    }
}

impl FormatRule for BlockquoteRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        55
    }

    fn apply(&self, text: &str) -> RuleOutput {
        map_prose_lines(text, Self::normalize)
    }
}

// CodeFenceRule - tidies fenced code block info strings
pub struct CodeFenceRule {
    default_language: Option<String>,
}

impl CodeFenceRule {
    pub const NAME: &'static str = "code_highlight";

    pub fn new(default_language: Option<String>) -> Self {
        Self {
            default_language: default_language
                .map(|lang| lang.trim().to_lowercase())
                .filter(|lang| !lang.is_empty()),
        }
    }

    fn normalize_opener(&self, opener: &str) -> Option<String> {
        let caps = FENCE_INFO.captures(opener)?;
        let (indent, fence, info) = (&caps[1], &caps[2], &caps[3]);

        if info.is_empty() {
            let lang = self.default_language.as_deref()?;
            return Some(format!("{indent}{fence}{lang}"));
        }

        let (lang, attributes) = match info.split_once([' ', '\t']) {
            Some((lang, rest)) => (lang, Some(rest.trim_start())),
            None => (info, None),
        };
        let lang = lang.to_lowercase();
        Some(match attributes {
            Some(attributes) => format!("{indent}{fence}{lang} {attributes}"),
            None => format!("{indent}{fence}{lang}"),
        })
    }
}

impl FormatRule for CodeFenceRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        70
    }

    fn apply(&self, text: &str) -> RuleOutput {
        let mut out = String::with_capacity(text.len());
        let mut count = 0;

        for segment in split_segments(text) {
            let code = match segment {
                Segment::Prose(prose) => {
                    out.push_str(prose);
                    continue;
                }
                Segment::Code(code) => code,
            };

            // The first line of a code segment is always its opening fence
            let opener_len = code.find('\n').map_or(code.len(), |i| i + 1);
            let (opener, terminator) = split_terminator(&code[..opener_len]);
            match self.normalize_opener(opener) {
                Some(rewritten) if rewritten != opener => {
                    out.push_str(&rewritten);
                    count += 1;
                }
                _ => out.push_str(opener),
            }
            out.push_str(terminator);
            out.push_str(&code[opener_len..]);
        }

        RuleOutput::new(out, count)
    }
}

// FrontMatterRule - normalizes a leading `---` YAML metadata block
pub struct FrontMatterRule;

impl FrontMatterRule {
    pub const NAME: &'static str = "yaml_metadata_format";

    fn normalize_entry(line: &str) -> String {
        match FRONT_MATTER_ENTRY.captures(line) {
            Some(caps) => match caps.get(2).map(|v| v.as_str()).filter(|v| !v.is_empty()) {
                Some(value) => format!("{}: {}", &caps[1], value),
                None => format!("{}:", &caps[1]),
            },
            None => line.to_string(),
        }
    }
}

impl FormatRule for FrontMatterRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        5
    }

    fn apply(&self, text: &str) -> RuleOutput {
        let mut lines = text.split_inclusive('\n');
        let Some(first) = lines.next() else {
            return RuleOutput::unchanged(text);
        };
        if split_terminator(first).0.trim_end() != "---" {
            return RuleOutput::unchanged(text);
        }

        let mut consumed = first.len();
        let mut body = Vec::new();
        let mut closing = None;
        for raw in lines {
            consumed += raw.len();
            if matches!(split_terminator(raw).0.trim_end(), "---" | "...") {
                closing = Some(raw);
                break;
            }
            body.push(raw);
        }
        // No closing delimiter: not front matter, just a thematic break
        let Some(closing) = closing else {
            return RuleOutput::unchanged(text);
        };

        let mut out = String::with_capacity(text.len());
        let mut count = 0;
        out.push_str(first);
        for raw in body {
            let (content, terminator) = split_terminator(raw);
            if content.trim().is_empty() {
                count += 1;
                continue;
            }
            let normalized = Self::normalize_entry(content.trim_end());
            if normalized != content {
                count += 1;
            }
            out.push_str(&normalized);
            out.push_str(terminator);
        }
        out.push_str(closing);
        out.push_str(&text[consumed..]);

        RuleOutput::new(out, count)
    }
}
