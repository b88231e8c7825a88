use regex::{Captures, Regex, Replacer};
use std::sync::LazyLock;

// Rule contract and the text utilities every built-in shares.
// Rules see the whole document as a string and hand back a new string plus a
// substitution count; the formatter threads the text through them in order.

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").unwrap());

/// Result of applying one rule to one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutput {
    pub text: String,
    pub substitutions: usize,
}

impl RuleOutput {
    pub fn new(text: String, substitutions: usize) -> Self {
        Self {
            text,
            substitutions,
        }
    }

    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            substitutions: 0,
        }
    }
}

/// A named, prioritized text transformation.
///
/// `apply` must depend on its input only: no state carried between calls,
/// no clock, no randomness. The formatter relies on that for reproducible
/// output and to share one rule set across threads.
pub trait FormatRule: Send + Sync {
    /// Stable identity used by the catalog, the planner and dependency lists.
    fn name(&self) -> &str;

    /// Lower runs earlier when no dependency says otherwise.
    fn priority(&self) -> i32;

    /// Rules that must run before this one when they are also active.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply(&self, text: &str) -> RuleOutput;
}

impl std::fmt::Debug for dyn FormatRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRule")
            .field("name", &self.name())
            .field("priority", &self.priority())
            .finish()
    }
}

/// A contiguous slice of the document, either inside a fenced code block
/// (fence lines included) or outside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Code(&'a str),
}

/// Split text into prose and fenced-code segments. An unclosed fence runs to
/// the end of the document.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut segment_start = 0;
    let mut offset = 0;
    let mut open_fence: Option<(char, usize)> = None;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        match open_fence {
            None => {
                if let Some(caps) = FENCE_OPEN.captures(line) {
                    let fence = &caps[1];
                    let fence_char = fence.chars().next().unwrap_or('`');
                    if fence_char == '`' && line[caps[0].len()..].contains('`') {
                        // Inline code span, not a fence
                        continue;
                    }
                    if line_start > segment_start {
                        segments.push(Segment::Prose(&text[segment_start..line_start]));
                    }
                    segment_start = line_start;
                    open_fence = Some((fence_char, fence.len()));
                }
            }
            Some((fence_char, fence_len)) => {
                let trimmed = line.trim();
                if trimmed.len() >= fence_len && trimmed.chars().all(|c| c == fence_char) {
                    segments.push(Segment::Code(&text[segment_start..offset]));
                    segment_start = offset;
                    open_fence = None;
                }
            }
        }
    }

    if segment_start < text.len() {
        let rest = &text[segment_start..];
        if open_fence.is_some() {
            segments.push(Segment::Code(rest));
        } else {
            segments.push(Segment::Prose(rest));
        }
    }

    segments
}

/// Rewrite prose segments with `f`, copying fenced code through untouched.
pub fn map_prose<F>(text: &str, mut f: F) -> RuleOutput
where
    F: FnMut(&str) -> (String, usize),
{
    let mut out = String::with_capacity(text.len());
    let mut substitutions = 0;
    for segment in split_segments(text) {
        match segment {
            Segment::Prose(prose) => {
                let (rewritten, count) = f(prose);
                out.push_str(&rewritten);
                substitutions += count;
            }
            Segment::Code(code) => out.push_str(code),
        }
    }
    RuleOutput::new(out, substitutions)
}

/// Line-wise rewrite outside fenced code. `f` receives a line without its
/// terminator and returns the replacement when it wants one; a replacement
/// equal to the input is not counted.
pub fn map_prose_lines<F>(text: &str, mut f: F) -> RuleOutput
where
    F: FnMut(&str) -> Option<String>,
{
    map_prose(text, |prose| {
        let mut out = String::with_capacity(prose.len());
        let mut count = 0;
        for raw in prose.split_inclusive('\n') {
            let (content, terminator) = split_terminator(raw);
            match f(content) {
                Some(replacement) if replacement != content => {
                    out.push_str(&replacement);
                    count += 1;
                }
                _ => out.push_str(content),
            }
            out.push_str(terminator);
        }
        (out, count)
    })
}

/// `replace_all` that also reports how many matches were replaced.
pub fn replace_counted<R: Replacer>(re: &Regex, text: &str, rep: R) -> (String, usize) {
    let count = re.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (re.replace_all(text, rep).into_owned(), count)
}

/// Rewrite each match with `f`; `None` (or an identical string) keeps the
/// match as-is and isn't counted.
pub fn rewrite_captures<F>(re: &Regex, text: &str, mut f: F) -> (String, usize)
where
    F: FnMut(&Captures<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        match f(&caps) {
            Some(replacement) if replacement != whole.as_str() => {
                out.push_str(&text[last..whole.start()]);
                out.push_str(&replacement);
                last = whole.end();
                count += 1;
            }
            _ => {}
        }
    }
    out.push_str(&text[last..]);
    (out, count)
}

pub(crate) fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}
