use super::engine::{map_prose_lines, FormatRule, RuleOutput};
use regex::Regex;
use std::sync::LazyLock;

static DELIMITER_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:?-+:?$").unwrap());

// TableAlignRule - pads pipe-table cells
//
// Width policy is per row: every cell in a row is padded to that row's widest
// cell. The delimiter row (`|---|:-:|`) has no content of its own, so it takes
// the width of the header row right above it.
pub struct TableAlignRule;

impl TableAlignRule {
    pub const NAME: &'static str = "table_format";
}

impl FormatRule for TableAlignRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        65
    }

    fn apply(&self, text: &str) -> RuleOutput {
        let mut previous_width: Option<usize> = None;

        map_prose_lines(text, |line| {
            let Some((indent, cells)) = parse_row(line) else {
                previous_width = None;
                return None;
            };

            if is_delimiter_row(&cells) {
                let own = max_width(&cells);
                let width = previous_width.unwrap_or(own);
                return Some(format!("{indent}{}", render_delimiter(&cells, width)));
            }

            let width = max_width(&cells);
            previous_width = Some(width);
            Some(format!("{indent}{}", render_row(&cells, width)))
        })
    }
}

/// Leading indentation and trimmed cells of a pipe-bounded table row.
fn parse_row(line: &str) -> Option<(&str, Vec<String>)> {
    let trimmed = line.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return None;
    }
    if trimmed.ends_with("\\|") {
        return None;
    }
    let indent = &line[..line.len() - line.trim_start().len()];
    let inner = &trimmed[1..trimmed.len() - 1];
    let cells = split_unescaped(inner)
        .into_iter()
        .map(|cell| cell.trim().to_string())
        .collect();
    Some((indent, cells))
}

/// Split on `|` that isn't backslash-escaped.
fn split_unescaped(inner: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in inner.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '|' if !escaped => {
                cells.push(&inner[start..i]);
                start = i + 1;
            }
            _ => escaped = false,
        }
        if c == '|' {
            escaped = false;
        }
    }
    cells.push(&inner[start..]);
    cells
}

fn is_delimiter_row(cells: &[String]) -> bool {
    !cells.is_empty() && cells.iter().all(|c| DELIMITER_CELL.is_match(c))
}

fn max_width(cells: &[String]) -> usize {
    cells.iter().map(|c| c.chars().count()).max().unwrap_or(0)
}

fn render_row(cells: &[String], width: usize) -> String {
    let padded: Vec<String> = cells.iter().map(|c| format!("{c:<width$}")).collect();
    format!("| {} |", padded.join(" | "))
}

/// Each delimiter cell spans the same columns as a content cell: width plus
/// the two padding spaces. Alignment colons are kept at the ends.
fn render_delimiter(cells: &[String], width: usize) -> String {
    let span = width.max(1) + 2;
    let rendered: Vec<String> = cells
        .iter()
        .map(|cell| {
            let left = cell.starts_with(':');
            let right = cell.len() > 1 && cell.ends_with(':');
            let colons = usize::from(left) + usize::from(right);
            format!(
                "{}{}{}",
                if left { ":" } else { "" },
                "-".repeat(span - colons),
                if right { ":" } else { "" }
            )
        })
        .collect();
    format!("|{}|", rendered.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_table() {
        let out = TableAlignRule.apply("|A|B|\n|-|-|\n|1|2|");
        assert_eq!(out.text, "| A | B |\n|---|---|\n| 1 | 2 |");
        assert_eq!(out.substitutions, 3);
    }

    #[test]
    fn test_per_row_width() {
        let out = TableAlignRule.apply("| Name | Age |\n| --- | --- |\n| Al | 7 |");
        assert_eq!(
            out.text,
            "| Name | Age  |\n|------|------|\n| Al | 7  |"
        );
    }

    #[test]
    fn test_alignment_colons_kept() {
        let out = TableAlignRule.apply("|a|b|c|\n|:-|-:|:-:|");
        assert_eq!(out.text, "| a | b | c |\n|:--|--:|:-:|");
    }

    #[test]
    fn test_escaped_pipe_stays_in_cell() {
        let out = TableAlignRule.apply("|a\\|b|c|");
        assert_eq!(out.text, "| a\\|b | c    |");
    }

    #[test]
    fn test_already_aligned_is_stable() {
        let input = "| A | B |\n|---|---|\n| 1 | 2 |";
        let out = TableAlignRule.apply(input);
        assert_eq!(out.text, input);
        assert_eq!(out.substitutions, 0);
    }

    #[test]
    fn test_non_table_lines_untouched() {
        let input = "a | b\n|not closed\n```\n|x|y|\n```";
        assert_eq!(TableAlignRule.apply(input).text, input);
    }
}
