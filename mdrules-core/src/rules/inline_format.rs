use super::engine::{map_prose, rewrite_captures, FormatRule, RuleOutput};
use regex::{Captures, Regex};
use std::sync::LazyLock;

// Inline markup touch-ups: links, images and math delimiters.

static INLINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]\n]*)\]\([ \t]*([^)\s]+)([ \t]+"[^"\n]*")?[ \t]*\)"#).unwrap()
});

static INLINE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]\n]*)\]\([ \t]*([^)\s]+)([ \t]+"[^"\n]*")?[ \t]*\)"#).unwrap()
});

static MATH_INLINE_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\((.+?)\\\)").unwrap());

static MATH_DISPLAY_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.+?)\\\]").unwrap());

static MATH_DISPLAY_DOLLAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$([^$]+?)\$\$").unwrap());

fn trim_blanks(s: &str) -> &str {
    s.trim_matches([' ', '\t'])
}

/// ` "Title"` with its leading whitespace collapsed to one space.
fn link_title(caps: &Captures<'_>, index: usize) -> String {
    caps.get(index)
        .map(|t| format!(" {}", t.as_str().trim_start()))
        .unwrap_or_default()
}

// LinkFormatRule - tidies inline link syntax
pub struct LinkFormatRule;

impl LinkFormatRule {
    pub const NAME: &'static str = "link_format";
}

impl FormatRule for LinkFormatRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        50
    }

    /// Images share the bracket syntax; let the image rule settle them first.
    fn dependencies(&self) -> Vec<String> {
        vec![ImageOptimizationRule::NAME.to_string()]
    }

    fn apply(&self, text: &str) -> RuleOutput {
        map_prose(text, |prose| {
            rewrite_captures(&INLINE_LINK, prose, |caps| {
                if &caps[1] == "!" {
                    return None;
                }
                Some(format!(
                    "[{}]({}{})",
                    trim_blanks(&caps[2]),
                    &caps[3],
                    link_title(caps, 4)
                ))
            })
        })
    }
}

// ImageOptimizationRule - tidies image syntax and fills in missing alt text
pub struct ImageOptimizationRule;

impl ImageOptimizationRule {
    pub const NAME: &'static str = "image_optimization";
}

impl FormatRule for ImageOptimizationRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        48
    }

    fn apply(&self, text: &str) -> RuleOutput {
        map_prose(text, |prose| {
            rewrite_captures(&INLINE_IMAGE, prose, |caps| {
                let url = &caps[2];
                let alt = match trim_blanks(&caps[1]) {
                    "" => alt_from_url(url),
                    given => given.to_string(),
                };
                Some(format!("![{alt}]({url}{})", link_title(caps, 3)))
            })
        })
    }
}

/// `img/My_Chart-1.png?v=2` -> `My Chart 1`
pub fn alt_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    stem.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// MathFormatRule - normalizes LaTeX-style math delimiters to dollars
pub struct MathFormatRule;

impl MathFormatRule {
    pub const NAME: &'static str = "math_format";
}

impl FormatRule for MathFormatRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        45
    }

    fn apply(&self, text: &str) -> RuleOutput {
        map_prose(text, |prose| {
            let (display, a) = rewrite_captures(&MATH_DISPLAY_BRACKET, prose, |caps| {
                Some(format!("$${}$$", trim_blanks(&caps[1])))
            });
            let (inline, b) = rewrite_captures(&MATH_INLINE_PAREN, &display, |caps| {
                Some(format!("${}$", trim_blanks(&caps[1])))
            });
            let (out, c) = rewrite_captures(&MATH_DISPLAY_DOLLAR, &inline, |caps| {
                Some(format!("$${}$$", trim_blanks(&caps[1])))
            });
            (out, a + b + c)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_whitespace_trimmed() {
        let out = LinkFormatRule.apply("See [ the docs ]( https://x.example  \"Docs\" ) now.");
        assert_eq!(out.text, "See [the docs](https://x.example \"Docs\") now.");
        assert_eq!(out.substitutions, 1);
    }

    #[test]
    fn test_link_format_skips_images() {
        let input = "![ alt ]( a.png )";
        assert_eq!(LinkFormatRule.apply(input).text, input);
    }

    #[test]
    fn test_clean_link_not_counted() {
        let out = LinkFormatRule.apply("[a](b) [c](d \"t\")");
        assert_eq!(out.substitutions, 0);
    }

    #[test]
    fn test_image_alt_filled_from_filename() {
        let out = ImageOptimizationRule.apply("![](img/My_Chart-1.png)");
        assert_eq!(out.text, "![My Chart 1](img/My_Chart-1.png)");
    }

    #[test]
    fn test_image_whitespace_trimmed() {
        let out = ImageOptimizationRule.apply("![ Logo ](  logo.svg )");
        assert_eq!(out.text, "![Logo](logo.svg)");
    }

    #[test]
    fn test_alt_from_url_edge_cases() {
        assert_eq!(alt_from_url("https://cdn.example/a/b/photo_01.jpg?w=200#top"), "photo 01");
        assert_eq!(alt_from_url(".hidden"), ".hidden");
        assert_eq!(alt_from_url("noext"), "noext");
    }

    #[test]
    fn test_math_delimiters() {
        let out = MathFormatRule.apply(r"Inline \( a+b \) and \[ x^2 \] and $$ y $$.");
        assert_eq!(out.text, "Inline $a+b$ and $$x^2$$ and $$y$$.");
        assert_eq!(out.substitutions, 3);
    }

    #[test]
    fn test_math_leaves_currency_alone() {
        let input = "It costs $5 or $6.";
        assert_eq!(MathFormatRule.apply(input).text, input);
    }
}
