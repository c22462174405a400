//! Text cleanup before layout: markdown emphasis removal and base-14 font encoding.

use std::sync::OnceLock;

use regex::Regex;

/// Paired `**x**`, `__x__`, `*x*` or `_x_` that open and close at word boundaries.
fn emphasis_regex() -> &'static Regex {
    static EMPHASIS_RE: OnceLock<Regex> = OnceLock::new();
    EMPHASIS_RE.get_or_init(|| {
        Regex::new(
            r"\B\*\*([^\s*](?:[^*\n]*[^\s*])?)\*\*\B|\b__([^\s_](?:[^_\n]*[^\s_])?)__\b|\B\*([^\s*](?:[^*\n]*[^\s*])?)\*\B|\b_([^\s_](?:[^_\n]*[^\s_])?)_\b",
        )
        .expect("emphasis regex must compile")
    })
}

/// Removes markdown heading markers, inline code ticks and paired emphasis.
///
/// Lone asterisks (`2 * 3`) and underscores inside words (`list_price`) are kept.
pub fn strip_markup(text: &str) -> String {
    text.replace('`', "")
        .lines()
        .map(|line| {
            let line = line.trim_start().trim_start_matches('#').trim_start();
            let line = match line.strip_prefix("* ") {
                Some(rest) => format!("- {rest}"),
                None => line.to_string(),
            };
            emphasis_regex()
                .replace_all(&line, |caps: &regex::Captures| {
                    (1..=4)
                        .find_map(|i| caps.get(i))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default()
                })
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// True when the line was a markdown heading before cleanup.
pub fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Maps text onto what the built-in PDF fonts can encode.
///
/// Typographic punctuation becomes its ASCII look-alike; anything else outside
/// Latin-1 is replaced with `?` rather than failing the export.
pub fn encode_for_pdf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{00B7}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2009}' | '\u{202F}' => out.push(' '),
            '\t' => out.push(' '),
            c if c.is_control() && c != '\n' => {}
            c if (c as u32) < 0x80 => out.push(c),
            c if (0xA1..=0xFF).contains(&(c as u32)) => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup_removes_emphasis_and_headings() {
        let input = "## Pricing Plan\n**List at $725k** and *hold* for `14` days.\n* Stage the kitchen";
        assert_eq!(
            strip_markup(input),
            "Pricing Plan\nList at $725k and hold for 14 days.\n- Stage the kitchen"
        );
    }

    #[test]
    fn test_strip_markup_keeps_inner_underscores() {
        assert_eq!(strip_markup("__Note__: list_price column"), "Note: list_price column");
    }

    #[test]
    fn test_strip_markup_removes_underscore_emphasis() {
        assert_eq!(strip_markup("Ask sellers to _hold_ firm."), "Ask sellers to hold firm.");
        assert_eq!(strip_markup("_Price_ and __terms__"), "Price and terms");
    }

    #[test]
    fn test_strip_markup_keeps_lone_asterisks() {
        assert_eq!(strip_markup("Budget 2 * 3 weeks, not 2*3*4."), "Budget 2 * 3 weeks, not 2*3*4.");
        assert_eq!(strip_markup("*a* and *b c*"), "a and b c");
    }

    #[test]
    fn test_is_heading() {
        assert!(is_heading("  ### Launch"));
        assert!(!is_heading("Launch #1"));
    }

    #[test]
    fn test_encode_replaces_unencodable() {
        assert_eq!(
            encode_for_pdf("Rick\u{2019}s \u{201C}plan\u{201D} \u{2014} 3\u{00A0}months\u{2026} 🏠 café"),
            "Rick's \"plan\" - 3 months... ? café"
        );
    }

    #[test]
    fn test_encode_drops_control_characters() {
        assert_eq!(encode_for_pdf("a\u{0007}b\tc"), "ab c");
    }
}
