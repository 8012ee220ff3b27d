//! Markup to plain text conversion ahead of pattern matching.
//!
//! Steps run in a fixed order: drop `<script>`/`<style>` elements with their
//! content, drop comments, replace every remaining tag with one space, decode
//! entities, collapse whitespace. Context snippets and source spans are taken
//! from the output of [`html_to_text`], so the order matters.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Named entities decoded by [`decode_entities`]. Anything else is left as-is.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", " "),
    ("copy", "\u{a9}"),
    ("reg", "\u{ae}"),
    ("trade", "\u{2122}"),
    ("hellip", "\u{2026}"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
];

/// Convert page markup into whitespace-normalized plain text.
pub fn html_to_text(markup: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(markup, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = COMMENT.replace_all(&text, "");
    let text = TAG.replace_all(&text, " ");
    let text = decode_entities(&text);
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Decode the fixed named-entity table plus decimal and hex character references.
///
/// Decoding is a single pass, so `&amp;lt;` becomes `&lt;` rather than `<`.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32).map(String::from)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from)
            } else {
                NAMED_ENTITIES
                    .iter()
                    .find(|(name, _)| *name == body)
                    .map(|(_, value)| (*value).to_string())
            };
            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script_and_style_with_content() {
        let html = "<p>before</p><script type=\"text/javascript\">var x = 'a@b.com';</script>\
                    <style>.c { color: red; }</style><p>after</p>";
        assert_eq!(html_to_text(html), "before after");
    }

    #[test]
    fn test_removes_comments() {
        let html = "visible<!-- hidden@example.com -->text";
        assert_eq!(html_to_text(html), "visibletext");
    }

    #[test]
    fn test_tags_become_word_boundaries() {
        assert_eq!(html_to_text("<td>one</td><td>two</td>"), "one two");
    }

    #[test]
    fn test_decodes_named_numeric_and_hex_entities() {
        assert_eq!(
            html_to_text("a&amp;b &lt;x&gt; &#64; &#x40; &copy;"),
            "a&b <x> @ @ \u{a9}"
        );
    }

    #[test]
    fn test_unknown_entity_left_alone() {
        assert_eq!(decode_entities("&bogus; &amp;lt;"), "&bogus; &lt;");
    }

    #[test]
    fn test_collapses_whitespace_and_nbsp() {
        assert_eq!(html_to_text("  a\n\n\tb&nbsp;&nbsp;c  "), "a b c");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "Contact me at jane@example.com or call (415) 555-2671";
        assert_eq!(html_to_text(text), text);
    }
}
