//! Context snippets and suggested tags for detected items.

use crate::registry::DetectionTypeSpec;
use crate::types::SourceSpan;

const ELLIPSIS: &str = "...";

/// Metadata keys whose values become tags, in tag order.
const TAGGED_METADATA: &[&str] = &["platform", "currency", "network", "semantic_type"];

/// `width` characters of text on each side of `span`.
///
/// A side cut short of the text boundary gets an ellipsis. The result is
/// trimmed of surrounding whitespace.
pub fn context_snippet(text: &str, span: SourceSpan, width: usize) -> String {
    let start = back_chars(text, span.start, width);
    let end = forward_chars(text, span.end, width);

    let mut snippet = String::with_capacity(end - start + 2 * ELLIPSIS.len());
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(&text[start..end]);
    if end < text.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet.trim().to_string()
}

fn back_chars(text: &str, from: usize, n: usize) -> usize {
    if n == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn forward_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Tags for one item: the dashed type key, metadata-derived tags, and the
/// mail provider for emails.
pub fn suggested_tags(spec: &DetectionTypeSpec, value: &str) -> Vec<String> {
    let mut tags = vec![spec.key.replace('_', "-")];

    for key in TAGGED_METADATA {
        if let Some(tag) = spec.metadata.get(*key).and_then(|v| v.as_str()) {
            let tag = if *key == "currency" {
                tag.to_lowercase()
            } else {
                tag.to_string()
            };
            push_unique(&mut tags, tag);
        }
    }

    if spec.key == "email" {
        if let Some(provider) = email_provider(value) {
            push_unique(&mut tags, provider.to_string());
        }
    }

    tags
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

/// Best-effort provider from a substring check on the domain part.
pub fn email_provider(email: &str) -> Option<&'static str> {
    let domain = email.rsplit_once('@')?.1.to_lowercase();
    if domain.contains("gmail") || domain.contains("googlemail") {
        Some("gmail")
    } else if domain.contains("yahoo") || domain.contains("ymail") {
        Some("yahoo")
    } else if ["outlook", "hotmail", "live", "msn"]
        .iter()
        .any(|p| domain.contains(p))
    {
        Some("microsoft")
    } else if domain.contains("proton") {
        Some("protonmail")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IdentifierType;

    #[test]
    fn test_snippet_without_truncation() {
        let text = "call (415) 555-2671 now";
        let snippet = context_snippet(text, SourceSpan::new(5, 19), 50);
        assert_eq!(snippet, text);
    }

    #[test]
    fn test_snippet_truncated_both_sides() {
        let text = "aaaaaaaaaa MATCH bbbbbbbbbb";
        let snippet = context_snippet(text, SourceSpan::new(11, 16), 3);
        assert_eq!(snippet, "...aa MATCH bb...");
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        let text = "\u{e9}\u{e9}\u{e9}X\u{e9}\u{e9}\u{e9}";
        let start = "\u{e9}\u{e9}\u{e9}".len();
        let snippet = context_snippet(text, SourceSpan::new(start, start + 1), 2);
        assert_eq!(snippet, "...\u{e9}\u{e9}X\u{e9}\u{e9}...");
    }

    #[test]
    fn test_zero_width_snippet() {
        let snippet = context_snippet("ab X cd", SourceSpan::new(3, 4), 0);
        assert_eq!(snippet, "...X...");
    }

    #[test]
    fn test_tags_from_metadata() {
        let spec = DetectionTypeSpec::new("crypto_btc", "Bitcoin", IdentifierType::CryptoAddress)
            .with_metadata("currency", "BTC")
            .with_metadata("network", "bitcoin");
        assert_eq!(suggested_tags(&spec, "1abc"), vec!["crypto-btc", "btc", "bitcoin"]);
    }

    #[test]
    fn test_email_provider_tag() {
        let spec = DetectionTypeSpec::new("email", "Email", IdentifierType::Email);
        assert_eq!(suggested_tags(&spec, "a@gmail.com"), vec!["email", "gmail"]);
        assert_eq!(suggested_tags(&spec, "a@hotmail.co.uk"), vec!["email", "microsoft"]);
        assert_eq!(suggested_tags(&spec, "a@proton.me"), vec!["email", "protonmail"]);
        assert_eq!(suggested_tags(&spec, "a@example.com"), vec!["email"]);
    }
}
