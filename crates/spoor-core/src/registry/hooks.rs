//! Reusable normalizers, extractors and exclusion filters.

use regex::Regex;

use crate::error::SpoorResult;
use crate::registry::spec::{ExclusionFilter, Normalizer, ValueExtractor};

/// Rewrites US numbers into E.164.
///
/// Ten digits gain `+1`, eleven digits with a leading `1` gain `+`. Anything
/// else comes back unchanged, which keeps the normalizer idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNormalizer;

impl Normalizer for PhoneNormalizer {
    fn normalize(&self, value: &str) -> String {
        let digits: String = value.chars().filter(char::is_ascii_digit).collect();
        match digits.len() {
            10 => format!("+1{}", digits),
            11 if digits.starts_with('1') => format!("+{}", digits),
            _ => value.to_string(),
        }
    }
}

/// Strips formatting from international numbers, keeping the leading `+`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntlPhoneNormalizer;

impl Normalizer for IntlPhoneNormalizer {
    fn normalize(&self, value: &str) -> String {
        let digits: String = value.chars().filter(char::is_ascii_digit).collect();
        format!("+{}", digits)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseNormalizer;

impl Normalizer for LowercaseNormalizer {
    fn normalize(&self, value: &str) -> String {
        value.to_lowercase()
    }
}

/// Uppercase hex pairs joined by `:`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacAddressNormalizer;

impl Normalizer for MacAddressNormalizer {
    fn normalize(&self, value: &str) -> String {
        value.to_uppercase().replace('-', ":")
    }
}

/// Keeps ASCII digits only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitsNormalizer;

impl Normalizer for DigitsNormalizer {
    fn normalize(&self, value: &str) -> String {
        value.chars().filter(char::is_ascii_digit).collect()
    }
}

/// Pulls a handle out of a profile URL via capture group 1.
#[derive(Debug, Clone)]
pub struct ProfileHandleExtractor {
    pattern: Regex,
    prefix: &'static str,
}

impl ProfileHandleExtractor {
    /// `prefix` is prepended to the captured handle (`@` for most platforms).
    pub fn new(pattern: Regex, prefix: &'static str) -> Self {
        Self { pattern, prefix }
    }
}

impl ValueExtractor for ProfileHandleExtractor {
    fn extract(&self, raw: &str) -> SpoorResult<Option<String>> {
        let handle = self
            .pattern
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches('.'))
            .filter(|handle| !handle.is_empty());
        Ok(handle.map(|h| format!("{}{}", self.prefix, h)))
    }
}

/// Drops sentence punctuation a URL pattern swallowed at the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingPunctuationExtractor;

impl ValueExtractor for TrailingPunctuationExtractor {
    fn extract(&self, raw: &str) -> SpoorResult<Option<String>> {
        let trimmed = raw.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        Ok(Some(trimmed.to_string()).filter(|v| !v.is_empty()))
    }
}

/// Excludes raw text matching any of a set of regexes.
#[derive(Debug, Clone)]
pub struct PatternExclusion {
    rules: Vec<Regex>,
}

impl PatternExclusion {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let rules = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn from_regexes(rules: Vec<Regex>) -> Self {
        Self { rules }
    }
}

impl ExclusionFilter for PatternExclusion {
    fn is_excluded(&self, raw: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_normalizer_e164() {
        let n = PhoneNormalizer;
        assert_eq!(n.normalize("(415) 555-2671"), "+14155552671");
        assert_eq!(n.normalize("1-415-555-2671"), "+14155552671");
        assert_eq!(n.normalize("555-2671"), "555-2671");
    }

    #[test]
    fn test_phone_normalizer_idempotent() {
        let n = PhoneNormalizer;
        let once = n.normalize("+1 (415) 555-2671");
        assert_eq!(n.normalize(&once), once);
    }

    #[test]
    fn test_mac_normalizer() {
        assert_eq!(MacAddressNormalizer.normalize("00-1a-2b-3c-4d-5e"), "00:1A:2B:3C:4D:5E");
    }

    #[test]
    fn test_profile_handle_extractor() {
        let pattern = Regex::new(r"(?i)github\.com/([a-z0-9-]+)").unwrap();
        let ex = ProfileHandleExtractor::new(pattern, "@");
        assert_eq!(
            ex.extract("https://github.com/octocat").unwrap(),
            Some("@octocat".to_string())
        );
        assert_eq!(ex.extract("gitlab.com/octocat").unwrap(), None);
    }

    #[test]
    fn test_trailing_punctuation() {
        assert_eq!(
            TrailingPunctuationExtractor.extract("https://example.com/a.").unwrap(),
            Some("https://example.com/a".to_string())
        );
    }

    #[test]
    fn test_pattern_exclusion() {
        let ex = PatternExclusion::new(&[r"\.png$", r"\.css$"]).unwrap();
        assert!(ex.is_excluded("logo.png"));
        assert!(!ex.is_excluded("example.com"));
    }
}
