//! Detection type descriptors and their capability traits.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ErrorCode, SpoorError, SpoorResult};
use crate::registry::hooks::PatternExclusion;
use crate::types::{DetectionTypeInfo, IdentifierType, SourceSpan};
use crate::validators::Validator;

/// Default characters of context kept on each side of a match.
pub const DEFAULT_CONTEXT_WIDTH: usize = 50;

/// Default priority for custom patterns (sorts after every built-in type).
pub const DEFAULT_CUSTOM_PRIORITY: u32 = 99;

/// A single raw occurrence produced by a [`Matcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMatch<'t> {
    pub text: &'t str,
    pub span: SourceSpan,
}

/// Finds all non-overlapping candidate occurrences in a text.
pub trait Matcher: Send + Sync {
    /// Scan the whole text.
    fn find_all<'t>(&self, text: &'t str) -> SpoorResult<Vec<RawMatch<'t>>>;

    /// Human-readable form of the rule.
    fn describe(&self) -> String;
}

/// Rewrites a value into its canonical form (e.g. E.164 phone numbers).
pub trait Normalizer: Send + Sync {
    fn normalize(&self, value: &str) -> String;
}

/// Derives the identifier from the raw matched text (e.g. a handle from a profile URL).
///
/// `Ok(None)` discards the candidate.
pub trait ValueExtractor: Send + Sync {
    fn extract(&self, raw: &str) -> SpoorResult<Option<String>>;
}

/// Rejects raw matched text that only looks like the type.
pub trait ExclusionFilter: Send + Sync {
    fn is_excluded(&self, raw: &str) -> bool;
}

impl<F> Normalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn normalize(&self, value: &str) -> String {
        self(value)
    }
}

impl<F> ValueExtractor for F
where
    F: Fn(&str) -> SpoorResult<Option<String>> + Send + Sync,
{
    fn extract(&self, raw: &str) -> SpoorResult<Option<String>> {
        self(raw)
    }
}

impl<F> ExclusionFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_excluded(&self, raw: &str) -> bool {
        self(raw)
    }
}

/// Regex matching rule with optional guards on the characters around a match.
///
/// The `regex` crate has no look-behind, so "not preceded by `@`" style
/// constraints are checked here after the match is found.
#[derive(Clone)]
pub struct PatternMatcher {
    regex: Regex,
    reject_before: Option<fn(char) -> bool>,
    reject_after: Option<fn(char) -> bool>,
}

impl PatternMatcher {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::from_regex(Regex::new(pattern)?))
    }

    /// Wrap an already compiled regex.
    pub fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            reject_before: None,
            reject_after: None,
        }
    }

    /// Drop matches whose preceding character satisfies `guard`.
    pub fn not_preceded_by(mut self, guard: fn(char) -> bool) -> Self {
        self.reject_before = Some(guard);
        self
    }

    /// Drop matches whose following character satisfies `guard`.
    pub fn not_followed_by(mut self, guard: fn(char) -> bool) -> Self {
        self.reject_after = Some(guard);
        self
    }

    fn accepts(&self, text: &str, start: usize, end: usize) -> bool {
        if let Some(guard) = self.reject_before {
            if text[..start].chars().next_back().is_some_and(guard) {
                return false;
            }
        }
        if let Some(guard) = self.reject_after {
            if text[end..].chars().next().is_some_and(guard) {
                return false;
            }
        }
        true
    }
}

impl Matcher for PatternMatcher {
    fn find_all<'t>(&self, text: &'t str) -> SpoorResult<Vec<RawMatch<'t>>> {
        Ok(self
            .regex
            .find_iter(text)
            .filter(|m| !m.as_str().is_empty() && self.accepts(text, m.start(), m.end()))
            .map(|m| RawMatch {
                text: m.as_str(),
                span: SourceSpan::new(m.start(), m.end()),
            })
            .collect())
    }

    fn describe(&self) -> String {
        self.regex.as_str().to_string()
    }
}

/// Immutable descriptor of one detection type.
///
/// Built with the `with_*` methods, then handed to a registry which shares it
/// behind an `Arc`. Optional hooks are absent rather than no-ops.
#[derive(Clone)]
pub struct DetectionTypeSpec {
    /// Unique key (e.g. `email`).
    pub key: String,
    pub display_name: String,
    /// Ordered matching rules.
    pub matchers: Vec<Arc<dyn Matcher>>,
    pub target: IdentifierType,
    pub validator: Option<Validator>,
    pub context_width: usize,
    /// Lower sorts first.
    pub priority: u32,
    pub metadata: HashMap<String, serde_json::Value>,
    pub sensitive: bool,
    pub normalizer: Option<Arc<dyn Normalizer>>,
    pub extractor: Option<Arc<dyn ValueExtractor>>,
    pub exclusion: Option<Arc<dyn ExclusionFilter>>,
}

impl DetectionTypeSpec {
    /// Create a descriptor with no rules and default settings.
    pub fn new(key: impl Into<String>, display_name: impl Into<String>, target: IdentifierType) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            matchers: Vec::new(),
            target,
            validator: None,
            context_width: DEFAULT_CONTEXT_WIDTH,
            priority: DEFAULT_CUSTOM_PRIORITY,
            metadata: HashMap::new(),
            sensitive: false,
            normalizer: None,
            extractor: None,
            exclusion: None,
        }
    }

    /// Append a matching rule.
    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matchers.push(Arc::new(matcher));
        self
    }

    /// Compile and append a regex matching rule.
    pub fn with_pattern(self, pattern: &str) -> SpoorResult<Self> {
        let matcher = PatternMatcher::new(pattern).map_err(|e| {
            SpoorError::invalid_pattern(&self.key, e.to_string(), ErrorCode::PatInvalidRegex)
        })?;
        Ok(self.with_matcher(matcher))
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_context_width(mut self, width: usize) -> Self {
        self.context_width = width;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Add a static metadata tag.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    pub fn with_normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    pub fn with_extractor(mut self, extractor: impl ValueExtractor + 'static) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    pub fn with_exclusion(mut self, exclusion: impl ExclusionFilter + 'static) -> Self {
        self.exclusion = Some(Arc::new(exclusion));
        self
    }

    /// Structural check applied before registration.
    pub fn validate(&self) -> SpoorResult<()> {
        if self.key.trim().is_empty() {
            return Err(SpoorError::invalid_pattern(
                &self.key,
                "key must not be empty",
                ErrorCode::PatInvalidKey,
            ));
        }
        if self.matchers.is_empty() {
            return Err(SpoorError::invalid_pattern(
                &self.key,
                "at least one matching rule is required",
                ErrorCode::PatMissingRules,
            ));
        }
        Ok(())
    }

    /// Public description of this type.
    pub fn info(&self) -> DetectionTypeInfo {
        DetectionTypeInfo {
            key: self.key.clone(),
            name: self.display_name.clone(),
            orphan_type: self.target,
            priority: self.priority,
            sensitive: self.sensitive,
            validator: self.validator.map(|v| v.to_string()),
            pattern_count: self.matchers.len(),
        }
    }
}

impl fmt::Debug for DetectionTypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionTypeSpec")
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field(
                "matchers",
                &self.matchers.iter().map(|m| m.describe()).collect::<Vec<_>>(),
            )
            .field("target", &self.target)
            .field("validator", &self.validator)
            .field("context_width", &self.context_width)
            .field("priority", &self.priority)
            .field("sensitive", &self.sensitive)
            .field("normalizer", &self.normalizer.is_some())
            .field("extractor", &self.extractor.is_some())
            .field("exclusion", &self.exclusion.is_some())
            .finish()
    }
}

/// Serializable definition of a user-supplied detection type.
///
/// This is the shape accepted from configuration files and from the MCP
/// `add_detection_pattern` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPatternDefinition {
    pub key: String,
    pub patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_orphan_type")]
    pub orphan_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub sensitive: bool,
    /// Regexes; a raw match satisfying any of them is discarded.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_orphan_type() -> String {
    IdentifierType::Other.to_string()
}

fn default_context_chars() -> usize {
    DEFAULT_CONTEXT_WIDTH
}

fn default_priority() -> u32 {
    DEFAULT_CUSTOM_PRIORITY
}

impl CustomPatternDefinition {
    /// Minimal definition with defaults for everything but key and patterns.
    pub fn new(key: impl Into<String>, patterns: Vec<String>) -> Self {
        Self {
            key: key.into(),
            patterns,
            name: None,
            orphan_type: default_orphan_type(),
            validator: None,
            context_chars: DEFAULT_CONTEXT_WIDTH,
            priority: DEFAULT_CUSTOM_PRIORITY,
            metadata: HashMap::new(),
            sensitive: false,
            exclude: Vec::new(),
        }
    }
}

impl TryFrom<CustomPatternDefinition> for DetectionTypeSpec {
    type Error = SpoorError;

    fn try_from(def: CustomPatternDefinition) -> SpoorResult<Self> {
        let target = IdentifierType::from_str(&def.orphan_type).map_err(|_| {
            SpoorError::invalid_pattern(
                &def.key,
                format!(
                    "unknown orphan type '{}'. Valid types: {}",
                    def.orphan_type,
                    IdentifierType::all_names().join(", ")
                ),
                ErrorCode::PatUnknownClassification,
            )
        })?;

        let name = def.name.clone().unwrap_or_else(|| def.key.clone());
        let mut spec = DetectionTypeSpec::new(&def.key, name, target)
            .with_context_width(def.context_chars)
            .with_priority(def.priority)
            .with_sensitive(def.sensitive);

        if let Some(validator) = &def.validator {
            let parsed = Validator::from_str(validator)
                .map_err(|_| SpoorError::unknown_validator(&def.key, validator))?;
            spec = spec.with_validator(parsed);
        }

        for pattern in &def.patterns {
            spec = spec.with_pattern(pattern)?;
        }

        if !def.exclude.is_empty() {
            let exclusion = PatternExclusion::new(&def.exclude).map_err(|e| {
                SpoorError::invalid_pattern(&def.key, e.to_string(), ErrorCode::PatInvalidRegex)
            })?;
            spec = spec.with_exclusion(exclusion);
        }

        spec.metadata = def.metadata;
        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matcher_finds_non_overlapping() {
        let matcher = PatternMatcher::new(r"CUST-\d{3}").unwrap();
        let found = matcher.find_all("CUST-001 and CUST-002").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text, "CUST-001");
        assert_eq!(found[1].span, SourceSpan::new(13, 21));
    }

    #[test]
    fn test_pattern_matcher_guards() {
        let matcher = PatternMatcher::new(r"\bexample\.com\b")
            .unwrap()
            .not_preceded_by(|c| c == '@')
            .not_followed_by(|c| c == '@');
        assert!(matcher.find_all("jane@example.com").unwrap().is_empty());
        assert!(matcher.find_all("example.com@host").unwrap().is_empty());
        assert_eq!(matcher.find_all("see example.com").unwrap().len(), 1);
    }

    #[test]
    fn test_validate_requires_rules() {
        let spec = DetectionTypeSpec::new("empty", "Empty", IdentifierType::Other);
        let err = spec.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::PatMissingRules);
    }

    #[test]
    fn test_custom_definition_compiles() {
        let mut def = CustomPatternDefinition::new("custom_id", vec![r"CUST-\d{6}".to_string()]);
        def.name = Some("Customer ID".to_string());
        def.validator = Some("luhn".to_string());
        let spec = DetectionTypeSpec::try_from(def).unwrap();
        assert_eq!(spec.display_name, "Customer ID");
        assert_eq!(spec.target, IdentifierType::Other);
        assert_eq!(spec.priority, DEFAULT_CUSTOM_PRIORITY);
        assert_eq!(spec.context_width, DEFAULT_CONTEXT_WIDTH);
        assert_eq!(spec.validator, Some(Validator::Luhn));
    }

    #[test]
    fn test_custom_definition_rejects_bad_input() {
        let empty = CustomPatternDefinition::new("nothing", vec![]);
        assert_eq!(
            DetectionTypeSpec::try_from(empty).unwrap_err().code(),
            ErrorCode::PatMissingRules
        );

        let bad_regex = CustomPatternDefinition::new("broken", vec!["(unclosed".to_string()]);
        assert_eq!(
            DetectionTypeSpec::try_from(bad_regex).unwrap_err().code(),
            ErrorCode::PatInvalidRegex
        );

        let mut bad_validator = CustomPatternDefinition::new("v", vec!["x".to_string()]);
        bad_validator.validator = Some("checksum".to_string());
        assert_eq!(
            DetectionTypeSpec::try_from(bad_validator).unwrap_err().code(),
            ErrorCode::PatUnknownValidator
        );

        let mut bad_type = CustomPatternDefinition::new("t", vec!["x".to_string()]);
        bad_type.orphan_type = "passport".to_string();
        assert_eq!(
            DetectionTypeSpec::try_from(bad_type).unwrap_err().code(),
            ErrorCode::PatUnknownClassification
        );
    }

    #[test]
    fn test_definition_deserializes_with_defaults() {
        let def: CustomPatternDefinition =
            serde_json::from_str(r#"{"key": "ticket", "patterns": ["TCK-\\d+"]}"#).unwrap();
        assert_eq!(def.orphan_type, "other");
        assert_eq!(def.context_chars, 50);
        assert_eq!(def.priority, 99);
        assert!(def.exclude.is_empty());
    }
}
