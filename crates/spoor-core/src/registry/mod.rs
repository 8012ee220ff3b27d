//! Detection type registry.
//!
//! A registry is an owned value: each engine holds its own, so engines with
//! different rule sets can coexist. Specs are shared behind `Arc` and are
//! replaced rather than edited.

mod builtin;
mod hooks;
mod spec;

pub use builtin::builtin_types;
pub use hooks::{
    DigitsNormalizer, IntlPhoneNormalizer, LowercaseNormalizer, MacAddressNormalizer,
    PatternExclusion, PhoneNormalizer, ProfileHandleExtractor, TrailingPunctuationExtractor,
};
pub use spec::{
    CustomPatternDefinition, DetectionTypeSpec, ExclusionFilter, Matcher, Normalizer,
    PatternMatcher, RawMatch, ValueExtractor, DEFAULT_CONTEXT_WIDTH, DEFAULT_CUSTOM_PRIORITY,
};

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::error::SpoorResult;
use crate::types::DetectionTypeInfo;

/// Keyed set of detection types.
#[derive(Debug, Clone, Default)]
pub struct DetectionRegistry {
    types: BTreeMap<String, Arc<DetectionTypeSpec>>,
}

impl DetectionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in table.
    pub fn with_builtins() -> Self {
        let types = builtin_types()
            .into_iter()
            .map(|spec| (spec.key.clone(), Arc::new(spec)))
            .collect();
        Self { types }
    }

    /// Register a type after structural validation. An existing key is replaced.
    pub fn add_pattern(&mut self, spec: DetectionTypeSpec) -> SpoorResult<()> {
        spec.validate()?;
        let key = spec.key.clone();
        let replaced = self.types.insert(key.clone(), Arc::new(spec)).is_some();
        info!(key = %key, replaced, "Registered detection type");
        Ok(())
    }

    /// Compile and register a custom definition.
    pub fn add_custom(&mut self, definition: CustomPatternDefinition) -> SpoorResult<()> {
        self.add_pattern(DetectionTypeSpec::try_from(definition)?)
    }

    /// Remove a type. Returns whether it existed.
    pub fn remove_pattern(&mut self, key: &str) -> bool {
        let removed = self.types.remove(key).is_some();
        if removed {
            info!(key = %key, "Removed detection type");
        }
        removed
    }

    pub fn get(&self, key: &str) -> Option<&Arc<DetectionTypeSpec>> {
        self.types.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DetectionTypeSpec>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Public descriptions, ordered by priority then key.
    pub fn describe(&self) -> Vec<DetectionTypeInfo> {
        let mut infos: Vec<_> = self.types.values().map(|spec| spec.info()).collect();
        infos.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.key.cmp(&b.key)));
        infos
    }
}
