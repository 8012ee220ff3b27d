//! Detection engine.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::detection::context::{context_snippet, suggested_tags};
use crate::error::SpoorResult;
use crate::preprocess::html_to_text;
use crate::registry::{CustomPatternDefinition, DetectionRegistry, DetectionTypeSpec, RawMatch};
use crate::types::{
    DetectedItem, DetectionResult, DetectionStats, DetectionTypeInfo, TypeSummary,
};

/// Confidence assigned when the type's validator accepts the value.
pub const VALIDATED_CONFIDENCE: f32 = 0.95;
/// Confidence assigned when the type's validator rejects the value.
pub const FAILED_VALIDATION_CONFIDENCE: f32 = 0.3;
/// Confidence when no validator runs.
pub const BASE_CONFIDENCE: f32 = 0.8;

/// Options applied to every detection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOptions {
    /// Keys to scan. `None` scans every registered type.
    pub enabled_types: Option<BTreeSet<String>>,
    pub confidence_threshold: f32,
    pub max_items_per_type: usize,
    /// Run validators. When off every candidate scores [`BASE_CONFIDENCE`].
    pub validate: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            enabled_types: None,
            confidence_threshold: 0.5,
            max_items_per_type: 50,
            validate: true,
        }
    }
}

/// Scan outcome for one type, before ids are assigned.
#[derive(Default)]
struct TypeScan {
    items: Vec<DetectedItem>,
    duplicates: u64,
    validation_failures: u64,
    capped: bool,
}

/// Applies a registry's detection types to page text.
///
/// The engine owns its registry, its options and the id counter, so ids stay
/// unique across calls on the same instance.
#[derive(Debug, Clone)]
pub struct DetectionEngine {
    registry: DetectionRegistry,
    options: DetectionOptions,
    next_id: u64,
    stats: DetectionStats,
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::new(DetectionRegistry::with_builtins())
    }
}

impl DetectionEngine {
    /// Create an engine over the given registry with default options.
    pub fn new(registry: DetectionRegistry) -> Self {
        Self {
            registry,
            options: DetectionOptions::default(),
            next_id: 1,
            stats: DetectionStats::default(),
        }
    }

    pub fn with_options(mut self, options: DetectionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: DetectionOptions) {
        self.options = options;
    }

    pub fn registry(&self) -> &DetectionRegistry {
        &self.registry
    }

    pub fn add_pattern(&mut self, spec: DetectionTypeSpec) -> SpoorResult<()> {
        self.registry.add_pattern(spec)
    }

    pub fn add_custom_pattern(&mut self, definition: CustomPatternDefinition) -> SpoorResult<()> {
        self.registry.add_custom(definition)
    }

    pub fn remove_pattern(&mut self, key: &str) -> bool {
        self.registry.remove_pattern(key)
    }

    pub fn detection_types(&self) -> Vec<DetectionTypeInfo> {
        self.registry.describe()
    }

    pub fn stats(&self) -> &DetectionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DetectionStats::default();
    }

    /// Scan page markup with every enabled type.
    ///
    /// Never fails: a type whose rules or hooks error contributes an entry to
    /// `errors` and no items, and scanning continues with the next type.
    pub fn detect_all(&mut self, markup: &str, source_url: Option<&str>) -> DetectionResult {
        let started = Instant::now();
        let page_url = source_url.map(str::to_string);

        if markup.trim().is_empty() {
            return DetectionResult::failure(page_url, "No text content provided");
        }

        let text = html_to_text(markup);
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        let mut items = Vec::new();

        for spec in self.enabled_specs(&mut warnings) {
            match self.scan_type(&spec, &text) {
                Ok(scan) => {
                    if scan.capped {
                        warnings.push(format!(
                            "Reached the limit of {} items for '{}'",
                            self.options.max_items_per_type, spec.key
                        ));
                    }
                    self.stats.duplicates_removed += scan.duplicates;
                    self.stats.validation_failures += scan.validation_failures;
                    for mut item in scan.items {
                        item.id = self.allocate_id();
                        items.push(item);
                    }
                }
                Err(e) => {
                    warn!(detection_type = %spec.key, error = %e, "Detection type failed");
                    errors.push(format!("Error detecting {}: {}", spec.key, e));
                }
            }
        }

        items.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.source_span.start.cmp(&b.source_span.start))
        });

        let mut summary_by_type: BTreeMap<String, TypeSummary> = BTreeMap::new();
        for item in &items {
            summary_by_type
                .entry(item.detection_type.clone())
                .or_insert_with(|| TypeSummary {
                    name: item.display_name.clone(),
                    count: 0,
                })
                .count += 1;
            *self
                .stats
                .by_type
                .entry(item.detection_type.clone())
                .or_insert(0) += 1;
        }

        self.stats.total_scans += 1;
        self.stats.total_items += items.len() as u64;

        let processing_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            items = items.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            elapsed_ms = processing_time_ms,
            "Detection complete"
        );

        DetectionResult {
            success: true,
            page_url,
            detected_at: Utc::now(),
            total_items: items.len(),
            items,
            summary_by_type,
            processing_time_ms,
            errors,
            warnings,
        }
    }

    fn enabled_specs(&self, warnings: &mut Vec<String>) -> Vec<Arc<DetectionTypeSpec>> {
        match &self.options.enabled_types {
            None => self.registry.iter().cloned().collect(),
            Some(keys) => keys
                .iter()
                .filter_map(|key| {
                    let spec = self.registry.get(key).cloned();
                    if spec.is_none() {
                        warnings.push(format!("Unknown detection type: {}", key));
                    }
                    spec
                })
                .collect(),
        }
    }

    fn scan_type(&self, spec: &DetectionTypeSpec, text: &str) -> SpoorResult<TypeScan> {
        let mut scan = TypeScan::default();
        let mut seen = HashSet::new();

        'rules: for matcher in &spec.matchers {
            for raw in matcher.find_all(text)? {
                if scan.items.len() >= self.options.max_items_per_type {
                    scan.capped = true;
                    break 'rules;
                }

                let value = match &spec.extractor {
                    Some(extractor) => match extractor.extract(raw.text)? {
                        Some(value) => value,
                        None => continue,
                    },
                    None => raw.text.to_string(),
                };
                if value.is_empty() {
                    continue;
                }

                if spec
                    .exclusion
                    .as_ref()
                    .is_some_and(|filter| filter.is_excluded(raw.text))
                {
                    continue;
                }

                let normalized = spec
                    .normalizer
                    .as_ref()
                    .map(|n| n.normalize(&value))
                    .filter(|n| *n != value);
                let canonical = normalized.as_deref().unwrap_or(&value).to_string();

                if !seen.insert(canonical.clone()) {
                    scan.duplicates += 1;
                    continue;
                }

                let confidence = match spec.validator {
                    Some(validator) if self.options.validate => {
                        if validator.check(&canonical) {
                            VALIDATED_CONFIDENCE
                        } else {
                            scan.validation_failures += 1;
                            FAILED_VALIDATION_CONFIDENCE
                        }
                    }
                    _ => BASE_CONFIDENCE,
                };

                if confidence < self.options.confidence_threshold {
                    continue;
                }

                scan.items
                    .push(build_item(spec, text, raw, value, normalized, confidence));
            }
        }

        Ok(scan)
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("det_{:03}", self.next_id);
        self.next_id += 1;
        id
    }
}

fn build_item(
    spec: &DetectionTypeSpec,
    text: &str,
    raw: RawMatch<'_>,
    value: String,
    normalized: Option<String>,
    confidence: f32,
) -> DetectedItem {
    let tag_source = normalized.as_deref().unwrap_or(&value);
    DetectedItem {
        id: String::new(),
        detection_type: spec.key.clone(),
        display_name: spec.display_name.clone(),
        suggested_tags: suggested_tags(spec, tag_source),
        raw_value: value,
        normalized_value: normalized,
        confidence,
        target_classification: spec.target,
        priority: spec.priority,
        sensitive: spec.sensitive,
        context_snippet: context_snippet(text, raw.span, spec.context_width),
        source_span: raw.span,
        metadata: spec.metadata.clone(),
    }
}
