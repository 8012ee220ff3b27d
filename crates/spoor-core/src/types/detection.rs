//! Detection output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::IdentifierType;

/// Byte span of a match within the preprocessed page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// One classified occurrence of an identifier in page text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedItem {
    /// `det_NNN`, unique within the engine that produced it.
    pub id: String,
    /// Detection type key (e.g. `email`, `phone_us`).
    #[serde(rename = "type")]
    pub detection_type: String,
    pub display_name: String,
    pub raw_value: String,
    /// Present only when normalization changed the raw value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_value: Option<String>,
    /// Confidence in [0, 1].
    pub confidence: f32,
    pub target_classification: IdentifierType,
    pub priority: u32,
    pub sensitive: bool,
    pub context_snippet: String,
    pub source_span: SourceSpan,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
}

impl DetectedItem {
    /// Normalized value if present, raw value otherwise.
    pub fn value(&self) -> &str {
        self.normalized_value.as_deref().unwrap_or(&self.raw_value)
    }
}

/// Per-type summary of one detection call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub name: String,
    pub count: usize,
}

/// Outcome of scanning one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub items: Vec<DetectedItem>,
    pub total_items: usize,
    pub summary_by_type: BTreeMap<String, TypeSummary>,
    pub processing_time_ms: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl DetectionResult {
    /// A failed result carrying no items.
    pub fn failure(page_url: Option<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            page_url,
            detected_at: Utc::now(),
            items: Vec::new(),
            total_items: 0,
            summary_by_type: BTreeMap::new(),
            processing_time_ms: 0,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }

    /// Items of a single detection type.
    pub fn items_of_type<'a>(&'a self, detection_type: &'a str) -> impl Iterator<Item = &'a DetectedItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.detection_type == detection_type)
    }
}

/// Cumulative counters kept by a detection engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionStats {
    pub total_scans: u64,
    pub total_items: u64,
    pub duplicates_removed: u64,
    pub validation_failures: u64,
    pub by_type: BTreeMap<String, u64>,
}

/// Public description of a registered detection type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionTypeInfo {
    pub key: String,
    pub name: String,
    pub orphan_type: IdentifierType,
    pub priority: u32,
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    pub pattern_count: usize,
}
