//! Canonical export document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spoor_core::{DetectedItem, IdentifierType};
use std::collections::HashMap;

use crate::queue::QueuedItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportItem {
    #[serde(rename = "type")]
    pub detection_type: String,
    pub type_name: String,
    pub value: String,
    pub original_value: String,
    pub confidence: f32,
    pub orphan_type: IdentifierType,
    pub context: String,
    pub source_url: Option<String>,
    pub suggested_tags: Vec<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ExportItem {
    pub fn from_detected(item: &DetectedItem, source_url: Option<&str>) -> Self {
        Self {
            detection_type: item.detection_type.clone(),
            type_name: item.display_name.clone(),
            value: item.value().to_string(),
            original_value: item.raw_value.clone(),
            confidence: item.confidence,
            orphan_type: item.target_classification,
            context: item.context_snippet.clone(),
            source_url: source_url.map(str::to_string),
            suggested_tags: item.suggested_tags.clone(),
            metadata: item.metadata.clone(),
        }
    }
}

impl From<&QueuedItem> for ExportItem {
    fn from(queued: &QueuedItem) -> Self {
        Self::from_detected(&queued.item, queued.source_url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
    pub total_items: usize,
    pub items: Vec<ExportItem>,
}

impl ExportDocument {
    pub fn new(exported_by: impl Into<String>, items: Vec<ExportItem>) -> Self {
        Self {
            exported_at: Utc::now(),
            exported_by: exported_by.into(),
            total_items: items.len(),
            items,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
