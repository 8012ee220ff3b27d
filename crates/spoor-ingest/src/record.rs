//! Provenance and the external record handed to the ingest sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spoor_core::{DetectedItem, IdentifierType};
use std::collections::HashMap;

use crate::config::ProvenanceSettings;

/// Where and how an identifier was discovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    /// Always `website` for page-derived records.
    pub source_type: String,
    pub captured_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,
}

impl Provenance {
    pub const SOURCE_TYPE: &'static str = "website";

    /// Build from the current toggles.
    pub fn build(
        settings: &ProvenanceSettings,
        item: &DetectedItem,
        source_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            source_type: Self::SOURCE_TYPE.to_string(),
            captured_by: settings.captured_by.clone(),
            source_url: source_url
                .filter(|_| settings.include_source_url)
                .map(str::to_string),
            source_date: settings.include_timestamp.then_some(now),
            context: (settings.include_context && !item.context_snippet.is_empty())
                .then(|| item.context_snippet.clone()),
            browser_version: settings
                .browser_version
                .clone()
                .filter(|_| settings.include_browser_version),
        }
    }
}

/// Record delivered to the intelligence platform for one ingested identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanRecord {
    pub identifier_type: IdentifierType,
    /// Normalized value if present, raw value otherwise.
    pub identifier_value: String,
    pub source: Provenance,
    pub notes: String,
    pub tags: Vec<String>,
    pub confidence_score: f32,
    pub metadata: HashMap<String, serde_json::Value>,
    pub discovered_date: DateTime<Utc>,
}

impl OrphanRecord {
    pub fn from_item(item: &DetectedItem, source: Provenance, now: DateTime<Utc>) -> Self {
        let mut metadata = item.metadata.clone();
        metadata.insert("detectionId".to_string(), item.id.clone().into());
        metadata.insert("detectionType".to_string(), item.detection_type.clone().into());
        if item.normalized_value.is_some() {
            metadata.insert("rawValue".to_string(), item.raw_value.clone().into());
        }
        if item.sensitive {
            metadata.insert("sensitive".to_string(), true.into());
        }

        Self {
            identifier_type: item.target_classification,
            identifier_value: item.value().to_string(),
            source,
            notes: format!(
                "Detected {} with {}% confidence",
                item.display_name,
                (item.confidence * 100.0).round() as u32
            ),
            tags: item.suggested_tags.clone(),
            confidence_score: item.confidence,
            metadata,
            discovered_date: now,
        }
    }
}
