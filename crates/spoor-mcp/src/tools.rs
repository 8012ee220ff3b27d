//! MCP tool input/output type definitions.
//!
//! These types derive `schemars::JsonSchema` so MCP clients can discover the
//! tool parameters.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use spoor_core::CustomPatternDefinition;
use std::collections::HashMap;

/// Input for tools that scan page content.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PageInput {
    /// Page markup or plain text.
    pub content: String,

    /// URL of the page the content came from.
    #[serde(default)]
    pub url: Option<String>,
}

/// Input for detect_data_types. Overrides apply to the one call.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DetectInput {
    /// Page markup or plain text.
    pub content: String,

    /// URL of the page the content came from.
    #[serde(default)]
    pub url: Option<String>,

    /// Detection types to scan (e.g. ["email", "imei"]). Defaults to the
    /// configured types.
    #[serde(default)]
    pub types: Option<Vec<String>>,

    /// Minimum confidence in [0, 1]. Defaults to the configured threshold.
    #[serde(default)]
    pub confidence_threshold: Option<f32>,
}

/// Input for export_detections.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExportInput {
    /// Detected items as returned by detect_data_types. The review queue is
    /// exported when omitted.
    #[serde(default)]
    pub items: Option<Vec<serde_json::Value>>,
}

/// Input for tools that act on queued items.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ItemIdsInput {
    /// Detection ids (e.g. "det_001").
    pub ids: Vec<String>,
}

/// Input for get_ingestion_history.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HistoryInput {
    /// Maximum entries to return, newest last.
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    spoor_ingest::DEFAULT_HISTORY_PAGE
}

/// Input for add_detection_pattern.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddPatternInput {
    /// Unique key for the detection type. Replaces an existing type with the same key.
    pub key: String,

    /// Regular expressions; every match becomes a candidate.
    pub patterns: Vec<String>,

    /// Human-readable name. Defaults to the key.
    #[serde(default)]
    pub name: Option<String>,

    /// Classification of ingested records (email, phone, crypto_address,
    /// ip_address, domain, url, username, social_media, mac_address, imei,
    /// credit_card, other).
    #[serde(default)]
    pub orphan_type: Option<String>,

    /// Named validator (email, phone, bitcoin, ethereum, litecoin, dogecoin,
    /// monero, ipv4, ipv6, domain, url, imei, luhn, mac_address, credit_card).
    #[serde(default)]
    pub validator: Option<String>,

    /// Characters of context captured on each side of a match.
    #[serde(default)]
    pub context_chars: Option<usize>,

    /// Ordering priority; lower sorts first.
    #[serde(default)]
    pub priority: Option<u32>,

    /// Extra metadata copied onto every detected item.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Mark values of this type as sensitive.
    #[serde(default)]
    pub sensitive: bool,

    /// Regexes; a match satisfying any of them is discarded.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl From<AddPatternInput> for CustomPatternDefinition {
    fn from(input: AddPatternInput) -> Self {
        let mut definition = CustomPatternDefinition::new(input.key, input.patterns);
        definition.name = input.name;
        if let Some(orphan_type) = input.orphan_type {
            definition.orphan_type = orphan_type;
        }
        definition.validator = input.validator;
        if let Some(context_chars) = input.context_chars {
            definition.context_chars = context_chars;
        }
        if let Some(priority) = input.priority {
            definition.priority = priority;
        }
        definition.metadata = input.metadata;
        definition.sensitive = input.sensitive;
        definition.exclude = input.exclude;
        definition
    }
}

/// Input for remove_detection_pattern.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PatternKeyInput {
    /// Key of the detection type to remove.
    pub key: String,
}

/// Input for set_ingestion_mode.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetModeInput {
    /// One of automatic, selective, type_filtered, confirmation, batch.
    pub mode: String,
}

/// Input for configure_ingestion.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ConfigureInput {
    /// Partial ingestion settings to merge, e.g.
    /// {"mode": "type_filtered", "auto_ingest_types": ["email"],
    /// "deduplication": {"ttl_seconds": 600}}. Nothing is applied if any field is invalid.
    pub settings: serde_json::Value,
}

/// Result of removing queued items.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RemovedResult {
    /// Number of queued items discarded.
    pub removed: usize,
}

/// Result of removing a detection type.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PatternRemovedResult {
    pub key: String,
    pub removed: bool,
}

/// Result of a configuration change.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ModeResult {
    /// The routing mode now in effect.
    pub mode: String,
}
