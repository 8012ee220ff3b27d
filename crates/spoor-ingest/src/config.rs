//! Ingestion configuration.

use serde::{Deserialize, Serialize};
use spoor_core::{CustomPatternDefinition, DetectionOptions, SpoorError, SpoorResult};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// How detected items are routed once they pass the threshold and dedup checks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum IngestionMode {
    /// Ingest everything.
    Automatic,
    /// Queue everything for manual review.
    #[default]
    Selective,
    /// Ingest `auto_ingest_types`, queue the rest.
    TypeFiltered,
    /// Queue everything; the caller confirms each item.
    Confirmation,
    /// Queue everything; the caller ingests in bulk.
    Batch,
}

impl IngestionMode {
    /// All mode names.
    pub fn all_names() -> Vec<&'static str> {
        Self::iter().map(|m| m.into()).collect()
    }

    /// Parse a mode name, rejecting unknown names with a configuration error.
    pub fn parse(mode: &str) -> SpoorResult<Self> {
        Self::from_str(mode.trim()).map_err(|_| SpoorError::invalid_mode(mode, &Self::all_names()))
    }
}

/// Cross-call deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
        }
    }
}

/// Which provenance fields ingested records carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceSettings {
    pub include_source_url: bool,
    pub include_timestamp: bool,
    pub include_context: bool,
    pub include_browser_version: bool,
    pub captured_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,
}

impl Default for ProvenanceSettings {
    fn default() -> Self {
        Self {
            include_source_url: true,
            include_timestamp: true,
            include_context: true,
            include_browser_version: false,
            captured_by: "spoor".to_string(),
            browser_version: None,
        }
    }
}

/// Per-page ingest limits. Disabled by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Ingests allowed per `process_page` call; the rest are queued.
    pub max_items_per_page: usize,
    /// Minimum spacing between consecutive ingests.
    pub min_delay_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_items_per_page: 100,
            min_delay_ms: 0,
        }
    }
}

/// Router configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub mode: IngestionMode,
    /// Detection types to scan. `None` scans every registered type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_types: Option<BTreeSet<String>>,
    /// Types ingested without review in `type_filtered` mode.
    pub auto_ingest_types: BTreeSet<String>,
    pub confidence_threshold: f32,
    pub max_items_per_type: usize,
    /// Run validators. When off every candidate gets the flat base confidence.
    pub run_validators: bool,
    pub deduplication: DedupSettings,
    pub provenance: ProvenanceSettings,
    pub rate_limiting: RateLimitSettings,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            mode: IngestionMode::default(),
            enabled_types: None,
            auto_ingest_types: ["email", "phone_us", "phone_intl"]
                .into_iter()
                .map(String::from)
                .collect(),
            confidence_threshold: 0.5,
            max_items_per_type: 50,
            run_validators: true,
            deduplication: DedupSettings::default(),
            provenance: ProvenanceSettings::default(),
            rate_limiting: RateLimitSettings::default(),
        }
    }
}

impl IngestionConfig {
    /// Reject values the router cannot honor.
    pub fn validate(&self) -> SpoorResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SpoorError::configuration(format!(
                "confidence_threshold must be between 0 and 1, got {}",
                self.confidence_threshold
            )));
        }
        if self.rate_limiting.enabled && self.rate_limiting.max_items_per_page == 0 {
            return Err(SpoorError::configuration(
                "rate_limiting.max_items_per_page must be at least 1",
            ));
        }
        if self.provenance.captured_by.trim().is_empty() {
            return Err(SpoorError::configuration("provenance.captured_by must not be empty"));
        }
        Ok(())
    }

    /// Options handed to the detection engine before each scan.
    pub fn detection_options(&self) -> DetectionOptions {
        DetectionOptions {
            enabled_types: self.enabled_types.clone(),
            confidence_threshold: self.confidence_threshold,
            max_items_per_type: self.max_items_per_type,
            validate: self.run_validators,
        }
    }

    /// Merge a partial update. Nothing changes unless the merged result validates.
    pub fn apply_patch(&mut self, patch: ConfigPatch) -> SpoorResult<()> {
        let mut next = self.clone();

        if let Some(mode) = patch.mode {
            next.mode = IngestionMode::parse(&mode)?;
        }
        if let Some(types) = patch.enabled_types {
            next.enabled_types = Some(types.into_iter().collect());
        }
        if let Some(types) = patch.auto_ingest_types {
            next.auto_ingest_types = types.into_iter().collect();
        }
        if let Some(threshold) = patch.confidence_threshold {
            next.confidence_threshold = threshold;
        }
        if let Some(max) = patch.max_items_per_type {
            next.max_items_per_type = max;
        }
        if let Some(run) = patch.run_validators {
            next.run_validators = run;
        }
        if let Some(dedup) = patch.deduplication {
            if let Some(enabled) = dedup.enabled {
                next.deduplication.enabled = enabled;
            }
            if let Some(ttl) = dedup.ttl_seconds {
                next.deduplication.ttl_seconds = ttl;
            }
        }
        if let Some(limits) = patch.rate_limiting {
            if let Some(enabled) = limits.enabled {
                next.rate_limiting.enabled = enabled;
            }
            if let Some(max) = limits.max_items_per_page {
                next.rate_limiting.max_items_per_page = max;
            }
            if let Some(delay) = limits.min_delay_ms {
                next.rate_limiting.min_delay_ms = delay;
            }
        }
        if let Some(provenance) = patch.provenance {
            let target = &mut next.provenance;
            if let Some(v) = provenance.include_source_url {
                target.include_source_url = v;
            }
            if let Some(v) = provenance.include_timestamp {
                target.include_timestamp = v;
            }
            if let Some(v) = provenance.include_context {
                target.include_context = v;
            }
            if let Some(v) = provenance.include_browser_version {
                target.include_browser_version = v;
            }
            if let Some(v) = provenance.captured_by {
                target.captured_by = v;
            }
            if let Some(v) = provenance.browser_version {
                target.browser_version = Some(v);
            }
        }

        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Partial configuration update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub mode: Option<String>,
    pub enabled_types: Option<Vec<String>>,
    pub auto_ingest_types: Option<Vec<String>>,
    pub confidence_threshold: Option<f32>,
    pub max_items_per_type: Option<usize>,
    pub run_validators: Option<bool>,
    pub deduplication: Option<DedupPatch>,
    pub rate_limiting: Option<RateLimitPatch>,
    pub provenance: Option<ProvenancePatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupPatch {
    pub enabled: Option<bool>,
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitPatch {
    pub enabled: Option<bool>,
    pub max_items_per_page: Option<usize>,
    pub min_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenancePatch {
    pub include_source_url: Option<bool>,
    pub include_timestamp: Option<bool>,
    pub include_context: Option<bool>,
    pub include_browser_version: Option<bool>,
    pub captured_by: Option<String>,
    pub browser_version: Option<String>,
}

/// Current configuration plus the values callers may choose from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub config: IngestionConfig,
    pub available_modes: Vec<String>,
    pub available_types: Vec<String>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoorConfig {
    pub ingestion: IngestionConfig,
    /// Registered on top of the built-in table at startup.
    pub custom_patterns: Vec<CustomPatternDefinition>,
}

impl SpoorConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> SpoorResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| SpoorError::configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| SpoorError::configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| SpoorError::configuration(e.to_string()))?,
            _ => {
                return Err(SpoorError::unsupported_format(
                    "Unsupported config file format. Use .toml, .json, or .yaml",
                ))
            }
        };

        config.ingestion.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `SPOOR_INGESTION_MODE`
    /// - `SPOOR_CONFIDENCE_THRESHOLD`
    /// - `SPOOR_DEDUP_TTL_SECS`
    /// - `SPOOR_MAX_ITEMS_PER_TYPE`
    /// - `SPOOR_CAPTURED_BY`
    pub fn from_env() -> SpoorResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> SpoorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let ingestion = &mut config.ingestion;

        if let Some(mode) = lookup("SPOOR_INGESTION_MODE") {
            ingestion.mode = IngestionMode::parse(&mode)?;
        }
        if let Some(threshold) = lookup("SPOOR_CONFIDENCE_THRESHOLD") {
            ingestion.confidence_threshold = parse_var("SPOOR_CONFIDENCE_THRESHOLD", &threshold)?;
        }
        if let Some(ttl) = lookup("SPOOR_DEDUP_TTL_SECS") {
            ingestion.deduplication.ttl_seconds = parse_var("SPOOR_DEDUP_TTL_SECS", &ttl)?;
        }
        if let Some(max) = lookup("SPOOR_MAX_ITEMS_PER_TYPE") {
            ingestion.max_items_per_type = parse_var("SPOOR_MAX_ITEMS_PER_TYPE", &max)?;
        }
        if let Some(captured_by) = lookup("SPOOR_CAPTURED_BY") {
            ingestion.provenance.captured_by = captured_by;
        }

        config.ingestion.validate()?;
        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> SpoorResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SpoorError::configuration(format!("{} has an invalid value '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoor_core::ErrorCode;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = IngestionConfig::default();
        assert_eq!(config.mode, IngestionMode::Selective);
        assert!(config.enabled_types.is_none());
        assert!(config.auto_ingest_types.contains("phone_intl"));
        assert_eq!(config.deduplication.ttl_seconds, 3600);
        assert_eq!(config.provenance.captured_by, "spoor");
        assert!(!config.rate_limiting.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(IngestionMode::parse("type_filtered").unwrap(), IngestionMode::TypeFiltered);
        assert_eq!(IngestionMode::parse("AUTOMATIC").unwrap(), IngestionMode::Automatic);
        let err = IngestionMode::parse("turbo").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CfgInvalidMode);
        assert_eq!(IngestionMode::all_names().len(), 5);
    }

    #[test]
    fn test_patch_merges_fields() {
        let mut config = IngestionConfig::default();
        config
            .apply_patch(ConfigPatch {
                mode: Some("automatic".to_string()),
                confidence_threshold: Some(0.7),
                run_validators: Some(false),
                rate_limiting: Some(RateLimitPatch {
                    enabled: Some(true),
                    max_items_per_page: Some(5),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.mode, IngestionMode::Automatic);
        assert_eq!(config.confidence_threshold, 0.7);
        assert!(config.rate_limiting.enabled);
        assert_eq!(config.rate_limiting.max_items_per_page, 5);
        assert_eq!(config.deduplication, DedupSettings::default());
        assert!(!config.detection_options().validate);
    }

    #[test]
    fn test_invalid_patch_leaves_config_untouched() {
        let mut config = IngestionConfig::default();
        let err = config
            .apply_patch(ConfigPatch {
                mode: Some("automatic".to_string()),
                confidence_threshold: Some(1.5),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(config, IngestionConfig::default());
    }

    #[test]
    fn test_patch_deserializes_from_client_shape() {
        let patch: ConfigPatch = serde_json::from_str(
            r#"{"mode": "type_filtered", "auto_ingest_types": ["email"],
                "provenance": {"include_source_url": false}}"#,
        )
        .unwrap();
        let mut config = IngestionConfig::default();
        config.apply_patch(patch).unwrap();
        assert_eq!(config.mode, IngestionMode::TypeFiltered);
        assert_eq!(config.auto_ingest_types.len(), 1);
        assert!(!config.provenance.include_source_url);
        assert!(config.provenance.include_timestamp);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("SPOOR_INGESTION_MODE", "batch"),
            ("SPOOR_CONFIDENCE_THRESHOLD", "0.8"),
            ("SPOOR_DEDUP_TTL_SECS", "60"),
            ("SPOOR_CAPTURED_BY", "analyst-7"),
        ]
        .into_iter()
        .collect();
        let config = SpoorConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.ingestion.mode, IngestionMode::Batch);
        assert_eq!(config.ingestion.confidence_threshold, 0.8);
        assert_eq!(config.ingestion.deduplication.ttl_seconds, 60);
        assert_eq!(config.ingestion.provenance.captured_by, "analyst-7");
        assert_eq!(config.ingestion.max_items_per_type, 50);
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = SpoorConfig::from_lookup(|k| {
            (k == "SPOOR_MAX_ITEMS_PER_TYPE").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("SPOOR_MAX_ITEMS_PER_TYPE"));
    }

    #[test]
    fn test_from_file_formats() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("spoor.toml");
        std::fs::write(
            &toml_path,
            r#"
[ingestion]
mode = "type_filtered"
auto_ingest_types = ["email"]

[ingestion.deduplication]
ttl_seconds = 120

[[custom_patterns]]
key = "case_id"
patterns = ['CASE-\d{5}']
name = "Case ID"
"#,
        )
        .unwrap();
        let config = SpoorConfig::from_file(&toml_path).unwrap();
        assert_eq!(config.ingestion.mode, IngestionMode::TypeFiltered);
        assert_eq!(config.ingestion.deduplication.ttl_seconds, 120);
        assert!(config.ingestion.deduplication.enabled);
        assert_eq!(config.custom_patterns.len(), 1);
        assert_eq!(config.custom_patterns[0].priority, 99);

        let yaml_path = dir.path().join("spoor.yaml");
        std::fs::write(&yaml_path, "ingestion:\n  mode: automatic\n").unwrap();
        assert_eq!(
            SpoorConfig::from_file(&yaml_path).unwrap().ingestion.mode,
            IngestionMode::Automatic
        );

        let json_path = dir.path().join("spoor.json");
        std::fs::write(&json_path, r#"{"ingestion": {"confidence_threshold": 0.9}}"#).unwrap();
        assert_eq!(
            SpoorConfig::from_file(&json_path).unwrap().ingestion.confidence_threshold,
            0.9
        );

        let ini_path = dir.path().join("spoor.ini");
        std::fs::write(&ini_path, "mode=automatic").unwrap();
        assert_eq!(
            SpoorConfig::from_file(&ini_path).unwrap_err().code(),
            ErrorCode::CfgUnsupportedFormat
        );
    }
}
