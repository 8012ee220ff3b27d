//! Ingestion router.
//!
//! Wraps a detection engine and decides, per detected item, whether it is
//! ingested, queued for review, or skipped. All state lives in the router and
//! is not internally synchronized; callers that share a router across tasks
//! wrap it in a lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spoor_core::{
    CustomPatternDefinition, DetectedItem, DetectionEngine, DetectionOptions, DetectionRegistry,
    DetectionResult, DetectionStats, DetectionTypeInfo, DetectionTypeSpec, SpoorError, SpoorResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ConfigPatch, ConfigView, IngestionConfig, IngestionMode, SpoorConfig};
use crate::dedup::DedupCache;
use crate::export::{ExportDocument, ExportItem};
use crate::handlers::{EventHandler, EventHandlers};
use crate::history::{HistoryAction, HistoryEntry, HistoryLog};
use crate::queue::{PendingQueue, QueuedItem};
use crate::record::{OrphanRecord, Provenance};
use crate::routing::{route, Route, SkipReason};
use crate::stats::{IngestionStats, StatsSnapshot};

/// A per-item (or detection-level, when `item_id` is absent) failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub error: String,
}

impl ProcessError {
    pub fn for_item(item_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            error: error.into(),
        }
    }

    pub fn detection(error: impl Into<String>) -> Self {
        Self {
            item_id: None,
            error: error.into(),
        }
    }
}

/// An item the router declined to route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedItem {
    pub item_id: String,
    #[serde(rename = "type")]
    pub detection_type: String,
    pub value: String,
    pub reason: SkipReason,
}

impl SkippedItem {
    fn new(item: &DetectedItem, reason: SkipReason) -> Self {
        Self {
            item_id: item.id.clone(),
            detection_type: item.detection_type.clone(),
            value: item.value().to_string(),
            reason,
        }
    }
}

/// Outcome of processing one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    pub success: bool,
    pub url: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub detected: Vec<DetectedItem>,
    pub auto_ingested: Vec<DetectedItem>,
    pub queued: Vec<DetectedItem>,
    pub skipped: Vec<SkippedItem>,
    pub errors: Vec<ProcessError>,
    pub warnings: Vec<String>,
}

impl ProcessResult {
    fn empty(success: bool, url: Option<&str>) -> Self {
        Self {
            success,
            url: url.map(str::to_string),
            processed_at: Utc::now(),
            detected: Vec::new(),
            auto_ingested: Vec::new(),
            queued: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Outcome of routing a single item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Ingested(OrphanRecord),
    Queued,
    /// Routed to ingest but queued because the per-page limit was reached.
    Deferred,
    Skipped(SkipReason),
}

/// Outcome of ingesting queued items by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSelectedResult {
    pub ingested: Vec<String>,
    pub not_found: Vec<String>,
    pub failed: Vec<ProcessError>,
}

/// Routes detected items to the ingest sink or the review queue.
#[derive(Debug)]
pub struct IngestionRouter {
    engine: DetectionEngine,
    config: IngestionConfig,
    dedup: DedupCache,
    queue: PendingQueue,
    history: HistoryLog,
    stats: IngestionStats,
    handlers: EventHandlers,
    last_ingest: Option<Instant>,
    page_ingests: usize,
}

impl Default for IngestionRouter {
    fn default() -> Self {
        Self::build(DetectionEngine::default(), IngestionConfig::default())
    }
}

impl IngestionRouter {
    /// Create a router over the built-in detection table.
    pub fn new(config: IngestionConfig) -> SpoorResult<Self> {
        Self::with_engine(DetectionEngine::default(), config)
    }

    /// Create a router around an existing engine.
    ///
    /// An engine built with validation off keeps it off; the remaining
    /// detection options come from `config`.
    pub fn with_engine(engine: DetectionEngine, mut config: IngestionConfig) -> SpoorResult<Self> {
        config.validate()?;
        config.run_validators &= engine.options().validate;
        Ok(Self::build(engine, config))
    }

    /// Create a router from a loaded configuration file, registering its
    /// custom patterns on top of the built-in table.
    pub fn from_config(config: &SpoorConfig) -> SpoorResult<Self> {
        let mut registry = DetectionRegistry::with_builtins();
        for definition in &config.custom_patterns {
            registry.add_custom(definition.clone())?;
        }
        Self::with_engine(DetectionEngine::new(registry), config.ingestion.clone())
    }

    fn build(engine: DetectionEngine, config: IngestionConfig) -> Self {
        Self {
            engine,
            config,
            dedup: DedupCache::new(),
            queue: PendingQueue::new(),
            history: HistoryLog::new(),
            stats: IngestionStats::default(),
            handlers: EventHandlers::default(),
            last_ingest: None,
            page_ingests: 0,
        }
    }

    // ---------------------------------------------------------------------
    // Event handlers
    // ---------------------------------------------------------------------

    pub fn on_detection(&mut self, handler: impl EventHandler<DetectionResult> + 'static) {
        self.handlers.detection = Some(Arc::new(handler));
    }

    /// A failing ingest handler fails the ingestion of that item.
    pub fn on_ingest(&mut self, handler: impl EventHandler<OrphanRecord> + 'static) {
        self.handlers.ingest = Some(Arc::new(handler));
    }

    pub fn on_error(&mut self, handler: impl EventHandler<ProcessError> + 'static) {
        self.handlers.error = Some(Arc::new(handler));
    }

    pub fn on_queue_update(&mut self, handler: impl EventHandler<[QueuedItem]> + 'static) {
        self.handlers.queue_update = Some(Arc::new(handler));
    }

    // ---------------------------------------------------------------------
    // Detection and routing
    // ---------------------------------------------------------------------

    /// Detect without routing.
    pub fn detect(&mut self, markup: &str, source_url: Option<&str>) -> DetectionResult {
        let options = self.config.detection_options();
        self.detect_with_options(markup, source_url, options)
    }

    /// Detect without routing, using `options` for this call only.
    pub fn detect_with_options(
        &mut self,
        markup: &str,
        source_url: Option<&str>,
        options: DetectionOptions,
    ) -> DetectionResult {
        self.engine.set_options(options);
        self.engine.detect_all(markup, source_url)
    }

    /// Detect identifiers on a page and route each one.
    pub async fn process_page(&mut self, markup: &str, source_url: Option<&str>) -> ProcessResult {
        let detection = self.detect(markup, source_url);

        if !detection.success {
            let mut result = ProcessResult::empty(false, source_url);
            result.errors = detection.errors.into_iter().map(ProcessError::detection).collect();
            return result;
        }

        notify(self.handlers.detection.clone(), &detection, "detection").await;

        self.page_ingests = 0;
        self.stats.record_detected(&detection.items);

        let mut result = ProcessResult::empty(true, source_url);
        result.errors = detection
            .errors
            .iter()
            .map(|e| ProcessError::detection(e.as_str()))
            .collect();
        result.warnings = detection.warnings.clone();

        for item in &detection.items {
            match self.process_item(item, source_url).await {
                Ok(ItemOutcome::Ingested(_)) => result.auto_ingested.push(item.clone()),
                Ok(ItemOutcome::Queued) => result.queued.push(item.clone()),
                Ok(ItemOutcome::Deferred) => {
                    result.warnings.push(format!(
                        "Per-page ingest limit of {} reached, queued {}",
                        self.config.rate_limiting.max_items_per_page, item.id
                    ));
                    result.queued.push(item.clone());
                }
                Ok(ItemOutcome::Skipped(reason)) => {
                    result.skipped.push(SkippedItem::new(item, reason))
                }
                Err(e) => {
                    warn!(id = %item.id, error = %e, "Failed to process item");
                    let error = ProcessError::for_item(&item.id, e.to_string());
                    notify(self.handlers.error.clone(), &error, "error").await;
                    result.errors.push(error);
                }
            }
        }

        info!(
            url = source_url.unwrap_or_default(),
            detected = detection.items.len(),
            ingested = result.auto_ingested.len(),
            queued = result.queued.len(),
            skipped = result.skipped.len(),
            "Processed page"
        );

        result.detected = detection.items;
        result
    }

    /// Route one detected item: threshold, then dedup cache, then mode.
    pub async fn process_item(
        &mut self,
        item: &DetectedItem,
        source_url: Option<&str>,
    ) -> SpoorResult<ItemOutcome> {
        if item.confidence < self.config.confidence_threshold {
            self.stats.record_skipped(&item.detection_type, false);
            return Ok(ItemOutcome::Skipped(SkipReason::BelowThreshold));
        }

        let key = DedupCache::key(&item.detection_type, item.value());
        if self.config.deduplication.enabled && self.dedup.contains(&key) {
            self.stats.record_skipped(&item.detection_type, true);
            return Ok(ItemOutcome::Skipped(SkipReason::Duplicate));
        }

        match route(self.config.mode, &item.detection_type, &self.config.auto_ingest_types) {
            Route::Queue => {
                self.queue_item(item, source_url).await;
                Ok(ItemOutcome::Queued)
            }
            Route::Ingest if self.page_quota_reached() => {
                self.queue_item(item, source_url).await;
                Ok(ItemOutcome::Deferred)
            }
            Route::Ingest => {
                let record = self.ingest_item(item, source_url).await?;
                Ok(ItemOutcome::Ingested(record))
            }
        }
    }

    /// Build the record for `item` and hand it to the ingest handler.
    ///
    /// Dedup cache, history and counters are only updated once the handler
    /// has accepted the record.
    pub async fn ingest_item(
        &mut self,
        item: &DetectedItem,
        source_url: Option<&str>,
    ) -> SpoorResult<OrphanRecord> {
        self.pace().await;

        let now = Utc::now();
        let provenance = Provenance::build(&self.config.provenance, item, source_url, now);
        let record = OrphanRecord::from_item(item, provenance, now);

        if let Some(handler) = self.handlers.ingest.clone() {
            handler.handle(&record).await.map_err(SpoorError::from)?;
        }

        let ttl = Duration::from_secs(self.config.deduplication.ttl_seconds);
        self.dedup
            .insert(DedupCache::key(&item.detection_type, item.value()), ttl);
        self.history.push(HistoryEntry {
            id: item.id.clone(),
            detection_type: item.detection_type.clone(),
            value: item.value().to_string(),
            source_url: source_url.map(str::to_string),
            action: HistoryAction::Ingested,
            timestamp: now,
        });
        self.stats.record_ingested(&item.detection_type);
        self.last_ingest = Some(Instant::now());
        self.page_ingests += 1;

        debug!(id = %item.id, detection_type = %item.detection_type, "Ingested item");
        Ok(record)
    }

    /// Append `item` to the review queue.
    pub async fn queue_item(&mut self, item: &DetectedItem, source_url: Option<&str>) {
        self.queue.push(QueuedItem::new(item.clone(), source_url));
        self.stats.record_queued(&item.detection_type);
        self.notify_queue_update().await;
    }

    fn page_quota_reached(&self) -> bool {
        let limits = &self.config.rate_limiting;
        limits.enabled && self.page_ingests >= limits.max_items_per_page
    }

    async fn pace(&self) {
        let limits = &self.config.rate_limiting;
        if !limits.enabled || limits.min_delay_ms == 0 {
            return;
        }
        if let Some(last) = self.last_ingest {
            let ready_at = last + Duration::from_millis(limits.min_delay_ms);
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }

    async fn notify_queue_update(&self) {
        notify(self.handlers.queue_update.clone(), self.queue.items(), "queue_update").await;
    }

    // ---------------------------------------------------------------------
    // Queue
    // ---------------------------------------------------------------------

    /// Ingest queued items by id. Failed items stay queued.
    pub async fn ingest_selected(&mut self, ids: &[String]) -> IngestSelectedResult {
        let mut result = IngestSelectedResult::default();

        for id in ids {
            let Some(queued) = self.queue.get(id).cloned() else {
                result.not_found.push(id.clone());
                continue;
            };

            match self
                .ingest_item(&queued.item, queued.source_url.as_deref())
                .await
            {
                Ok(_) => {
                    self.queue.take(id);
                    result.ingested.push(id.clone());
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to ingest queued item");
                    let error = ProcessError::for_item(id, e.to_string());
                    notify(self.handlers.error.clone(), &error, "error").await;
                    result.failed.push(error);
                }
            }
        }

        if !result.ingested.is_empty() {
            self.notify_queue_update().await;
        }
        result
    }

    /// Ingest every queued item.
    pub async fn ingest_all(&mut self) -> IngestSelectedResult {
        let ids = self.queue.ids();
        self.ingest_selected(&ids).await
    }

    /// Discard queued items by id, counting them as skipped.
    pub async fn remove_from_queue(&mut self, ids: &[String]) -> usize {
        let removed = self.queue.remove(ids);
        if removed > 0 {
            self.stats.record_discarded(removed);
            self.notify_queue_update().await;
        }
        removed
    }

    /// Discard the whole queue, counting the entries as skipped.
    pub async fn clear_queue(&mut self) -> usize {
        let removed = self.queue.clear();
        if removed > 0 {
            self.stats.record_discarded(removed);
            self.notify_queue_update().await;
        }
        removed
    }

    /// Snapshot of the queue.
    pub fn get_queue(&self) -> Vec<QueuedItem> {
        self.queue.items().to_vec()
    }

    /// The newest `limit` history entries.
    pub fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history.recent(limit)
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Replace the whole configuration.
    pub fn configure(&mut self, config: IngestionConfig) -> SpoorResult<()> {
        config.validate()?;
        info!(mode = %config.mode, "Ingestion configuration replaced");
        self.config = config;
        Ok(())
    }

    /// Merge a partial configuration update.
    pub fn apply_patch(&mut self, patch: ConfigPatch) -> SpoorResult<()> {
        self.config.apply_patch(patch)?;
        info!(mode = %self.config.mode, "Ingestion configuration updated");
        Ok(())
    }

    /// Switch routing mode. Affects subsequent calls only.
    pub fn set_mode(&mut self, mode: &str) -> SpoorResult<IngestionMode> {
        let mode = IngestionMode::parse(mode)?;
        self.config.mode = mode;
        info!(mode = %mode, "Ingestion mode changed");
        Ok(mode)
    }

    pub fn get_config(&self) -> ConfigView {
        ConfigView {
            config: self.config.clone(),
            available_modes: IngestionMode::all_names()
                .into_iter()
                .map(String::from)
                .collect(),
            available_types: self.engine.registry().keys(),
        }
    }

    // ---------------------------------------------------------------------
    // Detection types
    // ---------------------------------------------------------------------

    pub fn add_pattern(&mut self, definition: CustomPatternDefinition) -> SpoorResult<()> {
        self.engine.add_custom_pattern(definition)
    }

    pub fn add_detection_type(&mut self, spec: DetectionTypeSpec) -> SpoorResult<()> {
        self.engine.add_pattern(spec)
    }

    pub fn remove_pattern(&mut self, key: &str) -> bool {
        self.engine.remove_pattern(key)
    }

    pub fn detection_types(&self) -> Vec<DetectionTypeInfo> {
        self.engine.detection_types()
    }

    // ---------------------------------------------------------------------
    // Statistics and export
    // ---------------------------------------------------------------------

    pub fn get_stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            stats: self.stats.clone(),
            detection: self.engine.stats().clone(),
            queue_length: self.queue.len(),
            history_length: self.history.len(),
        }
    }

    pub fn detection_stats(&self) -> &DetectionStats {
        self.engine.stats()
    }

    /// Zero ingestion and detection counters. Queue, history and dedup cache are kept.
    pub fn reset_stats(&mut self) {
        self.stats = IngestionStats::default();
        self.engine.reset_stats();
    }

    /// Export the given items, or the current queue when `items` is `None`.
    pub fn export_document(&self, items: Option<&[DetectedItem]>) -> ExportDocument {
        let exported = match items {
            Some(items) => items
                .iter()
                .map(|item| ExportItem::from_detected(item, None))
                .collect(),
            None => self.queue.items().iter().map(ExportItem::from).collect(),
        };
        ExportDocument::new(self.config.provenance.captured_by.clone(), exported)
    }

    pub fn export_to_json(&self, items: Option<&[DetectedItem]>) -> SpoorResult<String> {
        Ok(self.export_document(items).to_json()?)
    }
}

async fn notify<T>(handler: Option<Arc<dyn EventHandler<T>>>, event: &T, name: &'static str)
where
    T: ?Sized + Sync + 'static,
{
    if let Some(handler) = handler {
        if let Err(e) = handler.handle(event).await {
            warn!(event = name, error = %e, "Event handler failed");
        }
    }
}
