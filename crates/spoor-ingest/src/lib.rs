//! spoor-ingest - Ingestion routing for spoor.
//!
//! Wraps the detection engine from `spoor-core` with a routing policy: each
//! detected identifier is ingested, queued for review, or skipped, with a
//! time-bounded dedup cache in front and a bounded history behind.
//!
//! # Example
//!
//! ```ignore
//! use spoor_ingest::{IngestionConfig, IngestionRouter};
//!
//! let mut router = IngestionRouter::new(IngestionConfig::default())?;
//! router.set_mode("type_filtered")?;
//! let result = router
//!     .process_page("Contact me at jane@example.com", Some("https://example.com"))
//!     .await;
//! ```

pub mod config;
pub mod dedup;
pub mod export;
pub mod handlers;
pub mod history;
pub mod queue;
pub mod record;
pub mod router;
pub mod routing;
pub mod stats;

// Re-export commonly used types
pub use config::{
    ConfigPatch, ConfigView, DedupPatch, DedupSettings, IngestionConfig, IngestionMode,
    ProvenancePatch, ProvenanceSettings, RateLimitPatch, RateLimitSettings, SpoorConfig,
};
pub use dedup::DedupCache;
pub use export::{ExportDocument, ExportItem};
pub use handlers::{EventHandler, HandlerResult};
pub use history::{HistoryAction, HistoryEntry, DEFAULT_HISTORY_PAGE};
pub use queue::{QueueStatus, QueuedItem};
pub use record::{OrphanRecord, Provenance};
pub use router::{IngestSelectedResult, IngestionRouter, ItemOutcome, ProcessError, ProcessResult, SkippedItem};
pub use routing::{route, Route, SkipReason};
pub use stats::{IngestionStats, StatsSnapshot, TypeCounts};
