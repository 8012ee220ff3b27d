//! Ingestion counters.

use serde::{Deserialize, Serialize};
use spoor_core::{DetectedItem, DetectionStats};
use std::collections::BTreeMap;

/// Per-type counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounts {
    pub detected: u64,
    pub ingested: u64,
    pub queued: u64,
    pub skipped: u64,
}

/// Cumulative counters since creation or the last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionStats {
    pub total_detected: u64,
    pub total_ingested: u64,
    pub total_queued: u64,
    /// Items skipped by routing plus items discarded from the queue.
    pub total_skipped: u64,
    pub total_duplicates: u64,
    pub by_type: BTreeMap<String, TypeCounts>,
}

impl IngestionStats {
    pub fn record_detected(&mut self, items: &[DetectedItem]) {
        self.total_detected += items.len() as u64;
        for item in items {
            self.counts(&item.detection_type).detected += 1;
        }
    }

    pub fn record_ingested(&mut self, detection_type: &str) {
        self.total_ingested += 1;
        self.counts(detection_type).ingested += 1;
    }

    pub fn record_queued(&mut self, detection_type: &str) {
        self.total_queued += 1;
        self.counts(detection_type).queued += 1;
    }

    pub fn record_skipped(&mut self, detection_type: &str, duplicate: bool) {
        self.total_skipped += 1;
        if duplicate {
            self.total_duplicates += 1;
        }
        self.counts(detection_type).skipped += 1;
    }

    /// Queue entries discarded without ingestion.
    pub fn record_discarded(&mut self, count: usize) {
        self.total_skipped += count as u64;
    }

    fn counts(&mut self, detection_type: &str) -> &mut TypeCounts {
        self.by_type.entry(detection_type.to_string()).or_default()
    }
}

/// Counters plus current collection sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub stats: IngestionStats,
    /// Engine counters: scans, intra-page duplicates, validation failures.
    pub detection: DetectionStats,
    pub queue_length: usize,
    pub history_length: usize,
}
