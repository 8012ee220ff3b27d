//! Pending review queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spoor_core::DetectedItem;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    #[default]
    Pending,
}

/// A detected item awaiting a routing decision from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedItem {
    #[serde(flatten)]
    pub item: DetectedItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub status: QueueStatus,
}

impl QueuedItem {
    pub fn new(item: DetectedItem, source_url: Option<&str>) -> Self {
        Self {
            item,
            source_url: source_url.map(str::to_string),
            queued_at: Utc::now(),
            status: QueueStatus::Pending,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }
}

/// Insertion-ordered queue keyed by detection id.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    items: Vec<QueuedItem>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, queued: QueuedItem) {
        self.items.push(queued);
    }

    pub fn get(&self, id: &str) -> Option<&QueuedItem> {
        self.items.iter().find(|q| q.id() == id)
    }

    /// Remove and return the entry with `id`.
    pub fn take(&mut self, id: &str) -> Option<QueuedItem> {
        let index = self.items.iter().position(|q| q.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Drop every entry whose id is listed. Returns how many were dropped.
    pub fn remove(&mut self, ids: &[String]) -> usize {
        let before = self.items.len();
        self.items.retain(|q| !ids.iter().any(|id| id == q.id()));
        before - self.items.len()
    }

    /// Drop everything. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|q| q.id().to_string()).collect()
    }

    /// Items in queue order.
    pub fn items(&self) -> &[QueuedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
