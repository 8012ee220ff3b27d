//! Event handlers.
//!
//! Each event has a single slot; registering a handler replaces the previous
//! one. The router awaits every handler before moving on.

use async_trait::async_trait;
use spoor_core::DetectionResult;
use std::sync::Arc;

use crate::queue::QueuedItem;
use crate::record::OrphanRecord;
use crate::router::ProcessError;

/// Result returned by event handlers.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Receives one kind of router event.
#[async_trait]
pub trait EventHandler<T: ?Sized + Sync>: Send + Sync {
    async fn handle(&self, event: &T) -> HandlerResult;
}

#[async_trait]
impl<T, F> EventHandler<T> for F
where
    T: ?Sized + Sync,
    F: Fn(&T) -> HandlerResult + Send + Sync,
{
    async fn handle(&self, event: &T) -> HandlerResult {
        self(event)
    }
}

/// The router's handler slots.
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub(crate) detection: Option<Arc<dyn EventHandler<DetectionResult>>>,
    pub(crate) ingest: Option<Arc<dyn EventHandler<OrphanRecord>>>,
    pub(crate) error: Option<Arc<dyn EventHandler<ProcessError>>>,
    pub(crate) queue_update: Option<Arc<dyn EventHandler<[QueuedItem]>>>,
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("detection", &self.detection.is_some())
            .field("ingest", &self.ingest.is_some())
            .field("error", &self.error.is_some())
            .field("queue_update", &self.queue_update.is_some())
            .finish()
    }
}
