//! Routing policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};

use crate::config::IngestionMode;

/// Where an item goes once it has passed the threshold and dedup checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Ingest,
    Queue,
}

/// Why an item was not routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    BelowThreshold,
    Duplicate,
}

/// Pure routing decision for a mode and detection type.
pub fn route(mode: IngestionMode, detection_type: &str, auto_ingest_types: &BTreeSet<String>) -> Route {
    match mode {
        IngestionMode::Automatic => Route::Ingest,
        IngestionMode::TypeFiltered if auto_ingest_types.contains(detection_type) => Route::Ingest,
        IngestionMode::TypeFiltered
        | IngestionMode::Selective
        | IngestionMode::Confirmation
        | IngestionMode::Batch => Route::Queue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto(types: &[&str]) -> BTreeSet<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_automatic_ingests_everything() {
        assert_eq!(route(IngestionMode::Automatic, "url", &auto(&[])), Route::Ingest);
    }

    #[test]
    fn test_type_filtered() {
        let types = auto(&["email"]);
        assert_eq!(route(IngestionMode::TypeFiltered, "email", &types), Route::Ingest);
        assert_eq!(route(IngestionMode::TypeFiltered, "phone_us", &types), Route::Queue);
    }

    #[test]
    fn test_review_modes_queue() {
        let types = auto(&["email"]);
        for mode in [IngestionMode::Selective, IngestionMode::Confirmation, IngestionMode::Batch] {
            assert_eq!(route(mode, "email", &types), Route::Queue);
        }
    }
}
