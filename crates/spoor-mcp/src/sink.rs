//! JSON Lines sink for ingested records.

use async_trait::async_trait;
use spoor_ingest::{EventHandler, HandlerResult, OrphanRecord};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Appends each ingested record as one JSON line.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub const FILE_NAME: &'static str = "orphans.jsonl";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink writing to `orphans.jsonl` inside `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventHandler<OrphanRecord> for JsonlSink {
    async fn handle(&self, record: &OrphanRecord) -> HandlerResult {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(path = %self.path.display(), value = %record.identifier_value, "Record appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoor_ingest::{IngestionConfig, IngestionMode, IngestionRouter};

    #[tokio::test]
    async fn test_ingested_records_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::in_dir(dir.path());
        let path = sink.path().to_path_buf();

        let mut router = IngestionRouter::new(IngestionConfig {
            mode: IngestionMode::Automatic,
            ..Default::default()
        })
        .unwrap();
        router.on_ingest(sink);

        let result = router
            .process_page(
                "Contact me at jane@example.com or call (415) 555-2671",
                Some("https://example.com/about"),
            )
            .await;
        assert_eq!(result.auto_ingested.len(), 2);

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["identifierValue"], "jane@example.com");
        assert_eq!(lines[1]["identifierValue"], "+14155552671");
        assert_eq!(lines[1]["source"]["sourceUrl"], "https://example.com/about");
    }

    #[tokio::test]
    async fn test_missing_directory_fails_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::in_dir(dir.path().join("missing"));

        let mut router = IngestionRouter::new(IngestionConfig {
            mode: IngestionMode::Automatic,
            ..Default::default()
        })
        .unwrap();
        router.on_ingest(sink);

        let result = router.process_page("mail ops@example.net", None).await;
        assert!(result.auto_ingested.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(router.get_history(10).is_empty());
    }
}
