//! MCP server implementation for the spoor pipeline.
//!
//! Uses the rmcp SDK's macro-based approach for defining tools.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router,
    ErrorData as McpError, ServerHandler,
};
use serde::Serialize;
use spoor_core::{DetectedItem, SpoorError};
use spoor_ingest::{ConfigPatch, IngestionRouter};
use tokio::sync::Mutex;

use crate::tools::*;

/// MCP server for page detection and ingestion.
///
/// All tools share one router; the mutex serializes calls so each page is
/// processed to completion before the next begins.
#[derive(Clone)]
pub struct SpoorServer {
    router: Arc<Mutex<IngestionRouter>>,
    tool_router: ToolRouter<SpoorServer>,
}

#[tool_router]
impl SpoorServer {
    pub fn new(router: Arc<Mutex<IngestionRouter>>) -> Self {
        Self {
            router,
            tool_router: Self::tool_router(),
        }
    }

    pub fn router(&self) -> &Arc<Mutex<IngestionRouter>> {
        &self.router
    }

    // ---------------------------------------------------------------------
    // Detection
    // ---------------------------------------------------------------------

    #[tool(
        name = "detect_data_types",
        description = "Scan page markup or text for identifiers (emails, phone numbers, crypto addresses, social profiles, IPs, ...) without ingesting or queueing anything. Optional types and confidence_threshold apply to this call only. Detection ids and detection counters still advance."
    )]
    async fn detect_data_types(
        &self,
        Parameters(input): Parameters<DetectInput>,
    ) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;

        let mut options = router.config().detection_options();
        if let Some(types) = input.types {
            options.enabled_types = Some(types.into_iter().collect());
        }
        if let Some(threshold) = input.confidence_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(McpError::invalid_params(
                    format!("confidence_threshold must be between 0 and 1, got {}", threshold),
                    None,
                ));
            }
            options.confidence_threshold = threshold;
        }

        let result = router.detect_with_options(&input.content, input.url.as_deref(), options);
        json_result(&result)
    }

    #[tool(
        name = "get_detection_types",
        description = "List the registered detection types with their classification, priority and validator."
    )]
    async fn get_detection_types(&self) -> Result<CallToolResult, McpError> {
        let router = self.router.lock().await;
        json_result(&router.detection_types())
    }

    #[tool(
        name = "add_detection_pattern",
        description = "Register a custom detection type from one or more regular expressions. Replaces any type with the same key."
    )]
    async fn add_detection_pattern(
        &self,
        Parameters(input): Parameters<AddPatternInput>,
    ) -> Result<CallToolResult, McpError> {
        let key = input.key.clone();
        let mut router = self.router.lock().await;
        router.add_pattern(input.into()).map_err(to_mcp_error)?;

        let info = router
            .detection_types()
            .into_iter()
            .find(|info| info.key == key);
        json_result(&info)
    }

    #[tool(
        name = "remove_detection_pattern",
        description = "Remove a detection type by key, built-in or custom."
    )]
    async fn remove_detection_pattern(
        &self,
        Parameters(input): Parameters<PatternKeyInput>,
    ) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;
        let removed = router.remove_pattern(&input.key);
        json_result(&PatternRemovedResult {
            key: input.key,
            removed,
        })
    }

    // ---------------------------------------------------------------------
    // Ingestion
    // ---------------------------------------------------------------------

    #[tool(
        name = "process_page_for_ingestion",
        description = "Detect identifiers on a page and route each one according to the ingestion mode: ingested, queued for review, or skipped."
    )]
    async fn process_page_for_ingestion(
        &self,
        Parameters(input): Parameters<PageInput>,
    ) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;
        let result = router
            .process_page(&input.content, input.url.as_deref())
            .await;
        json_result(&result)
    }

    #[tool(
        name = "get_ingestion_queue",
        description = "List the items waiting for review, oldest first."
    )]
    async fn get_ingestion_queue(&self) -> Result<CallToolResult, McpError> {
        let router = self.router.lock().await;
        json_result(&router.get_queue())
    }

    #[tool(
        name = "ingest_selected",
        description = "Ingest queued items by detection id. Unknown ids are reported as notFound."
    )]
    async fn ingest_selected(
        &self,
        Parameters(input): Parameters<ItemIdsInput>,
    ) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;
        let result = router.ingest_selected(&input.ids).await;
        json_result(&result)
    }

    #[tool(name = "ingest_all", description = "Ingest every queued item.")]
    async fn ingest_all(&self) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;
        let result = router.ingest_all().await;
        json_result(&result)
    }

    #[tool(
        name = "remove_from_ingestion_queue",
        description = "Discard queued items by detection id without ingesting them."
    )]
    async fn remove_from_ingestion_queue(
        &self,
        Parameters(input): Parameters<ItemIdsInput>,
    ) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;
        let removed = router.remove_from_queue(&input.ids).await;
        json_result(&RemovedResult { removed })
    }

    #[tool(
        name = "clear_ingestion_queue",
        description = "Discard every queued item without ingesting it."
    )]
    async fn clear_ingestion_queue(&self) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;
        let removed = router.clear_queue().await;
        json_result(&RemovedResult { removed })
    }

    #[tool(
        name = "get_ingestion_history",
        description = "Return the most recent ingestions."
    )]
    async fn get_ingestion_history(
        &self,
        Parameters(input): Parameters<HistoryInput>,
    ) -> Result<CallToolResult, McpError> {
        let router = self.router.lock().await;
        json_result(&router.get_history(input.limit))
    }

    // ---------------------------------------------------------------------
    // Statistics and export
    // ---------------------------------------------------------------------

    #[tool(
        name = "get_ingestion_stats",
        description = "Return cumulative detection and ingestion counters with queue and history sizes."
    )]
    async fn get_ingestion_stats(&self) -> Result<CallToolResult, McpError> {
        let router = self.router.lock().await;
        json_result(&router.get_stats())
    }

    #[tool(
        name = "reset_ingestion_stats",
        description = "Zero the counters. The queue, history and duplicate cache are kept."
    )]
    async fn reset_ingestion_stats(&self) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;
        router.reset_stats();
        json_result(&router.get_stats())
    }

    #[tool(
        name = "export_detections",
        description = "Export detected items as a JSON document. Exports the given items, or the review queue when none are given."
    )]
    async fn export_detections(
        &self,
        Parameters(input): Parameters<ExportInput>,
    ) -> Result<CallToolResult, McpError> {
        let items = input
            .items
            .map(|values| {
                values
                    .into_iter()
                    .map(serde_json::from_value::<DetectedItem>)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(|e| McpError::invalid_params(format!("Invalid items: {}", e), None))?;

        let router = self.router.lock().await;
        let json = router
            .export_to_json(items.as_deref())
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    #[tool(
        name = "get_ingestion_config",
        description = "Return the ingestion configuration with the available modes and detection types."
    )]
    async fn get_ingestion_config(&self) -> Result<CallToolResult, McpError> {
        let router = self.router.lock().await;
        json_result(&router.get_config())
    }

    #[tool(
        name = "set_ingestion_mode",
        description = "Switch the routing mode: automatic, selective, type_filtered, confirmation or batch."
    )]
    async fn set_ingestion_mode(
        &self,
        Parameters(input): Parameters<SetModeInput>,
    ) -> Result<CallToolResult, McpError> {
        let mut router = self.router.lock().await;
        let mode = router.set_mode(&input.mode).map_err(to_mcp_error)?;
        json_result(&ModeResult {
            mode: mode.to_string(),
        })
    }

    #[tool(
        name = "configure_ingestion",
        description = "Merge partial ingestion settings into the current configuration. Rejected as a whole if any value is invalid."
    )]
    async fn configure_ingestion(
        &self,
        Parameters(input): Parameters<ConfigureInput>,
    ) -> Result<CallToolResult, McpError> {
        let patch: ConfigPatch = serde_json::from_value(input.settings)
            .map_err(|e| McpError::invalid_params(format!("Invalid settings: {}", e), None))?;

        let mut router = self.router.lock().await;
        router.apply_patch(patch).map_err(to_mcp_error)?;
        json_result(&router.get_config())
    }
}

#[tool_handler]
impl ServerHandler for SpoorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Spoor - identifier detection and ingestion for OSINT browsing. \
                 Use process_page_for_ingestion with a page's markup and URL, review \
                 pending items with get_ingestion_queue, and accept them with \
                 ingest_selected or ingest_all. detect_data_types scans without \
                 routing anything."
                    .to_string(),
            ),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )]))
}

fn to_mcp_error(error: SpoorError) -> McpError {
    if error.is_configuration() {
        McpError::invalid_params(error.to_string(), None)
    } else {
        McpError::internal_error(error.to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoor_ingest::IngestionMode;

    const PAGE: &str = "Contact me at jane@example.com or call (415) 555-2671";

    fn server() -> SpoorServer {
        SpoorServer::new(Arc::new(Mutex::new(IngestionRouter::default())))
    }

    fn page() -> Parameters<PageInput> {
        Parameters(PageInput {
            content: PAGE.to_string(),
            url: Some("https://example.com/about".to_string()),
        })
    }

    #[test]
    fn test_server_info_enables_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("process_page_for_ingestion"));
    }

    fn detect_input(content: &str) -> DetectInput {
        DetectInput {
            content: content.to_string(),
            url: Some("https://example.com/about".to_string()),
            types: None,
            confidence_threshold: None,
        }
    }

    /// Text payload of a tool result, parsed as JSON.
    fn payload(result: &CallToolResult) -> serde_json::Value {
        let envelope = serde_json::to_value(result).unwrap();
        let text = envelope["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_detect_does_not_route() {
        let server = server();
        let result = server
            .detect_data_types(Parameters(detect_input(PAGE)))
            .await
            .unwrap();
        assert_eq!(payload(&result)["totalItems"], 2);

        let router = server.router().lock().await;
        assert!(router.get_queue().is_empty());
        assert_eq!(router.get_stats().stats.total_detected, 0);
        assert_eq!(router.detection_stats().total_scans, 1);
    }

    #[tokio::test]
    async fn test_detect_overrides_apply_to_one_call() {
        let server = server();
        let text = "device imei 490154203237519, mail jane@example.com";

        let mut input = detect_input(text);
        input.types = Some(vec!["imei".to_string()]);
        input.confidence_threshold = Some(0.2);
        let result = payload(&server.detect_data_types(Parameters(input)).await.unwrap());
        assert_eq!(result["totalItems"], 1);
        assert_eq!(result["items"][0]["type"], "imei");

        let result = payload(
            &server
                .detect_data_types(Parameters(detect_input(text)))
                .await
                .unwrap(),
        );
        let types: Vec<&str> = result["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["type"].as_str().unwrap())
            .collect();
        assert!(types.contains(&"email"));
        assert!(!types.contains(&"imei"));
    }

    #[tokio::test]
    async fn test_detect_threshold_out_of_range() {
        let server = server();
        let mut input = detect_input(PAGE);
        input.confidence_threshold = Some(1.5);
        let err = server
            .detect_data_types(Parameters(input))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(server.router().lock().await.detection_stats().total_scans, 0);
    }

    #[tokio::test]
    async fn test_export_given_items() {
        let server = server();
        let detected = payload(
            &server
                .detect_data_types(Parameters(detect_input(PAGE)))
                .await
                .unwrap(),
        );
        let items = detected["items"].as_array().unwrap().clone();

        let exported = payload(
            &server
                .export_detections(Parameters(ExportInput { items: Some(items) }))
                .await
                .unwrap(),
        );
        assert_eq!(exported["totalItems"], 2);

        let queued = payload(
            &server
                .export_detections(Parameters(ExportInput::default()))
                .await
                .unwrap(),
        );
        assert_eq!(queued["totalItems"], 0);
    }

    #[tokio::test]
    async fn test_export_rejects_malformed_items() {
        let server = server();
        let err = server
            .export_detections(Parameters(ExportInput {
                items: Some(vec![serde_json::json!({"id": "det_001"})]),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_process_then_ingest_selected() {
        let server = server();
        server.process_page_for_ingestion(page()).await.unwrap();

        let first = server.router().lock().await.get_queue()[0].id().to_string();
        server
            .ingest_selected(Parameters(ItemIdsInput { ids: vec![first] }))
            .await
            .unwrap();

        let router = server.router().lock().await;
        assert_eq!(router.get_queue().len(), 1);
        assert_eq!(router.get_history(10).len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_mode_is_invalid_params() {
        let server = server();
        let err = server
            .set_ingestion_mode(Parameters(SetModeInput {
                mode: "turbo".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(
            server.router().lock().await.config().mode,
            IngestionMode::Selective
        );
    }

    #[tokio::test]
    async fn test_configure_is_atomic() {
        let server = server();
        let err = server
            .configure_ingestion(Parameters(ConfigureInput {
                settings: serde_json::json!({"mode": "automatic", "confidence_threshold": 1.5}),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(
            server.router().lock().await.config().mode,
            IngestionMode::Selective
        );

        server
            .configure_ingestion(Parameters(ConfigureInput {
                settings: serde_json::json!({"mode": "batch"}),
            }))
            .await
            .unwrap();
        assert_eq!(server.router().lock().await.config().mode, IngestionMode::Batch);
    }

    #[tokio::test]
    async fn test_add_pattern_with_unknown_validator_rejected() {
        let server = server();
        let input: AddPatternInput = serde_json::from_value(serde_json::json!({
            "key": "case_id",
            "patterns": ["CASE-\\d{5}"],
            "validator": "checksum42",
        }))
        .unwrap();
        let err = server
            .add_detection_pattern(Parameters(input))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }
}
