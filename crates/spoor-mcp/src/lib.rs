//! MCP server for the spoor detection and ingestion pipeline.
//!
//! Lets an agent driving a browser hand page markup to the pipeline and
//! manage the review queue.
//!
//! # Tools
//!
//! - `detect_data_types` - Scan a page without routing
//! - `process_page_for_ingestion` - Scan a page and route every item
//! - `get_ingestion_queue`, `ingest_selected`, `ingest_all`,
//!   `remove_from_ingestion_queue`, `clear_ingestion_queue` - Review queue
//! - `get_ingestion_history`, `get_ingestion_stats`, `reset_ingestion_stats`,
//!   `export_detections` - Reporting
//! - `get_detection_types`, `add_detection_pattern`, `remove_detection_pattern` -
//!   Detection table
//! - `get_ingestion_config`, `set_ingestion_mode`, `configure_ingestion` -
//!   Configuration
//!
//! # Configuration
//!
//! - `SPOOR_CONFIG` - Path to a TOML, JSON or YAML config file
//! - `SPOOR_DATA_DIR` - Directory for `orphans.jsonl` (default: ~/.spoor)
//! - `SPOOR_INGESTION_MODE`, `SPOOR_CONFIDENCE_THRESHOLD`, ... - Used when no
//!   config file is given

pub mod server;
pub mod sink;
pub mod tools;

pub use server::SpoorServer;
pub use sink::JsonlSink;
