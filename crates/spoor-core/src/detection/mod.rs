//! Detection engine and its snippet/tag helpers.

mod context;
mod engine;

pub use context::{context_snippet, email_provider, suggested_tags};
pub use engine::{
    DetectionEngine, DetectionOptions, BASE_CONFIDENCE, FAILED_VALIDATION_CONFIDENCE,
    VALIDATED_CONFIDENCE,
};
