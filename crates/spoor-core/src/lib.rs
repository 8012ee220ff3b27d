//! spoor-core - Identifier detection for spoor.
//!
//! This crate turns page markup into classified, validated and
//! confidence-scored identifiers (emails, phone numbers, crypto addresses,
//! social profiles, network addresses and more).
//!
//! # Example
//!
//! ```
//! use spoor_core::DetectionEngine;
//!
//! let mut engine = DetectionEngine::default();
//! let result = engine.detect_all(
//!     "Contact me at jane@example.com or call (415) 555-2671",
//!     Some("https://example.com/about"),
//! );
//! assert_eq!(result.total_items, 2);
//! ```

pub mod detection;
pub mod error;
pub mod preprocess;
pub mod registry;
pub mod types;
pub mod validators;

// Re-export commonly used types
pub use detection::{DetectionEngine, DetectionOptions};
pub use error::{ErrorCode, SpoorError, SpoorResult};
pub use registry::{
    CustomPatternDefinition, DetectionRegistry, DetectionTypeSpec, ExclusionFilter, Matcher,
    Normalizer, PatternMatcher, RawMatch, ValueExtractor,
};
pub use types::{
    DetectedItem, DetectionResult, DetectionStats, DetectionTypeInfo, IdentifierType, SourceSpan,
    TypeSummary,
};
pub use validators::Validator;
