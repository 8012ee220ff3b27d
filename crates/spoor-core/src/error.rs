//! Error types for spoor operations.
//!
//! Data-dependent problems (bad page text, a failing rule, a failing sink) are
//! reported through result structs. `SpoorError` is what setters, registration
//! and configuration loading return, plus the per-item failures the router
//! folds into its results.

use thiserror::Error;

/// Result type alias for spoor operations.
pub type SpoorResult<T> = Result<T, SpoorError>;

/// Main error type for all spoor operations.
#[derive(Error, Debug)]
pub enum SpoorError {
    /// Configuration value rejected.
    #[error("Configuration error: {message}")]
    Configuration { message: String, code: ErrorCode },

    /// A custom detection pattern failed structural validation.
    #[error("Invalid pattern '{key}': {message}")]
    InvalidPattern {
        key: String,
        message: String,
        code: ErrorCode,
    },

    /// A matching rule or value hook failed while scanning.
    #[error("Rule failed for '{key}': {message}")]
    RuleFailed { key: String, message: String },

    /// An event handler (ingest sink, queue observer) failed.
    #[error("Handler error: {message}")]
    Handler {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgInvalidValue,
    CfgInvalidMode,
    CfgUnsupportedFormat,

    // Patterns (PAT_xxx)
    PatMissingRules,
    PatInvalidRegex,
    PatUnknownValidator,
    PatUnknownClassification,
    PatInvalidKey,

    // Rules (RULE_xxx)
    RuleExecution,

    // Handlers (HDL_xxx)
    HandlerFailed,

    // IO and serialization
    Io,
    Serialization,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgInvalidValue => "CFG_001",
            ErrorCode::CfgInvalidMode => "CFG_002",
            ErrorCode::CfgUnsupportedFormat => "CFG_003",
            ErrorCode::PatMissingRules => "PAT_001",
            ErrorCode::PatInvalidRegex => "PAT_002",
            ErrorCode::PatUnknownValidator => "PAT_003",
            ErrorCode::PatUnknownClassification => "PAT_004",
            ErrorCode::PatInvalidKey => "PAT_005",
            ErrorCode::RuleExecution => "RULE_001",
            ErrorCode::HandlerFailed => "HDL_001",
            ErrorCode::Io => "IO_001",
            ErrorCode::Serialization => "SER_001",
        }
    }
}

impl SpoorError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            code: ErrorCode::CfgInvalidValue,
        }
    }

    /// Create an error for an unrecognized ingestion mode string.
    pub fn invalid_mode(mode: &str, valid: &[&str]) -> Self {
        Self::Configuration {
            message: format!(
                "Invalid ingestion mode '{}'. Valid modes: {}",
                mode,
                valid.join(", ")
            ),
            code: ErrorCode::CfgInvalidMode,
        }
    }

    /// Create an error for an unsupported configuration file format.
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            code: ErrorCode::CfgUnsupportedFormat,
        }
    }

    /// Create an invalid pattern error with a specific code.
    pub fn invalid_pattern(key: impl Into<String>, message: impl Into<String>, code: ErrorCode) -> Self {
        Self::InvalidPattern {
            key: key.into(),
            message: message.into(),
            code,
        }
    }

    /// Create an error for a validator name the library does not know.
    pub fn unknown_validator(key: impl Into<String>, validator: &str) -> Self {
        Self::invalid_pattern(
            key,
            format!("unknown validator '{}'", validator),
            ErrorCode::PatUnknownValidator,
        )
    }

    /// Create a rule execution error.
    pub fn rule_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { code, .. } => *code,
            Self::InvalidPattern { code, .. } => *code,
            Self::RuleFailed { .. } => ErrorCode::RuleExecution,
            Self::Handler { .. } => ErrorCode::HandlerFailed,
            Self::Io(_) => ErrorCode::Io,
            Self::Serialization(_) => ErrorCode::Serialization,
        }
    }

    /// Whether this error came from a setter or registration call rather than data.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::InvalidPattern { .. })
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for SpoorError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Handler {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
