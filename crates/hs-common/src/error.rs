//! Error types for hmm-stream.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Invalid Observation
//!   Reason: observation symbol 7 outside emission alphabet of size 4
//!   Fix: Symbols must be integers in [0, alphabet); check the input encoding.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 30,
//!   "category": "classification",
//!   "message": "observation symbol 7 outside emission alphabet of size 4",
//!   "recoverable": true,
//!   "suggested_action": "fix_input",
//!   "context": { "symbol": 7, "alphabet": 4 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for hmm-stream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Model-set files and model definitions.
    Config,
    /// Streaming classification errors.
    Classification,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Classification => write!(f, "classification"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Run the model-set check command.
    RunCheck,
    /// Correct the observation stream and resubmit.
    FixInput,
    /// Skip this sequence and continue.
    Skip,
    /// Abort the operation.
    Abort,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::Skip => write!(f, "skip"),
            SuggestedAction::Abort => write!(f, "abort"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for hmm-stream.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid priors: {0}")]
    InvalidPriors(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Classification errors (30-39)
    #[error("observation symbol {symbol} outside emission alphabet of size {alphabet}")]
    InvalidObservation { symbol: usize, alphabet: usize },

    #[error("classifier has no class models")]
    UninitializedModel,

    #[error("output buffer too small: need {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 30-39: Classification errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidModel(_) => 11,
            Error::InvalidPriors(_) => 12,
            Error::SchemaValidation(_) => 13,
            Error::InvalidObservation { .. } => 30,
            Error::UninitializedModel => 31,
            Error::BufferTooSmall { .. } => 33,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidModel(_)
            | Error::InvalidPriors(_)
            | Error::SchemaValidation(_) => ErrorCategory::Config,

            Error::InvalidObservation { .. }
            | Error::UninitializedModel
            | Error::BufferTooSmall { .. } => ErrorCategory::Classification,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the caller.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Config errors: recoverable by fixing the model set
            Error::Config(_) => true,
            Error::InvalidModel(_) => true,
            Error::InvalidPriors(_) => true,
            Error::SchemaValidation(_) => true,

            // A rejected observation leaves state untouched
            Error::InvalidObservation { .. } => true,
            Error::UninitializedModel => false,
            Error::BufferTooSmall { .. } => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for agents.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidModel(_) => SuggestedAction::RunCheck,
            Error::InvalidPriors(_) => SuggestedAction::RunCheck,
            Error::SchemaValidation(_) => SuggestedAction::RunCheck,

            Error::InvalidObservation { .. } => SuggestedAction::FixInput,
            Error::UninitializedModel => SuggestedAction::Abort,
            Error::BufferTooSmall { .. } => SuggestedAction::ManualIntervention,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'hs-core check --models <file>' to validate the model set."
            }
            Error::InvalidModel(_) => concat!(
                "Every initial, transition and emission row must be a probability vector ",
                "of the declared size."
            ),
            Error::InvalidPriors(_) => concat!(
                "Class priors must be non-negative and sum to 1; ",
                "threshold sensitivity must be positive."
            ),
            Error::SchemaValidation(_) => {
                "Ensure the model-set file declares a supported schema_version."
            }

            Error::InvalidObservation { .. } => {
                "Symbols must be integers in [0, alphabet); check the input encoding."
            }
            Error::UninitializedModel => {
                "Provide at least one class model when building the classifier."
            }
            Error::BufferTooSmall { .. } => {
                "Size the output buffer to at least the number of inputs."
            }

            Error::Io(_) => "Check that the file exists and is readable, then retry.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidModel(_) => "Invalid Model",
            Error::InvalidPriors(_) => "Invalid Priors",
            Error::SchemaValidation(_) => "Schema Validation Failed",

            Error::InvalidObservation { .. } => "Invalid Observation",
            Error::UninitializedModel => "Uninitialized Classifier",
            Error::BufferTooSmall { .. } => "Buffer Too Small",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for agents.
    pub suggested_action: SuggestedAction,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidObservation { symbol, alphabet } => {
                context.insert("symbol".to_string(), serde_json::json!(symbol));
                context.insert("alphabet".to_string(), serde_json::json!(alphabet));
            }
            Error::BufferTooSmall { needed, got } => {
                context.insert("needed".to_string(), serde_json::json!(needed));
                context.insert("got".to_string(), serde_json::json!(got));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
