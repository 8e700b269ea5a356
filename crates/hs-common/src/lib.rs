//! hmm-stream common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - The unified error type with stable codes
//! - Output format specifications for the CLI

pub mod error;
pub mod output;

pub use error::{Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use output::OutputFormat;

/// Schema version of the model-set files and JSON payloads.
pub const SCHEMA_VERSION: &str = "1.0.0";
