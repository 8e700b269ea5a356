//! hmm-stream configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for model-set files (JSON or TOML)
//! - Path resolution (CLI → env → XDG → system)
//! - Semantic validation of HMM tables, priors and thresholds

pub mod model_set;
pub mod resolve;
pub mod validate;

pub use model_set::{ClassSpec, HmmSpec, ModelSet, ThresholdSpec};
pub use resolve::{resolve_model_path, ConfigSource, ResolvedPath};
pub use validate::{validate_model_set, ValidationError, ValidationResult};

use std::path::Path;

/// Schema version for model-set files.
pub const CONFIG_SCHEMA_VERSION: &str = hs_common::SCHEMA_VERSION;

/// Read, parse and validate a model-set file.
pub fn load_model_set(path: &Path) -> ValidationResult<ModelSet> {
    let set = ModelSet::from_file(path)?;
    validate_model_set(&set)?;
    tracing::debug!(
        path = %path.display(),
        classes = set.classes.len(),
        threshold = set.threshold.is_some(),
        "loaded model set"
    );
    Ok(set)
}
