//! Model-set validation errors and semantic validation.

use crate::model_set::{HmmSpec, ModelSet};
use std::collections::HashSet;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Tolerance for class priors summing to one.
pub const PRIOR_SUM_TOLERANCE: f64 = 0.01;

/// Tolerance for HMM probability rows summing to one.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Model-set validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid prior for {field}: {message}")]
    InvalidPrior { field: String, message: String },

    #[error("Invalid model {field}: {message}")]
    InvalidModel { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidPrior { .. } => 64,
            ValidationError::InvalidModel { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for hs_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) | ValidationError::ParseError(msg) => {
                hs_common::Error::Config(msg)
            }
            ValidationError::SemanticError(msg) => hs_common::Error::Config(msg),
            ValidationError::InvalidPrior { field, message } => {
                hs_common::Error::InvalidPriors(format!("{}: {}", field, message))
            }
            ValidationError::InvalidModel { field, message } => {
                hs_common::Error::InvalidModel(format!("{}: {}", field, message))
            }
            err @ ValidationError::VersionMismatch { .. } => {
                hs_common::Error::SchemaValidation(err.to_string())
            }
        }
    }
}

/// Validate a model set semantically.
pub fn validate_model_set(set: &ModelSet) -> ValidationResult<()> {
    if set.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: set.schema_version.clone(),
        });
    }

    if set.classes.is_empty() {
        return Err(ValidationError::SemanticError(
            "Model set must declare at least one class".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (i, class) in set.classes.iter().enumerate() {
        if !seen.insert(class.label.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "Duplicate class label '{}' at classes[{}]",
                class.label, i
            )));
        }

        if !(0.0..=1.0).contains(&class.prior) {
            return Err(ValidationError::InvalidPrior {
                field: format!("classes[{}].prior", i),
                message: format!("Must be in [0, 1], got {}", class.prior),
            });
        }

        validate_hmm(&format!("classes[{}].model", i), &class.model)?;
    }

    if !set.priors_sum_to_one(PRIOR_SUM_TOLERANCE) {
        let sum: f64 = set.classes.iter().map(|c| c.prior).sum();
        return Err(ValidationError::InvalidPrior {
            field: "classes[*].prior".to_string(),
            message: format!("Class priors must sum to 1.0, got {}", sum),
        });
    }

    let alphabet = set.alphabet();
    for (i, class) in set.classes.iter().enumerate().skip(1) {
        if class.model.symbols() != alphabet {
            return Err(ValidationError::SemanticError(format!(
                "classes[{}] emits {} symbols but classes[0] emits {}",
                i,
                class.model.symbols(),
                alphabet
            )));
        }
    }

    if let Some(threshold) = &set.threshold {
        if !(threshold.sensitivity > 0.0 && threshold.sensitivity.is_finite()) {
            return Err(ValidationError::InvalidPrior {
                field: "threshold.sensitivity".to_string(),
                message: format!("Must be positive and finite, got {}", threshold.sensitivity),
            });
        }
        validate_hmm("threshold.model", &threshold.model)?;
        if threshold.model.symbols() != alphabet {
            return Err(ValidationError::SemanticError(format!(
                "threshold emits {} symbols but classes emit {}",
                threshold.model.symbols(),
                alphabet
            )));
        }
    }

    Ok(())
}

/// Validate one set of HMM tables.
pub fn validate_hmm(field: &str, spec: &HmmSpec) -> ValidationResult<()> {
    let states = spec.states();
    if states == 0 {
        return Err(ValidationError::InvalidModel {
            field: format!("{}.initial", field),
            message: "Model must have at least one state".to_string(),
        });
    }

    validate_row(&format!("{}.initial", field), &spec.initial, states)?;

    if spec.transitions.len() != states {
        return Err(ValidationError::InvalidModel {
            field: format!("{}.transitions", field),
            message: format!("Expected {} rows, got {}", states, spec.transitions.len()),
        });
    }
    for (i, row) in spec.transitions.iter().enumerate() {
        validate_row(&format!("{}.transitions[{}]", field, i), row, states)?;
    }

    if spec.emissions.len() != states {
        return Err(ValidationError::InvalidModel {
            field: format!("{}.emissions", field),
            message: format!("Expected {} rows, got {}", states, spec.emissions.len()),
        });
    }
    let symbols = spec.symbols();
    if symbols == 0 {
        return Err(ValidationError::InvalidModel {
            field: format!("{}.emissions", field),
            message: "Emission alphabet must be non-empty".to_string(),
        });
    }
    for (s, row) in spec.emissions.iter().enumerate() {
        validate_row(&format!("{}.emissions[{}]", field, s), row, symbols)?;
    }

    Ok(())
}

/// A probability row: expected length, finite non-negative entries, sums to one.
fn validate_row(field: &str, row: &[f64], expected_len: usize) -> ValidationResult<()> {
    if row.len() != expected_len {
        return Err(ValidationError::InvalidModel {
            field: field.to_string(),
            message: format!("Expected {} entries, got {}", expected_len, row.len()),
        });
    }
    if let Some((k, p)) = row
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p < 0.0)
    {
        return Err(ValidationError::InvalidModel {
            field: format!("{}[{}]", field, k),
            message: format!("Must be a finite non-negative probability, got {}", p),
        });
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
        return Err(ValidationError::InvalidModel {
            field: field.to_string(),
            message: format!("Row sums to {}, expected 1.0", sum),
        });
    }
    Ok(())
}
