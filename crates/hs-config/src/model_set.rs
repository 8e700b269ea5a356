//! Model-set file types.
//!
//! A model set bundles one discrete HMM per class, the class priors, and an
//! optional background model used for rejection. Files are JSON by default;
//! a `.toml` extension selects TOML.

use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete model-set configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSet {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    pub classes: Vec<ClassSpec>,

    #[serde(default)]
    pub threshold: Option<ThresholdSpec>,
}

/// One class: its label, prior probability and generating model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub label: String,
    pub prior: f64,
    pub model: HmmSpec,
}

/// Background model used to reject sequences matching no class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Weight applied to the background likelihood, analogous to a prior.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    pub model: HmmSpec,
}

fn default_sensitivity() -> f64 {
    1.0
}

/// Discrete HMM tables in probability space.
///
/// `transitions[i][j]` is P(next = j | current = i) and `emissions[s][k]` is
/// P(symbol = k | state = s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmSpec {
    pub initial: Vec<f64>,
    pub transitions: Vec<Vec<f64>>,
    pub emissions: Vec<Vec<f64>>,
}

impl HmmSpec {
    /// Number of hidden states, as declared by the initial vector.
    pub fn states(&self) -> usize {
        self.initial.len()
    }

    /// Size of the emission alphabet, as declared by the first emission row.
    pub fn symbols(&self) -> usize {
        self.emissions.first().map_or(0, Vec::len)
    }
}

impl ModelSet {
    /// Load a model set from a file, choosing the parser by extension.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parse a model set from a JSON string.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse a model set from a TOML string.
    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        toml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Class priors in class-index order.
    pub fn priors(&self) -> Vec<f64> {
        self.classes.iter().map(|c| c.prior).collect()
    }

    /// Class labels in class-index order.
    pub fn labels(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.label.as_str()).collect()
    }

    /// Look up a class label by index.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(|c| c.label.as_str())
    }

    /// Check whether class priors sum to 1 within `tolerance`.
    pub fn priors_sum_to_one(&self, tolerance: f64) -> bool {
        let sum: f64 = self.classes.iter().map(|c| c.prior).sum();
        (sum - 1.0).abs() <= tolerance
    }

    /// Emission alphabet shared by every model (the first class's alphabet).
    pub fn alphabet(&self) -> usize {
        self.classes.first().map_or(0, |c| c.model.symbols())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CLASS: &str = r#"{
        "schema_version": "1.0.0",
        "classes": [
            { "label": "a", "prior": 0.5,
              "model": { "initial": [1.0], "transitions": [[1.0]], "emissions": [[0.9, 0.1]] } },
            { "label": "b", "prior": 0.5,
              "model": { "initial": [1.0], "transitions": [[1.0]], "emissions": [[0.1, 0.9]] } }
        ],
        "threshold": {
            "model": { "initial": [1.0], "transitions": [[1.0]], "emissions": [[0.5, 0.5]] }
        }
    }"#;

    #[test]
    fn parses_json_with_default_sensitivity() {
        let set = ModelSet::from_json_str(TWO_CLASS).unwrap();
        assert_eq!(set.labels(), vec!["a", "b"]);
        assert_eq!(set.priors(), vec![0.5, 0.5]);
        assert_eq!(set.alphabet(), 2);
        assert_eq!(set.label(1), Some("b"));
        assert_eq!(set.label(2), None);
        let threshold = set.threshold.as_ref().unwrap();
        assert_eq!(threshold.sensitivity, 1.0);
        assert_eq!(threshold.model.states(), 1);
        assert!(set.priors_sum_to_one(1e-9));
    }

    #[test]
    fn parses_toml() {
        let toml = r#"
schema_version = "1.0.0"

[[classes]]
label = "only"
prior = 1.0

[classes.model]
initial = [0.5, 0.5]
transitions = [[0.9, 0.1], [0.1, 0.9]]
emissions = [[1.0, 0.0], [0.0, 1.0]]
"#;
        let set = ModelSet::from_toml_str(toml).unwrap();
        assert_eq!(set.classes.len(), 1);
        assert_eq!(set.classes[0].model.states(), 2);
        assert!(set.threshold.is_none());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = ModelSet::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ModelSet::from_file(Path::new("/nonexistent/models.json")).unwrap_err();
        assert!(matches!(err, ValidationError::IoError(_)));
    }
}
