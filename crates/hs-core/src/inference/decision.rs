//! Classification results and prediction capabilities.

use hs_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a classification: a class index or rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The sequence is best explained by this class.
    Class(usize),
    /// No class beat the background model (or nothing has been observed).
    #[default]
    Reject,
}

impl Decision {
    /// The predicted class, if any.
    pub fn class(&self) -> Option<usize> {
        match self {
            Decision::Class(i) => Some(*i),
            Decision::Reject => None,
        }
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Decision::Reject)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Class(i) => write!(f, "class {}", i),
            Decision::Reject => write!(f, "reject"),
        }
    }
}

/// A decision paired with the winning combined log-likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub decision: Decision,
    /// `ln(prior) + log_forward` of the winner (class or background).
    pub log_likelihood: f64,
}

impl Default for Prediction {
    fn default() -> Self {
        Self {
            decision: Decision::Reject,
            log_likelihood: f64::NEG_INFINITY,
        }
    }
}

/// Classify one complete sequence.
pub trait SequenceClassifier {
    fn classify(&self, sequence: &[usize]) -> Result<Prediction>;
}

/// Classify many complete sequences.
///
/// `classify_into` writes into a caller-supplied buffer so hot loops can
/// avoid allocating; `classify_all` is the owned-return convenience.
pub trait BatchClassifier: SequenceClassifier {
    /// Classify `sequences[k]` into `out[k]`.
    ///
    /// `out` must hold at least `sequences.len()` entries. On error, entries
    /// before the failing sequence have been written.
    fn classify_into<S: AsRef<[usize]>>(
        &self,
        sequences: &[S],
        out: &mut [Prediction],
    ) -> Result<()> {
        if out.len() < sequences.len() {
            return Err(Error::BufferTooSmall {
                needed: sequences.len(),
                got: out.len(),
            });
        }
        for (slot, sequence) in out.iter_mut().zip(sequences) {
            *slot = self.classify(sequence.as_ref())?;
        }
        Ok(())
    }

    fn classify_all<S: AsRef<[usize]>>(&self, sequences: &[S]) -> Result<Vec<Prediction>> {
        let mut out = vec![Prediction::default(); sequences.len()];
        self.classify_into(sequences, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Picks class = first symbol, for exercising the batch defaults.
    struct FirstSymbol;

    impl SequenceClassifier for FirstSymbol {
        fn classify(&self, sequence: &[usize]) -> Result<Prediction> {
            match sequence.first() {
                Some(&s) if s < 3 => Ok(Prediction {
                    decision: Decision::Class(s),
                    log_likelihood: 0.0,
                }),
                Some(&s) => Err(Error::InvalidObservation {
                    symbol: s,
                    alphabet: 3,
                }),
                None => Ok(Prediction::default()),
            }
        }
    }

    impl BatchClassifier for FirstSymbol {}

    #[test]
    fn decision_accessors() {
        assert_eq!(Decision::Class(2).class(), Some(2));
        assert_eq!(Decision::Reject.class(), None);
        assert!(Decision::default().is_reject());
        assert_eq!(Decision::Class(1).to_string(), "class 1");
        assert_eq!(Decision::Reject.to_string(), "reject");
    }

    #[test]
    fn decision_serializes_compactly() {
        assert_eq!(serde_json::to_string(&Decision::Reject).unwrap(), r#""reject""#);
        assert_eq!(
            serde_json::to_string(&Decision::Class(3)).unwrap(),
            r#"{"class":3}"#
        );
    }

    #[test]
    fn classify_all_preserves_order() {
        let out = FirstSymbol
            .classify_all(&[vec![2, 0], vec![], vec![0]])
            .unwrap();
        let decisions: Vec<_> = out.iter().map(|p| p.decision).collect();
        assert_eq!(
            decisions,
            vec![Decision::Class(2), Decision::Reject, Decision::Class(0)]
        );
    }

    #[test]
    fn classify_into_checks_buffer() {
        let mut out = [Prediction::default(); 1];
        let err = FirstSymbol
            .classify_into(&[[0usize], [1]], &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::BufferTooSmall { needed: 2, got: 1 }));
    }

    #[test]
    fn classify_into_propagates_errors() {
        let mut out = [Prediction::default(); 2];
        let err = FirstSymbol
            .classify_into(&[[1usize], [7]], &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidObservation { symbol: 7, .. }));
        assert_eq!(out[0].decision, Decision::Class(1));
    }
}
