//! Discrete hidden Markov models.
//!
//! The streaming classifier only needs read access to an HMM's log-domain
//! tables, expressed by the [`MarkovModel`] trait. [`DiscreteHmm`] is the
//! stock implementation: dense tables over a finite emission alphabet,
//! validated once at construction and immutable afterwards.
//!
//! # Example
//!
//! ```
//! use hs_core::model::{DiscreteHmm, MarkovModel};
//!
//! // Fair/loaded coin: state 1 prefers heads (symbol 0).
//! let hmm = DiscreteHmm::new(
//!     vec![0.5, 0.5],
//!     vec![vec![0.9, 0.1], vec![0.2, 0.8]],
//!     vec![vec![0.5, 0.5], vec![0.8, 0.2]],
//! )
//! .unwrap();
//!
//! assert_eq!(hmm.states(), 2);
//! assert_eq!(hmm.symbols(), 2);
//! let ll = hmm.log_likelihood(&[0, 0, 1, 0]).unwrap();
//! assert!(ll < 0.0);
//! ```

use hs_common::{Error, Result};
use hs_config::{validate::validate_hmm, HmmSpec};
use hs_math::{log_add_exp, log_sum_exp, safe_ln};

/// Tolerance for log-probability rows normalizing to zero.
const LOG_ROW_TOLERANCE: f64 = 1e-6;

/// Read-only access to a discrete HMM in the log domain.
///
/// Implementations must be immutable for the lifetime of any running
/// statistic bound to them.
pub trait MarkovModel {
    /// Number of hidden states.
    fn states(&self) -> usize;

    /// Size of the emission alphabet; valid symbols are `0..symbols()`.
    fn symbols(&self) -> usize;

    /// `log P(state_0 = state)`.
    fn log_initial(&self, state: usize) -> f64;

    /// `log P(state_{t+1} = to | state_t = from)`.
    fn log_transition(&self, from: usize, to: usize) -> f64;

    /// `log P(symbol | state)`; NEG_INFINITY for impossible emissions.
    fn log_emission(&self, state: usize, symbol: usize) -> f64;

    /// Reject symbols outside the emission alphabet.
    fn check_symbol(&self, symbol: usize) -> Result<()> {
        if symbol < self.symbols() {
            Ok(())
        } else {
            Err(Error::InvalidObservation {
                symbol,
                alphabet: self.symbols(),
            })
        }
    }
}

/// Dense discrete HMM with log-probability tables.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteHmm {
    states: usize,
    symbols: usize,
    log_initial: Vec<f64>,
    /// Row-major `states × states`.
    log_transitions: Vec<f64>,
    /// Row-major `states × symbols`.
    log_emissions: Vec<f64>,
}

impl DiscreteHmm {
    /// Build a model from probability tables.
    ///
    /// Rows must have consistent dimensions, contain finite non-negative
    /// entries, and sum to 1 within 1e-6.
    pub fn new(
        initial: Vec<f64>,
        transitions: Vec<Vec<f64>>,
        emissions: Vec<Vec<f64>>,
    ) -> Result<Self> {
        Self::from_spec(&HmmSpec {
            initial,
            transitions,
            emissions,
        })
    }

    /// Build a model from a model-set table specification.
    pub fn from_spec(spec: &HmmSpec) -> Result<Self> {
        validate_hmm("model", spec)?;

        let states = spec.states();
        let symbols = spec.symbols();
        Ok(Self {
            states,
            symbols,
            log_initial: spec.initial.iter().map(|&p| safe_ln(p)).collect(),
            log_transitions: spec
                .transitions
                .iter()
                .flat_map(|row| row.iter().map(|&p| safe_ln(p)))
                .collect(),
            log_emissions: spec
                .emissions
                .iter()
                .flat_map(|row| row.iter().map(|&p| safe_ln(p)))
                .collect(),
        })
    }

    /// Build a model directly from log-probability tables.
    ///
    /// Each row must log-sum-exp to 0 within 1e-6; NaN and +inf entries are
    /// rejected.
    pub fn from_log_tables(
        log_initial: Vec<f64>,
        log_transitions: Vec<Vec<f64>>,
        log_emissions: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let states = log_initial.len();
        if states == 0 {
            return Err(Error::InvalidModel(
                "model must have at least one state".to_string(),
            ));
        }
        let symbols = log_emissions.first().map_or(0, Vec::len);
        if symbols == 0 {
            return Err(Error::InvalidModel(
                "emission alphabet must be non-empty".to_string(),
            ));
        }
        if log_transitions.len() != states || log_emissions.len() != states {
            return Err(Error::InvalidModel(format!(
                "expected {} transition and emission rows, got {} and {}",
                states,
                log_transitions.len(),
                log_emissions.len()
            )));
        }

        check_log_row("initial", &log_initial, states)?;
        for (i, row) in log_transitions.iter().enumerate() {
            check_log_row(&format!("transitions[{}]", i), row, states)?;
        }
        for (s, row) in log_emissions.iter().enumerate() {
            check_log_row(&format!("emissions[{}]", s), row, symbols)?;
        }

        Ok(Self {
            states,
            symbols,
            log_initial,
            log_transitions: log_transitions.into_iter().flatten().collect(),
            log_emissions: log_emissions.into_iter().flatten().collect(),
        })
    }

    /// Log-likelihood of a complete sequence (batch forward algorithm).
    ///
    /// The empty sequence has log-likelihood `logsumexp(log π)`, i.e. 0 for a
    /// normalized initial distribution.
    pub fn log_likelihood(&self, sequence: &[usize]) -> Result<f64> {
        for &symbol in sequence {
            self.check_symbol(symbol)?;
        }

        let n = self.states;
        let mut alpha = self.log_initial.clone();
        let mut next = vec![f64::NEG_INFINITY; n];

        for (t, &symbol) in sequence.iter().enumerate() {
            for (j, slot) in next.iter_mut().enumerate() {
                let inbound = if t == 0 {
                    self.log_initial[j]
                } else {
                    (0..n).fold(f64::NEG_INFINITY, |acc, i| {
                        log_add_exp(acc, alpha[i] + self.log_transition(i, j))
                    })
                };
                *slot = inbound + self.log_emission(j, symbol);
            }
            std::mem::swap(&mut alpha, &mut next);
        }

        Ok(log_sum_exp(&alpha))
    }
}

fn check_log_row(field: &str, row: &[f64], expected_len: usize) -> Result<()> {
    if row.len() != expected_len {
        return Err(Error::InvalidModel(format!(
            "{}: expected {} entries, got {}",
            field,
            expected_len,
            row.len()
        )));
    }
    if let Some(v) = row.iter().find(|v| v.is_nan() || **v == f64::INFINITY) {
        return Err(Error::InvalidModel(format!(
            "{}: entry {} is not a log-probability",
            field, v
        )));
    }
    let total = log_sum_exp(row);
    if total.abs() > LOG_ROW_TOLERANCE {
        return Err(Error::InvalidModel(format!(
            "{}: row log-sums to {}, expected 0",
            field, total
        )));
    }
    Ok(())
}

impl MarkovModel for DiscreteHmm {
    fn states(&self) -> usize {
        self.states
    }

    fn symbols(&self) -> usize {
        self.symbols
    }

    #[inline]
    fn log_initial(&self, state: usize) -> f64 {
        self.log_initial[state]
    }

    #[inline]
    fn log_transition(&self, from: usize, to: usize) -> f64 {
        self.log_transitions[from * self.states + to]
    }

    #[inline]
    fn log_emission(&self, state: usize, symbol: usize) -> f64 {
        self.log_emissions[state * self.symbols + symbol]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    fn casino() -> DiscreteHmm {
        DiscreteHmm::new(
            vec![0.5, 0.5],
            vec![vec![0.95, 0.05], vec![0.1, 0.9]],
            vec![
                vec![1.0 / 6.0; 6],
                vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.5],
            ],
        )
        .unwrap()
    }

    #[test]
    fn tables_are_stored_in_log_space() {
        let hmm = casino();
        assert!(approx_eq(hmm.log_initial(0), 0.5f64.ln(), 1e-15));
        assert!(approx_eq(hmm.log_transition(1, 0), 0.1f64.ln(), 1e-15));
        assert!(approx_eq(hmm.log_emission(1, 5), 0.5f64.ln(), 1e-15));
    }

    #[test]
    fn zero_probability_maps_to_neg_inf() {
        let hmm = DiscreteHmm::new(
            vec![1.0, 0.0],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();
        assert_eq!(hmm.log_initial(1), f64::NEG_INFINITY);
        assert_eq!(hmm.log_emission(0, 1), f64::NEG_INFINITY);
    }

    #[test]
    fn single_state_likelihood_is_product_of_emissions() {
        let hmm = DiscreteHmm::new(vec![1.0], vec![vec![1.0]], vec![vec![0.25, 0.75]]).unwrap();
        let ll = hmm.log_likelihood(&[0, 1, 1]).unwrap();
        assert!(approx_eq(ll, (0.25f64 * 0.75 * 0.75).ln(), 1e-12));
    }

    #[test]
    fn likelihood_matches_hand_computed_forward() {
        // Two states, two symbols; enumerate all four hidden paths for a length-2 sequence.
        let pi = [0.6, 0.4];
        let a = [[0.7, 0.3], [0.4, 0.6]];
        let b = [[0.9, 0.1], [0.2, 0.8]];
        let hmm = DiscreteHmm::new(
            pi.to_vec(),
            a.iter().map(|r| r.to_vec()).collect(),
            b.iter().map(|r| r.to_vec()).collect(),
        )
        .unwrap();

        let obs = [0usize, 1];
        let mut p = 0.0;
        for s0 in 0..2 {
            for s1 in 0..2 {
                p += pi[s0] * b[s0][obs[0]] * a[s0][s1] * b[s1][obs[1]];
            }
        }
        let ll = hmm.log_likelihood(&obs).unwrap();
        assert!(approx_eq(ll, p.ln(), 1e-12));
    }

    #[test]
    fn empty_sequence_has_zero_log_likelihood() {
        let ll = casino().log_likelihood(&[]).unwrap();
        assert!(approx_eq(ll, 0.0, 1e-12));
    }

    #[test]
    fn out_of_alphabet_symbol_rejected() {
        let err = casino().log_likelihood(&[0, 6]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidObservation {
                symbol: 6,
                alphabet: 6
            }
        ));
    }

    #[test]
    fn malformed_tables_rejected() {
        let err = DiscreteHmm::new(vec![0.5, 0.5], vec![vec![1.0]], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));

        let err = DiscreteHmm::new(vec![0.7], vec![vec![1.0]], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn log_tables_round_trip() {
        let hmm = casino();
        let rebuilt = DiscreteHmm::from_log_tables(
            (0..2).map(|s| hmm.log_initial(s)).collect(),
            (0..2)
                .map(|i| (0..2).map(|j| hmm.log_transition(i, j)).collect())
                .collect(),
            (0..2)
                .map(|s| (0..6).map(|k| hmm.log_emission(s, k)).collect())
                .collect(),
        )
        .unwrap();
        assert_eq!(rebuilt, hmm);
    }

    #[test]
    fn log_tables_must_normalize() {
        let err = DiscreteHmm::from_log_tables(
            vec![0.0],
            vec![vec![0.0]],
            vec![vec![0.0, 0.0]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));

        let err = DiscreteHmm::from_log_tables(vec![f64::NAN], vec![vec![0.0]], vec![vec![0.0]])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }
}
