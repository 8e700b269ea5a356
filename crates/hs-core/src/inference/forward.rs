//! Running log-forward statistic for a single HMM.
//!
//! Tracks `log P(o_1..o_n)` for a growing observation prefix without keeping
//! the prefix: each [`RunningForward::push`] advances the forward recursion
//! by one step in the log domain.
//!
//! # Recursion
//!
//! ```text
//! n = 1:  α'[j] = log π[j] + log b[j](o)
//! n > 1:  α'[j] = logsumexp_i(α[i] + log a[i][j]) + log b[j](o)
//!         log_forward = logsumexp_j(α'[j])
//! ```
//!
//! Before the first observation `α = log π`, so `log_forward` of the empty
//! prefix is `logsumexp(log π)` (zero for a normalized model).

use crate::model::{DiscreteHmm, MarkovModel};
use hs_common::Result;
use hs_math::{log_sum_exp, LogSumExp};
use std::sync::Arc;
use tracing::warn;

/// Incremental forward-algorithm state bound to one model.
#[derive(Debug, Clone)]
pub struct RunningForward<M: MarkovModel = DiscreteHmm> {
    model: Arc<M>,
    /// Committed per-state log-forward probabilities.
    alpha: Vec<f64>,
    /// Recycled buffer for the next step; swapped with `alpha` on push.
    scratch: Vec<f64>,
    log_forward: f64,
    observations: usize,
}

impl<M: MarkovModel> RunningForward<M> {
    /// Bind a fresh statistic to `model`.
    pub fn new(model: Arc<M>) -> Self {
        let states = model.states();
        let mut stat = Self {
            model,
            alpha: vec![f64::NEG_INFINITY; states],
            scratch: vec![f64::NEG_INFINITY; states],
            log_forward: f64::NEG_INFINITY,
            observations: 0,
        };
        stat.clear();
        stat
    }

    /// Reset to the pre-observation state, reusing the buffers.
    pub fn clear(&mut self) {
        for (s, a) in self.alpha.iter_mut().enumerate() {
            *a = self.model.log_initial(s);
        }
        self.log_forward = log_sum_exp(&self.alpha);
        self.observations = 0;
    }

    /// Advance the recursion by one observation.
    ///
    /// Fails with `InvalidObservation` before touching any state if `symbol`
    /// is outside the model's alphabet.
    pub fn push(&mut self, symbol: usize) -> Result<()> {
        self.model.check_symbol(symbol)?;

        let mut next = std::mem::take(&mut self.scratch);
        for (j, slot) in next.iter_mut().enumerate() {
            *slot = self.step(j, symbol);
        }
        self.scratch = std::mem::replace(&mut self.alpha, next);

        // Same fold, same order as `peek`, so a peeked score is bit-identical.
        self.log_forward = self.alpha.iter().copied().collect::<LogSumExp>().value();
        self.observations += 1;

        if self.log_forward.is_nan() {
            warn!(
                observations = self.observations,
                symbol, "log-forward became NaN; model tables are malformed"
            );
        }
        debug_assert!(
            !self.log_forward.is_nan(),
            "NaN log-forward after {} observations",
            self.observations
        );
        Ok(())
    }

    /// The `log_forward` that pushing `symbol` would produce.
    ///
    /// Never mutates the statistic and allocates nothing: the hypothetical
    /// next column is folded cell by cell through the same reduction `push`
    /// applies to its committed column, so the two agree bit for bit.
    /// Repeated peeks are always relative to the committed state.
    pub fn peek(&self, symbol: usize) -> Result<f64> {
        self.model.check_symbol(symbol)?;
        let acc: LogSumExp = (0..self.alpha.len())
            .map(|j| self.step(j, symbol))
            .collect();
        Ok(acc.value())
    }

    /// One cell of the next forward column: `α'[j]` for `symbol`.
    #[inline]
    fn step(&self, j: usize, symbol: usize) -> f64 {
        let emission = self.model.log_emission(j, symbol);
        if emission == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        if self.observations == 0 {
            // alpha still holds log π
            return self.alpha[j] + emission;
        }
        let inbound: LogSumExp = self
            .alpha
            .iter()
            .enumerate()
            .map(|(i, &a)| a + self.model.log_transition(i, j))
            .collect();
        inbound.value() + emission
    }

    /// Log-likelihood of the committed prefix.
    pub fn log_forward(&self) -> f64 {
        self.log_forward
    }

    /// Likelihood of the committed prefix; underflows to 0 on long sequences.
    pub fn forward(&self) -> f64 {
        self.log_forward.exp()
    }

    /// Committed per-state log-forward probabilities.
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    /// Number of observations pushed since construction or the last clear.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// The model this statistic is bound to.
    pub fn model(&self) -> &Arc<M> {
        &self.model
    }
}
