//! Streaming multiclass decision over per-class running statistics.
//!
//! Every observation is fanned out to one [`RunningForward`] per class (and
//! to the background statistic when configured). Scores combine as
//! `ln(prior) + log_forward`; the highest strictly-greater score wins, so
//! ties go to the lowest class index and the background model must strictly
//! beat the best class to reject.

use crate::inference::classifier::MarkovClassifier;
use crate::inference::decision::{Decision, Prediction};
use crate::inference::forward::RunningForward;
use crate::model::{DiscreteHmm, MarkovModel};
use hs_common::{Error, Result};
use hs_math::{safe_ln, softmax_in_place};
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone)]
struct ThresholdStatistic<M: MarkovModel> {
    statistic: RunningForward<M>,
    log_sensitivity: f64,
}

/// Running argmax with strict `>` comparison.
struct Best {
    decision: Decision,
    score: f64,
}

impl Best {
    fn new() -> Self {
        Self {
            decision: Decision::Reject,
            score: f64::NEG_INFINITY,
        }
    }

    fn offer_class(&mut self, class: usize, score: f64) {
        if score > self.score {
            self.score = score;
            self.decision = Decision::Class(class);
        }
    }

    fn offer_threshold(&mut self, score: f64) {
        if score > self.score {
            self.score = score;
            self.decision = Decision::Reject;
        }
    }

    fn into_prediction(self) -> Prediction {
        Prediction {
            decision: self.decision,
            log_likelihood: self.score,
        }
    }
}

/// One classification session over a [`MarkovClassifier`]'s models.
///
/// Owns its forward state; the models themselves are shared. Use one
/// instance per concurrently classified sequence.
#[derive(Debug, Clone)]
pub struct RunningMarkovClassifier<M: MarkovModel = DiscreteHmm> {
    models: Vec<RunningForward<M>>,
    log_priors: Vec<f64>,
    threshold: Option<ThresholdStatistic<M>>,
    responses: Vec<f64>,
    threshold_score: f64,
    decision: Decision,
}

impl<M: MarkovModel> RunningMarkovClassifier<M> {
    /// Start a session in the pre-observation state.
    pub fn new(classifier: &MarkovClassifier<M>) -> Self {
        let models: Vec<_> = classifier
            .models()
            .iter()
            .map(|m| RunningForward::new(Arc::clone(m)))
            .collect();
        let log_priors = classifier.priors().iter().map(|&p| safe_ln(p)).collect();
        let threshold = classifier.threshold().map(|t| ThresholdStatistic {
            statistic: RunningForward::new(Arc::clone(t.model())),
            log_sensitivity: t.log_sensitivity(),
        });

        let mut running = Self {
            responses: vec![f64::NEG_INFINITY; models.len()],
            models,
            log_priors,
            threshold,
            threshold_score: f64::NEG_INFINITY,
            decision: Decision::Reject,
        };
        running.clear();
        running
    }

    /// Reject `symbol` unless every class model and the background model accept it.
    pub fn check_symbol(&self, symbol: usize) -> Result<()> {
        for stat in &self.models {
            stat.model().check_symbol(symbol)?;
        }
        if let Some(threshold) = &self.threshold {
            threshold.statistic.model().check_symbol(symbol)?;
        }
        Ok(())
    }

    /// Consume one observation and recompute the decision.
    ///
    /// The symbol is validated against every model first; on error no
    /// statistic has been touched.
    pub fn push(&mut self, symbol: usize) -> Result<()> {
        self.check_symbol(symbol)?;

        let mut best = Best::new();
        for (i, stat) in self.models.iter_mut().enumerate() {
            stat.push(symbol)?;
            self.responses[i] = self.log_priors[i] + stat.log_forward();
            best.offer_class(i, self.responses[i]);
        }
        if let Some(threshold) = &mut self.threshold {
            threshold.statistic.push(symbol)?;
            self.threshold_score = threshold.log_sensitivity + threshold.statistic.log_forward();
            best.offer_threshold(self.threshold_score);
        }
        self.decision = best.decision;

        trace!(
            symbol,
            observations = self.observations(),
            decision = %self.decision,
            score = best.score,
            "pushed observation"
        );
        self.check_scores();
        Ok(())
    }

    /// Push a whole sequence, validating every symbol before the first push.
    pub fn push_all(&mut self, sequence: &[usize]) -> Result<()> {
        for &symbol in sequence {
            self.check_symbol(symbol)?;
        }
        for &symbol in sequence {
            self.push(symbol)?;
        }
        Ok(())
    }

    /// The prediction a push of `symbol` would produce, without committing it.
    ///
    /// Responses, threshold score and decision stay as they were; repeated
    /// peeks are all relative to the committed state.
    pub fn peek(&self, symbol: usize) -> Result<Prediction> {
        self.check_symbol(symbol)?;

        let mut best = Best::new();
        for (i, stat) in self.models.iter().enumerate() {
            best.offer_class(i, self.log_priors[i] + stat.peek(symbol)?);
        }
        if let Some(threshold) = &self.threshold {
            best.offer_threshold(threshold.log_sensitivity + threshold.statistic.peek(symbol)?);
        }
        Ok(best.into_prediction())
    }

    /// Start a new sequence, keeping the allocated statistics.
    ///
    /// Responses become the prior-weighted likelihood of the empty sequence
    /// and the decision is `Reject`.
    pub fn clear(&mut self) {
        for (i, stat) in self.models.iter_mut().enumerate() {
            stat.clear();
            self.responses[i] = self.log_priors[i] + stat.log_forward();
        }
        if let Some(threshold) = &mut self.threshold {
            threshold.statistic.clear();
            self.threshold_score = threshold.log_sensitivity + threshold.statistic.log_forward();
        }
        self.decision = Decision::Reject;
        debug!(
            classes = self.models.len(),
            threshold = self.threshold.is_some(),
            "cleared running classifier"
        );
    }

    fn check_scores(&self) {
        let threshold_nan = self.threshold.is_some() && self.threshold_score.is_nan();
        if threshold_nan || self.responses.iter().any(|r| r.is_nan()) {
            warn!(
                observations = self.observations(),
                "NaN class score; a model definition is malformed"
            );
        }
        debug_assert!(
            !threshold_nan && !self.responses.iter().any(|r| r.is_nan()),
            "NaN score after {} observations",
            self.observations()
        );
    }

    /// Per-class `ln(prior) + log_forward`, in class order.
    pub fn responses(&self) -> &[f64] {
        &self.responses
    }

    /// `ln(sensitivity) + log_forward` of the background model, if configured.
    pub fn threshold_score(&self) -> Option<f64> {
        self.threshold.as_ref().map(|_| self.threshold_score)
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Best committed combined score across classes and the background model.
    pub fn log_likelihood(&self) -> f64 {
        let classes = self
            .responses
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        match self.threshold_score() {
            Some(t) => classes.max(t),
            None => classes,
        }
    }

    /// Committed decision and its score.
    pub fn prediction(&self) -> Prediction {
        Prediction {
            decision: self.decision,
            log_likelihood: self.log_likelihood(),
        }
    }

    /// Observations pushed since construction or the last clear.
    pub fn observations(&self) -> usize {
        self.models.first().map_or(0, |m| m.observations())
    }

    pub fn classes(&self) -> usize {
        self.models.len()
    }

    pub fn has_threshold(&self) -> bool {
        self.threshold.is_some()
    }

    /// Per-class running statistics, in class order.
    pub fn statistics(&self) -> &[RunningForward<M>] {
        &self.models
    }

    /// Background statistic, if configured.
    pub fn threshold_statistic(&self) -> Option<&RunningForward<M>> {
        self.threshold.as_ref().map(|t| &t.statistic)
    }

    /// Normalized class probabilities of the committed state.
    ///
    /// Writes the softmax of `responses` into `out[..classes]`, with the
    /// background model in the next slot when configured. Decisions do not
    /// depend on this.
    pub fn probabilities(&self, out: &mut [f64]) -> Result<()> {
        let needed = self.models.len() + usize::from(self.threshold.is_some());
        if out.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                got: out.len(),
            });
        }
        let out = &mut out[..needed];
        out[..self.responses.len()].copy_from_slice(&self.responses);
        if self.threshold.is_some() {
            out[self.responses.len()] = self.threshold_score;
        }
        softmax_in_place(out);
        Ok(())
    }
}
