//! Multiclass HMM classifier definition.
//!
//! [`MarkovClassifier`] owns the per-class models, their priors and the
//! optional background model. It is immutable and cheap to share; streaming
//! state lives in [`RunningMarkovClassifier`], which borrows nothing and can
//! be spawned per sequence with [`MarkovClassifier::running`].

use crate::inference::decision::{BatchClassifier, Prediction, SequenceClassifier};
use crate::inference::running::RunningMarkovClassifier;
use crate::model::{DiscreteHmm, MarkovModel};
use hs_common::{Error, Result};
use hs_config::validate::{validate_model_set, PRIOR_SUM_TOLERANCE};
use hs_config::ModelSet;
use std::sync::Arc;
use tracing::debug;

/// Background model plus the weight applied to its likelihood.
#[derive(Debug)]
pub struct Threshold<M: MarkovModel = DiscreteHmm> {
    model: Arc<M>,
    sensitivity: f64,
}

// Manual impl: cloning shares the model and must not require `M: Clone`.
impl<M: MarkovModel> Clone for Threshold<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            sensitivity: self.sensitivity,
        }
    }
}

impl<M: MarkovModel> Threshold<M> {
    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// `ln(sensitivity)`, added to the background log-likelihood.
    pub fn log_sensitivity(&self) -> f64 {
        self.sensitivity.ln()
    }
}

/// One HMM per class, class priors, and an optional background model.
#[derive(Debug)]
pub struct MarkovClassifier<M: MarkovModel = DiscreteHmm> {
    models: Vec<Arc<M>>,
    priors: Vec<f64>,
    threshold: Option<Threshold<M>>,
}

impl<M: MarkovModel> Clone for MarkovClassifier<M> {
    fn clone(&self) -> Self {
        Self {
            models: self.models.clone(),
            priors: self.priors.clone(),
            threshold: self.threshold.clone(),
        }
    }
}

impl<M: MarkovModel> MarkovClassifier<M> {
    /// Build a classifier from per-class models and priors.
    ///
    /// Fails with `UninitializedModel` when `models` is empty and with
    /// `InvalidPriors` unless `priors` is a simplex of matching length.
    pub fn new(models: Vec<Arc<M>>, priors: Vec<f64>) -> Result<Self> {
        if models.is_empty() {
            return Err(Error::UninitializedModel);
        }
        if priors.len() != models.len() {
            return Err(Error::InvalidPriors(format!(
                "{} priors for {} classes",
                priors.len(),
                models.len()
            )));
        }
        if let Some((i, p)) = priors
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(Error::InvalidPriors(format!(
                "prior {} must be a non-negative probability, got {}",
                i, p
            )));
        }
        let sum: f64 = priors.iter().sum();
        if (sum - 1.0).abs() > PRIOR_SUM_TOLERANCE {
            return Err(Error::InvalidPriors(format!(
                "priors must sum to 1.0, got {}",
                sum
            )));
        }

        debug!(classes = models.len(), "built markov classifier");
        Ok(Self {
            models,
            priors,
            threshold: None,
        })
    }

    /// Build a classifier with equal priors.
    pub fn uniform(models: Vec<Arc<M>>) -> Result<Self> {
        let n = models.len();
        let priors = vec![1.0 / n.max(1) as f64; n];
        Self::new(models, priors)
    }

    /// Attach a background model used to reject sequences.
    pub fn with_threshold(mut self, model: Arc<M>, sensitivity: f64) -> Result<Self> {
        if !(sensitivity.is_finite() && sensitivity > 0.0) {
            return Err(Error::InvalidPriors(format!(
                "threshold sensitivity must be positive, got {}",
                sensitivity
            )));
        }
        debug!(sensitivity, "attached threshold model");
        self.threshold = Some(Threshold { model, sensitivity });
        Ok(self)
    }

    pub fn classes(&self) -> usize {
        self.models.len()
    }

    pub fn models(&self) -> &[Arc<M>] {
        &self.models
    }

    pub fn priors(&self) -> &[f64] {
        &self.priors
    }

    pub fn threshold(&self) -> Option<&Threshold<M>> {
        self.threshold.as_ref()
    }

    /// Validate a symbol against every class model and the background model.
    pub fn check_symbol(&self, symbol: usize) -> Result<()> {
        for model in &self.models {
            model.check_symbol(symbol)?;
        }
        if let Some(threshold) = &self.threshold {
            threshold.model.check_symbol(symbol)?;
        }
        Ok(())
    }

    /// Fresh streaming session sharing this classifier's models.
    pub fn running(&self) -> RunningMarkovClassifier<M> {
        RunningMarkovClassifier::new(self)
    }
}

impl MarkovClassifier<DiscreteHmm> {
    /// Build a classifier from a model-set file's contents.
    pub fn from_model_set(set: &ModelSet) -> Result<Self> {
        validate_model_set(set)?;

        let models = set
            .classes
            .iter()
            .map(|class| DiscreteHmm::from_spec(&class.model).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        let classifier = Self::new(models, set.priors())?;

        match &set.threshold {
            Some(threshold) => classifier.with_threshold(
                Arc::new(DiscreteHmm::from_spec(&threshold.model)?),
                threshold.sensitivity,
            ),
            None => Ok(classifier),
        }
    }
}

impl<M: MarkovModel> SequenceClassifier for MarkovClassifier<M> {
    fn classify(&self, sequence: &[usize]) -> Result<Prediction> {
        let mut running = self.running();
        running.push_all(sequence)?;
        Ok(running.prediction())
    }
}

impl<M: MarkovModel> BatchClassifier for MarkovClassifier<M> {}
