//! hmm-stream core library.
//!
//! Online multiclass classification of discrete observation streams, one
//! hidden Markov model per class, with an optional background model for
//! rejecting sequences that match no class.

pub mod exit_codes;
pub mod inference;
pub mod input;
pub mod logging;
pub mod model;

pub use inference::{
    BatchClassifier, Decision, MarkovClassifier, Prediction, RunningForward,
    RunningMarkovClassifier, SequenceClassifier, Threshold,
};
pub use model::{DiscreteHmm, MarkovModel};
