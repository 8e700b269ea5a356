//! Streaming HMM inference and multiclass decisions.
//!
//! - [`forward`]: incremental log-forward statistic for one model
//! - [`classifier`]: immutable multiclass model (classes, priors, background)
//! - [`running`]: per-sequence streaming decision with rejection
//! - [`decision`]: result types and batch classification capabilities

pub mod classifier;
pub mod decision;
pub mod forward;
pub mod running;

pub use classifier::{MarkovClassifier, Threshold};
pub use decision::{BatchClassifier, Decision, Prediction, SequenceClassifier};
pub use forward::RunningForward;
pub use running::RunningMarkovClassifier;
