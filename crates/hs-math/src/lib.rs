//! hmm-stream math utilities.

pub mod math;

pub use math::accumulator::LogSumExp;
pub use math::stable::*;
