//! Core math modules.

pub mod accumulator;
pub mod stable;
