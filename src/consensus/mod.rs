//! Consensus module for aggregating sharp-book fair probabilities.

pub mod builder;

pub use builder::{build_consensus, ConsensusResult};
