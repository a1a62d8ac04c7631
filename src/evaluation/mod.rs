//! Evaluation module for running the full quote-to-EV pipeline.
//!
//! This module handles:
//! - Classifying quotes as user, sharp or ignored
//! - Staleness and duplicate filtering of sharp quotes
//! - Per-instance consensus with point-mismatch reporting
//! - Building the evaluation report

pub mod pipeline;
pub mod report;

pub use pipeline::evaluate_event;
pub use report::{
    EvaluationOutcome, EvaluationReport, Exclusion, ExclusionReason, InstanceFairLines,
    SkippedQuote,
};
