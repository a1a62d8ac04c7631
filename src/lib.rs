//! Sportsbook odds normalization, sharp consensus and EV/Kelly engine.
//!
//! Given a bettor's own prices and the prices of sharp books for one event,
//! the engine recovers vig-free fair probabilities, averages them into a
//! consensus per market instance, and reports expected value and a Kelly
//! stake for every user line.
//!
//! ```text
//! Sharp book:  Giants -110 / Cowboys -110  ->  fair 50% / 50%
//! User line:   Giants +120                 ->  payout 1.20
//! ─────────────────────────────────────────────────────────
//! EV:          0.5 * 1.20 - 0.5 = +0.10 per unit staked
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Quote types and normalization
//! - [`pricing`]: Odds conversions and vig removal
//! - [`consensus`]: Sharp consensus per market instance
//! - [`ev`]: Expected value and Kelly sizing
//! - [`evaluation`]: The batch pipeline and its report
//! - [`ingest`]: Upload extraction (JSON, HTML, OCR text)
//! - [`feed`]: The Odds API client
//! - [`api`]: HTTP API for evaluation, health and metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod consensus;
pub mod error;
pub mod ev;
pub mod evaluation;
pub mod feed;
pub mod ingest;
pub mod market;
pub mod metrics;
pub mod pricing;
pub mod utils;

pub use config::{Config, EvaluationConfig};
pub use error::{OddsError, Result};
pub use evaluation::{evaluate_event, EvaluationReport};
