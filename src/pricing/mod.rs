//! Pricing module for odds conversion and vig removal.
//!
//! This module handles:
//! - American odds <-> probability conversions
//! - Devigging two-way price pairs into fair probabilities

pub mod convert;
pub mod vig;

pub use convert::{
    american_to_decimal, american_to_implied_probability, american_to_payout,
    probability_to_american, probability_to_american_exact, probability_to_decimal,
};
pub use vig::{devig, fair_line, overround, FairLine, SourceLine};
