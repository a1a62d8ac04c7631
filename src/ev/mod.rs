//! EV module for expected value and Kelly stake sizing.
//!
//! This module handles:
//! - Expected value per unit stake
//! - Fractional Kelly sizing
//! - Per-quote EV results

pub mod calculator;
pub mod kelly;

pub use calculator::{calculate_ev, EvResult};
pub use kelly::{calculate_kelly_fraction, calculate_optimal_stake, clamped_kelly_fraction, expected_value};
