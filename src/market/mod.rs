//! Market module for quotes and their normalization.
//!
//! This module handles:
//! - Market, side and quote types
//! - Market instances (the unit of comparison)
//! - Normalizing raw quote tuples into validated quotes

pub mod normalizer;
pub mod types;

pub use normalizer::{normalize_quote, OddsValue, RawQuote};
pub use types::{AmericanOdds, EventContext, MarketInstance, MarketKind, Quote, Side};
