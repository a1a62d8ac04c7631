//! Odds feed collaborator for The Odds API.
//!
//! Supplies the sharp lines and event context for an evaluation. HTTP
//! failures surface as [`crate::error::FeedError`]; nothing here retries.

pub mod client;
pub mod types;

pub use client::OddsApiClient;
pub use types::{ApiBookmaker, ApiEvent, ApiMarket, ApiOutcome, ApiSport};
