//! Unified error types for the odds engine.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::market::MarketKind;

/// Unified error type for the odds engine.
#[derive(Error, Debug)]
pub enum OddsError {
    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A raw quote could not be normalized.
    #[error("malformed quote: {0}")]
    Quote(#[from] QuoteError),

    /// Odds conversion or vig removal error.
    #[error("pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Consensus could not be built.
    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    /// Upload extraction error.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Odds feed error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment could not be deserialized.
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    /// A value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Malformed quote errors. Scoped to a single raw tuple.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    /// American odds of zero.
    #[error("odds must not be zero")]
    ZeroOdds,

    /// American odds with magnitude below 100.
    #[error("odds {odds} out of range: magnitude must be at least 100")]
    OddsOutOfRange {
        /// The offending odds value.
        odds: i64,
    },

    /// Odds value that is not an integral American price.
    #[error("unparseable odds value {value:?}")]
    UnparseableOdds {
        /// Raw input.
        value: String,
    },

    /// Market name not recognised.
    #[error("unknown market {value:?}")]
    UnknownMarket {
        /// Raw input.
        value: String,
    },

    /// Spread or total quote without a point.
    #[error("{market} quote requires a point")]
    MissingPoint {
        /// Market that requires the point.
        market: MarketKind,
    },

    /// Moneyline quote carrying a point.
    #[error("moneyline quote must not carry a point (got {point})")]
    UnexpectedPoint {
        /// The point that was supplied.
        point: Decimal,
    },

    /// Selection label that maps to no side of the event.
    #[error("selection {label:?} does not match any {market} side of the event")]
    UnknownSelection {
        /// Raw label.
        label: String,
        /// Market being quoted.
        market: MarketKind,
    },
}

/// Odds conversion and vig removal errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    /// Vig removal preconditions violated.
    #[error("invalid market: {reason}")]
    InvalidMarket {
        /// What was wrong.
        reason: String,
    },

    /// Probability outside the open interval (0, 1).
    #[error("probability {probability} outside (0, 1)")]
    ProbabilityOutOfRange {
        /// The offending probability.
        probability: f64,
    },
}

/// Consensus errors. Scoped to one market instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsensusError {
    /// No sharp source supplied usable data for the instance.
    #[error("no consensus available for {instance}: {reason}")]
    NoConsensusAvailable {
        /// Display form of the market instance.
        instance: String,
        /// Why nothing usable was found.
        reason: String,
    },
}

/// Upload extraction errors.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The document is not valid JSON.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON document has neither a `lines` array nor a top-level array.
    #[error("json must contain a top-level 'lines' array")]
    MissingLines,

    /// Nothing usable was found in the document.
    #[error("no lines found in {format} input")]
    NoLinesFound {
        /// Format that was being parsed.
        format: &'static str,
    },

    /// File extension not handled.
    #[error("unsupported upload format {extension:?}; use JSON, HTML or OCR text")]
    UnsupportedFormat {
        /// Extension of the upload.
        extension: String,
    },

    /// Timestamp that is not RFC 3339.
    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp {
        /// Raw input.
        value: String,
    },
}

/// Odds API errors.
#[derive(Error, Debug)]
pub enum FeedError {
    /// API key missing from configuration.
    #[error("THE_ODDS_API_KEY is not set")]
    MissingApiKey,

    /// Request could not be sent or response body not read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response.
    #[error("failed to fetch {resource}: {reason}")]
    FetchFailed {
        /// Resource being fetched.
        resource: String,
        /// Reason for failure.
        reason: String,
    },

    /// Unexpected payload.
    #[error("failed to parse feed data: {0}")]
    ParseError(String),

    /// Requested event absent from the response.
    #[error("event {event_id} not found or has no odds")]
    EventNotFound {
        /// Requested event.
        event_id: String,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, OddsError>;
