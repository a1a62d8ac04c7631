//! Evaluation report types.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::ev::EvResult;
use crate::market::{AmericanOdds, MarketInstance, MarketKind, Side};
use crate::pricing::FairLine;

/// A raw quote that could not be normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedQuote {
    /// Position in the input batch.
    pub index: usize,
    /// Source as supplied.
    pub source: String,
    /// Label as supplied.
    pub label: String,
    /// Odds as supplied.
    pub odds: String,
    /// Why the quote was skipped.
    pub reason: String,
}

/// Why a valid quote did not contribute to a consensus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Source is neither sharp nor the user.
    NotSharp,
    /// Source quoted a different point than the instance being evaluated.
    PointMismatch {
        /// Line of the evaluated instance.
        evaluated_line: Option<Decimal>,
    },
    /// Quote is older than the staleness bound.
    Stale {
        /// Age at evaluation time.
        age_secs: i64,
    },
    /// A more recent quote from the same source replaced it.
    Superseded,
    /// Source's line failed vig removal.
    InvalidMarket {
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::NotSharp => write!(f, "not a sharp source"),
            ExclusionReason::PointMismatch {
                evaluated_line: Some(line),
            } => write!(f, "point differs from evaluated line {}", line),
            ExclusionReason::PointMismatch { evaluated_line: None } => {
                write!(f, "point differs from evaluated line")
            }
            ExclusionReason::Stale { age_secs } => write!(f, "stale ({}s old)", age_secs),
            ExclusionReason::Superseded => write!(f, "superseded by a newer quote"),
            ExclusionReason::InvalidMarket { reason } => write!(f, "invalid market: {}", reason),
        }
    }
}

/// A valid quote left out of a consensus, with its reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    /// Book identifier.
    pub source: String,
    /// Market type.
    pub market: MarketKind,
    /// Side, when the exclusion concerns one quote.
    pub selection: Option<Side>,
    /// Canonical line of the excluded quote(s).
    pub line: Option<Decimal>,
    /// Why it was left out.
    pub reason: ExclusionReason,
}

/// Result for one user quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    /// EV and stake computed.
    Evaluated(EvResult),
    /// No fair-probability anchor for the quote's instance.
    NoConsensus {
        /// Source of the user quote.
        source: String,
        /// Side being priced.
        selection: Side,
        /// Label as supplied.
        label: String,
        /// User's price.
        american_odds: AmericanOdds,
        /// User's point.
        point: Option<Decimal>,
        /// Instance that had no consensus.
        instance: MarketInstance,
        /// Why no consensus was available.
        reason: String,
        /// Sharp sources left out for quoting a different point.
        excluded_point_mismatch: Vec<String>,
    },
}

impl EvaluationOutcome {
    /// EV result, if one was computed.
    pub fn ev(&self) -> Option<&EvResult> {
        match self {
            EvaluationOutcome::Evaluated(result) => Some(result),
            EvaluationOutcome::NoConsensus { .. } => None,
        }
    }

    /// Label of the user quote.
    pub fn label(&self) -> &str {
        match self {
            EvaluationOutcome::Evaluated(result) => &result.label,
            EvaluationOutcome::NoConsensus { label, .. } => label,
        }
    }
}

/// Per-source fair lines behind one instance's consensus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceFairLines {
    /// Instance the lines were priced at.
    pub instance: MarketInstance,
    /// One entry per sharp source, with its overround.
    pub lines: Vec<FairLine>,
}

/// Everything produced by evaluating one event's quotes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Event identifier.
    pub event_id: String,
    /// Evaluation time.
    #[serde(with = "time::serde::rfc3339")]
    pub as_of: OffsetDateTime,
    /// One entry per user quote, in input order.
    pub results: Vec<EvaluationOutcome>,
    /// Raw quotes that failed normalization.
    pub skipped: Vec<SkippedQuote>,
    /// Valid quotes left out of consensus.
    pub exclusions: Vec<Exclusion>,
    /// Sharp fair lines per evaluated instance.
    pub fair_lines: Vec<InstanceFairLines>,
}

impl EvaluationReport {
    /// Evaluated rows ordered by EV, best first.
    pub fn ranked(&self) -> Vec<&EvResult> {
        let mut rows: Vec<&EvResult> = self.results.iter().filter_map(|r| r.ev()).collect();
        rows.sort_by(|a, b| {
            b.expected_value_per_unit_stake
                .partial_cmp(&a.expected_value_per_unit_stake)
                .unwrap_or(Ordering::Equal)
        });
        rows
    }

    /// Evaluated rows with positive EV, in input order.
    pub fn positive_ev(&self) -> Vec<&EvResult> {
        self.results
            .iter()
            .filter_map(|r| r.ev())
            .filter(|r| r.is_positive_ev())
            .collect()
    }

    /// Number of user quotes without a consensus.
    pub fn no_consensus_count(&self) -> usize {
        self.results.iter().filter(|r| r.ev().is_none()).count()
    }
}
