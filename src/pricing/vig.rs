//! Vig removal for two-way markets.
//!
//! Multiplicative normalization: with implied probabilities `p_a`, `p_b`
//! and `S = p_a + p_b`, the fair pair is `(p_a / S, p_b / S)`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::convert::check_probability;
use crate::error::PricingError;
use crate::market::{AmericanOdds, MarketKind, Side};

/// Remove the vig from a pair of implied probabilities.
///
/// # Examples
/// ```
/// use odds_ev::pricing::devig;
/// let (a, b) = devig(0.5238, 0.5238).unwrap();
/// assert!((a - 0.5).abs() < 1e-9 && (b - 0.5).abs() < 1e-9);
/// ```
pub fn devig(p_a: f64, p_b: f64) -> Result<(f64, f64), PricingError> {
    for p in [p_a, p_b] {
        if check_probability(p).is_err() {
            return Err(PricingError::InvalidMarket {
                reason: format!("implied probability {p} outside (0, 1)"),
            });
        }
    }

    let total = p_a + p_b;
    if total <= 0.0 {
        return Err(PricingError::InvalidMarket {
            reason: format!("implied probabilities sum to {total}"),
        });
    }

    Ok((p_a / total, p_b / total))
}

/// Overround of a two-way price pair (`S - 1`).
pub fn overround(p_a: f64, p_b: f64) -> f64 {
    p_a + p_b - 1.0
}

/// Prices quoted by one source for one market instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// Book identifier.
    pub source: String,
    /// Market type.
    pub market: MarketKind,
    /// Price per side. At most the two sides of `market`.
    pub prices: BTreeMap<Side, AmericanOdds>,
}

impl SourceLine {
    /// Create an empty line for a source.
    pub fn new(source: impl Into<String>, market: MarketKind) -> Self {
        Self {
            source: source.into(),
            market,
            prices: BTreeMap::new(),
        }
    }

    /// Builder-style price insertion.
    pub fn with_price(mut self, side: Side, odds: AmericanOdds) -> Self {
        self.prices.insert(side, odds);
        self
    }

    /// Whether both sides are priced.
    pub fn is_two_sided(&self) -> bool {
        self.market.sides().iter().all(|s| self.prices.contains_key(s))
    }
}

/// Fair probabilities recovered from one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairLine {
    /// Book identifier.
    pub source: String,
    /// Probability per side.
    pub probabilities: BTreeMap<Side, f64>,
    /// Book margin, when both sides were priced.
    pub overround: Option<f64>,
    /// Single-sided quote passed through with its vig still in.
    pub ungigged: bool,
}

/// Recover fair probabilities from one source's line.
///
/// Two-sided lines are devigged. A single-sided line cannot be devigged, so
/// its implied probability is passed through unmodified and flagged.
pub fn fair_line(line: &SourceLine) -> Result<FairLine, PricingError> {
    let [a, b] = line.market.sides();

    match (line.prices.get(&a), line.prices.get(&b)) {
        (Some(odds_a), Some(odds_b)) => {
            let p_a = odds_a.implied_probability();
            let p_b = odds_b.implied_probability();
            let (fair_a, fair_b) = devig(p_a, p_b)?;

            Ok(FairLine {
                source: line.source.clone(),
                probabilities: BTreeMap::from([(a, fair_a), (b, fair_b)]),
                overround: Some(overround(p_a, p_b)),
                ungigged: false,
            })
        }
        (Some(odds), None) | (None, Some(odds)) => {
            let side = if line.prices.contains_key(&a) { a } else { b };
            debug!(source = %line.source, side = %side, "Single-sided line passed through with vig");

            Ok(FairLine {
                source: line.source.clone(),
                probabilities: BTreeMap::from([(side, odds.implied_probability())]),
                overround: None,
                ungigged: true,
            })
        }
        (None, None) => Err(PricingError::InvalidMarket {
            reason: format!("{} has no {} prices", line.source, line.market),
        }),
    }
}
