//! Expected value and stake sizing for a user's quote.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use super::kelly::{calculate_optimal_stake, clamped_kelly_fraction, expected_value};
use crate::config::EvaluationConfig;
use crate::consensus::ConsensusResult;
use crate::error::{ConsensusError, Result};
use crate::market::{AmericanOdds, MarketInstance, Quote, Side};
use crate::pricing::probability_to_american;

/// EV and Kelly sizing for one user quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvResult {
    /// Source of the evaluated quote.
    pub source: String,
    /// Side being priced.
    pub selection: Side,
    /// Label as supplied.
    pub label: String,
    /// User's price.
    pub american_odds: AmericanOdds,
    /// User's point.
    pub point: Option<Decimal>,
    /// Instance the quote was compared within.
    pub instance: MarketInstance,
    /// Probability implied by the user's price (vig included).
    pub implied_probability: f64,
    /// Consensus fair probability for the side.
    pub fair_probability: f64,
    /// Fair price for the side, rounded.
    pub fair_american_odds: i32,
    /// Profit per unit stake if the bet wins.
    pub payout_multiplier: f64,
    /// `p*b - (1 - p)`.
    pub expected_value_per_unit_stake: f64,
    /// EV per unit times the configured stake.
    pub expected_profit: Decimal,
    /// EV as a percentage of stake.
    pub edge_percent: f64,
    /// Full Kelly fraction, clamped to [0, 1].
    pub kelly_full: f64,
    /// Fraction of bankroll after the Kelly multiplier.
    pub recommended_fraction: f64,
    /// Recommended stake in bankroll units.
    pub recommended_stake: Decimal,
    /// Sharp sources behind the consensus.
    pub consensus_sources: Vec<String>,
    /// Consensus sources that were single-sided.
    pub ungigged_sources: Vec<String>,
    /// Sharp sources left out for quoting a different point.
    pub excluded_point_mismatch: Vec<String>,
}

impl EvResult {
    /// Check if the line pays more than the fair probability justifies.
    pub fn is_positive_ev(&self) -> bool {
        self.expected_value_per_unit_stake > 0.0
    }

    /// Whether the consensus relied on a single-sided source.
    pub fn is_ungigged(&self) -> bool {
        !self.ungigged_sources.is_empty()
    }
}

/// Calculate EV and recommended stake for a user quote against a consensus.
#[instrument(skip_all, fields(source = %quote.source, selection = %quote.selection, odds = %quote.american_odds))]
pub fn calculate_ev(
    quote: &Quote,
    consensus: &ConsensusResult,
    config: &EvaluationConfig,
) -> Result<EvResult> {
    let probability = consensus.probability(quote.selection).ok_or_else(|| {
        ConsensusError::NoConsensusAvailable {
            instance: consensus.instance.to_string(),
            reason: format!("consensus has no probability for {}", quote.selection),
        }
    })?;

    let fair_american_odds = probability_to_american(probability)?;
    let payout = quote.american_odds.payout_multiplier();

    let ev = expected_value(probability, payout);
    let kelly = clamped_kelly_fraction(probability, payout);
    let recommended_fraction = kelly * config.kelly_fraction;
    let recommended_stake = calculate_optimal_stake(config.bankroll, config.kelly_fraction, kelly);
    let expected_profit = config.stake * Decimal::from_f64(ev).unwrap_or(Decimal::ZERO);

    debug!(
        fair_probability = probability,
        ev,
        kelly,
        recommended_stake = %recommended_stake,
        "EV calculated"
    );

    Ok(EvResult {
        source: quote.source.clone(),
        selection: quote.selection,
        label: quote.label.clone(),
        american_odds: quote.american_odds,
        point: quote.point,
        instance: consensus.instance.clone(),
        implied_probability: quote.american_odds.implied_probability(),
        fair_probability: probability,
        fair_american_odds,
        payout_multiplier: payout,
        expected_value_per_unit_stake: ev,
        expected_profit,
        edge_percent: ev * 100.0,
        kelly_full: kelly,
        recommended_fraction,
        recommended_stake,
        consensus_sources: consensus.sources.clone(),
        ungigged_sources: consensus.ungigged_sources.clone(),
        excluded_point_mismatch: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketKind;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use time::OffsetDateTime;

    fn consensus(away: f64) -> ConsensusResult {
        ConsensusResult {
            instance: MarketInstance {
                event_id: "evt-1".to_string(),
                market: MarketKind::Moneyline,
                line: None,
            },
            probabilities: BTreeMap::from([(Side::Away, away), (Side::Home, 1.0 - away)]),
            sources: vec!["pinnacle".to_string()],
            ungigged_sources: vec![],
        }
    }

    fn quote(selection: Side, odds: i64) -> Quote {
        Quote {
            source: "user".to_string(),
            market: MarketKind::Moneyline,
            selection,
            label: selection.to_string(),
            american_odds: AmericanOdds::new(odds).unwrap(),
            point: None,
            observed_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn config() -> EvaluationConfig {
        EvaluationConfig {
            kelly_fraction: 0.5,
            bankroll: dec!(1000),
            stake: dec!(100),
            ..EvaluationConfig::default()
        }
    }

    #[test]
    fn plus_120_at_fair_48_percent_is_positive() {
        let result = calculate_ev(&quote(Side::Away, 120), &consensus(0.48), &config()).unwrap();

        assert!((result.payout_multiplier - 1.2).abs() < 1e-12);
        assert!((result.expected_value_per_unit_stake - 0.056).abs() < 1e-12);
        assert!((result.edge_percent - 5.6).abs() < 1e-9);
        assert!(result.is_positive_ev());
        assert!(result.recommended_stake > Decimal::ZERO);
        assert!((result.expected_profit - dec!(5.6)).abs() < dec!(0.0001));
        // f* = 0.056 / 1.2, half Kelly on 1000
        let expected = 1000.0 * 0.5 * 0.056 / 1.2;
        let stake = result.recommended_stake.to_f64().unwrap();
        assert!((stake - expected).abs() < 1e-6);
        assert_eq!(result.fair_american_odds, 108);
    }

    #[test]
    fn stake_is_positive_exactly_when_ev_is() {
        for odds in [-320, -135, -110, 100, 105, 240, 400] {
            for step in 1..20 {
                let p = f64::from(step) / 20.0;
                let quote = quote(Side::Away, odds);
                let b = quote.american_odds.payout_multiplier();

                let result = calculate_ev(&quote, &consensus(p), &config()).unwrap();

                assert_eq!(
                    result.recommended_stake > Decimal::ZERO,
                    b * p > 1.0 - p,
                    "odds {} at p {}",
                    odds,
                    p
                );
                assert_eq!(result.is_positive_ev(), b * p > 1.0 - p);
            }
        }
    }

    #[test]
    fn negative_ev_recommends_nothing() {
        let result = calculate_ev(&quote(Side::Home, -150), &consensus(0.48), &config()).unwrap();

        assert!(!result.is_positive_ev());
        assert_eq!(result.kelly_full, 0.0);
        assert_eq!(result.recommended_stake, Decimal::ZERO);
        assert!(result.expected_profit < Decimal::ZERO);
    }

    #[test]
    fn stake_never_exceeds_kelly_cap() {
        let config = config();
        let cap = config.bankroll * Decimal::from_f64(config.kelly_fraction).unwrap();

        for (odds, p) in [(1000, 0.9), (150, 0.7), (-300, 0.95), (500, 0.2)] {
            let result = calculate_ev(&quote(Side::Away, odds), &consensus(p), &config).unwrap();
            assert!(result.recommended_stake <= cap, "odds={odds} p={p}");
        }
    }

    #[test]
    fn missing_side_in_consensus_is_an_error() {
        let mut consensus = consensus(0.5);
        consensus.probabilities.remove(&Side::Home);

        assert!(calculate_ev(&quote(Side::Home, 110), &consensus, &config()).is_err());
    }
}
