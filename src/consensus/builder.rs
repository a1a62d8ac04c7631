//! Sharp consensus over per-source fair probabilities.
//!
//! Each side's consensus is the arithmetic mean of the contributing
//! sources, taken independently per side, then the pair is re-normalized
//! to sum to exactly one.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::ConsensusError;
use crate::market::{MarketInstance, Side};
use crate::pricing::FairLine;

/// Consensus fair probability for one market instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    /// Instance the consensus was built for.
    pub instance: MarketInstance,
    /// Probability per side, summing to one.
    pub probabilities: BTreeMap<Side, f64>,
    /// Sources that contributed, sorted.
    pub sources: Vec<String>,
    /// Contributing sources that were single-sided.
    pub ungigged_sources: Vec<String>,
}

impl ConsensusResult {
    /// Consensus probability for a side.
    pub fn probability(&self, side: Side) -> Option<f64> {
        self.probabilities.get(&side).copied()
    }

    /// Whether any contributing source still carried vig.
    pub fn has_ungigged(&self) -> bool {
        !self.ungigged_sources.is_empty()
    }
}

/// Build the consensus for one instance from per-source fair lines.
///
/// Lines are sorted by source before averaging, so the result does not
/// depend on input order. Fails when there are no lines, or when either
/// side has no contribution at all.
#[instrument(skip(instance, lines), fields(instance = %instance, sources = lines.len()))]
pub fn build_consensus(
    instance: &MarketInstance,
    lines: &[FairLine],
) -> Result<ConsensusResult, ConsensusError> {
    let no_consensus = |reason: &str| ConsensusError::NoConsensusAvailable {
        instance: instance.to_string(),
        reason: reason.to_string(),
    };

    if lines.is_empty() {
        return Err(no_consensus("no sharp source has data"));
    }

    let mut sorted: Vec<&FairLine> = lines.iter().collect();
    sorted.sort_by(|a, b| a.source.cmp(&b.source));

    let [a, b] = instance.market.sides();
    let mean_a = side_mean(&sorted, a).ok_or_else(|| no_consensus(&format!("no sharp price for {a}")))?;
    let mean_b = side_mean(&sorted, b).ok_or_else(|| no_consensus(&format!("no sharp price for {b}")))?;

    let total = mean_a + mean_b;
    if total.is_nan() || total <= 0.0 {
        return Err(no_consensus("sharp probabilities sum to zero"));
    }

    let sources: Vec<String> = sorted.iter().map(|l| l.source.clone()).collect();
    let ungigged_sources: Vec<String> = sorted
        .iter()
        .filter(|l| l.ungigged)
        .map(|l| l.source.clone())
        .collect();

    debug!(
        side_a = %a,
        probability_a = mean_a / total,
        side_b = %b,
        probability_b = mean_b / total,
        "Consensus built"
    );

    Ok(ConsensusResult {
        instance: instance.clone(),
        probabilities: BTreeMap::from([(a, mean_a / total), (b, mean_b / total)]),
        sources,
        ungigged_sources,
    })
}

/// Mean of the available probabilities for one side.
fn side_mean(lines: &[&FairLine], side: Side) -> Option<f64> {
    let values: Vec<f64> = lines
        .iter()
        .filter_map(|l| l.probabilities.get(&side).copied())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketKind;
    use rust_decimal_macros::dec;

    fn instance() -> MarketInstance {
        MarketInstance {
            event_id: "evt-1".to_string(),
            market: MarketKind::Spread,
            line: Some(dec!(-3.5)),
        }
    }

    fn line(source: &str, away: Option<f64>, home: Option<f64>, ungigged: bool) -> FairLine {
        let mut probabilities = BTreeMap::new();
        if let Some(p) = away {
            probabilities.insert(Side::Away, p);
        }
        if let Some(p) = home {
            probabilities.insert(Side::Home, p);
        }
        FairLine {
            source: source.to_string(),
            probabilities,
            overround: None,
            ungigged,
        }
    }

    #[test]
    fn consensus_averages_and_normalizes() {
        let lines = vec![
            line("pinnacle", Some(0.48), Some(0.52), false),
            line("circasports", Some(0.50), Some(0.50), false),
        ];

        let consensus = build_consensus(&instance(), &lines).unwrap();

        assert!((consensus.probability(Side::Away).unwrap() - 0.49).abs() < 1e-12);
        assert!((consensus.probability(Side::Home).unwrap() - 0.51).abs() < 1e-12);
        assert_eq!(consensus.sources, vec!["circasports", "pinnacle"]);
        assert!(!consensus.has_ungigged());
    }

    #[test]
    fn consensus_is_order_independent() {
        let mut lines = vec![
            line("pinnacle", Some(0.4812), Some(0.5188), false),
            line("bookmaker", Some(0.4731), Some(0.5269), false),
            line("circasports", Some(0.4902), None, true),
        ];
        let forward = build_consensus(&instance(), &lines).unwrap();

        lines.reverse();
        let reversed = build_consensus(&instance(), &lines).unwrap();
        lines.swap(0, 1);
        let shuffled = build_consensus(&instance(), &lines).unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn single_source_degenerates_to_that_source() {
        let lines = vec![line("pinnacle", Some(0.45), Some(0.55), false)];

        let consensus = build_consensus(&instance(), &lines).unwrap();

        assert!((consensus.probability(Side::Away).unwrap() - 0.45).abs() < 1e-12);
        assert!((consensus.probability(Side::Home).unwrap() - 0.55).abs() < 1e-12);
    }

    #[test]
    fn ungigged_sources_are_reported_and_renormalized() {
        let lines = vec![
            line("pinnacle", Some(0.5), Some(0.5), false),
            line("bookmaker", None, Some(0.54), true),
        ];

        let consensus = build_consensus(&instance(), &lines).unwrap();

        assert_eq!(consensus.ungigged_sources, vec!["bookmaker"]);
        let total: f64 = consensus.probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_lines_is_no_consensus() {
        let err = build_consensus(&instance(), &[]).unwrap_err();
        assert!(matches!(err, ConsensusError::NoConsensusAvailable { .. }));
    }

    #[test]
    fn missing_side_is_no_consensus() {
        let lines = vec![line("pinnacle", None, Some(0.55), true)];
        let err = build_consensus(&instance(), &lines).unwrap_err();
        assert!(err.to_string().contains("no sharp price for away"));
    }
}
