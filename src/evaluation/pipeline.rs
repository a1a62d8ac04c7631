//! Batch evaluation of one event's quotes.
//!
//! Raw tuples flow through normalization, vig removal, consensus and EV in
//! that order. Failures stay scoped: a malformed tuple skips only itself and
//! a missing consensus affects only the quotes of that market instance.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use super::report::{
    EvaluationOutcome, EvaluationReport, Exclusion, ExclusionReason, InstanceFairLines, SkippedQuote,
};
use crate::config::EvaluationConfig;
use crate::consensus::{build_consensus, ConsensusResult};
use crate::ev::calculate_ev;
use crate::market::{normalize_quote, EventContext, MarketInstance, MarketKind, Quote, RawQuote, Side};
use crate::metrics;
use crate::pricing::{fair_line, FairLine, SourceLine};

/// Sharp quotes grouped by instance, then by lowercase source.
type SharpBook = BTreeMap<MarketInstance, BTreeMap<String, SourceLine>>;

/// Evaluate every user quote of an event against the sharp consensus.
#[instrument(skip_all, fields(event = %event.event_id, quotes = raw.len()))]
pub fn evaluate_event(
    event: &EventContext,
    raw: &[RawQuote],
    config: &EvaluationConfig,
    as_of: OffsetDateTime,
) -> EvaluationReport {
    let start = Instant::now();
    metrics::inc_evaluations();

    let mut skipped = Vec::new();
    let mut exclusions = Vec::new();
    let mut user_quotes = Vec::new();
    let mut sharp_quotes = Vec::new();

    for (index, raw_quote) in raw.iter().enumerate() {
        let quote = match normalize_quote(raw_quote, event, as_of) {
            Ok(quote) => quote,
            Err(e) => {
                warn!(index, source = %raw_quote.source, label = %raw_quote.label, error = %e, "Skipping malformed quote");
                skipped.push(SkippedQuote {
                    index,
                    source: raw_quote.source.clone(),
                    label: raw_quote.label.clone(),
                    odds: raw_quote.odds.to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if config.is_user(&quote.source) {
            user_quotes.push(quote);
        } else if config.is_sharp(&quote.source) {
            sharp_quotes.push(quote);
        } else {
            debug!(source = %quote.source, "Ignoring quote from non-sharp source");
            exclusions.push(exclusion(&quote, ExclusionReason::NotSharp));
        }
    }

    let sharp_quotes = drop_stale(sharp_quotes, config, as_of, &mut exclusions);
    let sharp_quotes = keep_latest(sharp_quotes, &mut exclusions);
    let book = group_by_instance(&event.event_id, &sharp_quotes);

    let mut consensus_cache: HashMap<MarketInstance, (Result<ConsensusResult, String>, Vec<String>)> =
        HashMap::new();
    let mut fair_lines = Vec::new();
    let mut results = Vec::with_capacity(user_quotes.len());

    for quote in &user_quotes {
        let instance = quote.instance(&event.event_id);

        if !consensus_cache.contains_key(&instance) {
            let mismatched = point_mismatches(&instance, &book, &mut exclusions);
            let (lines, consensus) = instance_consensus(&instance, &book, &mut exclusions);
            fair_lines.push(InstanceFairLines {
                instance: instance.clone(),
                lines,
            });
            consensus_cache.insert(instance.clone(), (consensus, mismatched));
        }
        let (consensus, mismatched) = &consensus_cache[&instance];

        let outcome = consensus
            .as_ref()
            .map_err(|reason| reason.clone())
            .and_then(|c| calculate_ev(quote, c, config).map_err(|e| e.to_string()));

        results.push(match outcome {
            Ok(mut result) => {
                result.excluded_point_mismatch = mismatched.clone();
                EvaluationOutcome::Evaluated(result)
            }
            Err(reason) => {
                warn!(instance = %instance, label = %quote.label, reason = %reason, "No consensus for quote");
                EvaluationOutcome::NoConsensus {
                    source: quote.source.clone(),
                    selection: quote.selection,
                    label: quote.label.clone(),
                    american_odds: quote.american_odds,
                    point: quote.point,
                    instance,
                    reason,
                    excluded_point_mismatch: mismatched.clone(),
                }
            }
        });
    }

    let report = EvaluationReport {
        event_id: event.event_id.clone(),
        as_of,
        results,
        skipped,
        exclusions,
        fair_lines,
    };

    let positive = report.positive_ev().len();
    metrics::add_quotes_skipped(report.skipped.len() as u64);
    metrics::add_positive_ev_results(positive as u64);
    metrics::add_no_consensus(report.no_consensus_count() as u64);
    metrics::record_evaluation_latency(start);

    info!(
        evaluated = report.results.len() - report.no_consensus_count(),
        positive_ev = positive,
        no_consensus = report.no_consensus_count(),
        skipped = report.skipped.len(),
        excluded = report.exclusions.len(),
        "Evaluation complete"
    );

    report
}

fn exclusion(quote: &Quote, reason: ExclusionReason) -> Exclusion {
    Exclusion {
        source: quote.source.clone(),
        market: quote.market,
        selection: Some(quote.selection),
        line: quote.line(),
        reason,
    }
}

/// Drop sharp quotes older than the configured bound.
fn drop_stale(
    quotes: Vec<Quote>,
    config: &EvaluationConfig,
    as_of: OffsetDateTime,
    exclusions: &mut Vec<Exclusion>,
) -> Vec<Quote> {
    let Some(max_age) = config.max_quote_age_secs else {
        return quotes;
    };

    quotes
        .into_iter()
        .filter(|quote| {
            let age_secs = (as_of - quote.observed_at).whole_seconds();
            if age_secs > max_age as i64 {
                debug!(source = %quote.source, age_secs, "Dropping stale quote");
                exclusions.push(exclusion(quote, ExclusionReason::Stale { age_secs }));
                false
            } else {
                true
            }
        })
        .collect()
}

/// Keep the most recent quote per source, market, line and side.
///
/// Ties on capture time go to the higher price so the choice does not
/// depend on input order.
fn keep_latest(quotes: Vec<Quote>, exclusions: &mut Vec<Exclusion>) -> Vec<Quote> {
    type Key = (String, MarketKind, Option<rust_decimal::Decimal>, Side);
    let mut latest: BTreeMap<Key, Quote> = BTreeMap::new();

    for quote in quotes {
        let key = (
            quote.source.to_lowercase(),
            quote.market,
            quote.line(),
            quote.selection,
        );
        match latest.remove(&key) {
            Some(existing)
                if (existing.observed_at, existing.american_odds.value())
                    >= (quote.observed_at, quote.american_odds.value()) =>
            {
                exclusions.push(exclusion(&quote, ExclusionReason::Superseded));
                latest.insert(key, existing);
            }
            Some(existing) => {
                exclusions.push(exclusion(&existing, ExclusionReason::Superseded));
                latest.insert(key, quote);
            }
            None => {
                latest.insert(key, quote);
            }
        }
    }

    latest.into_values().collect()
}

fn group_by_instance(event_id: &str, quotes: &[Quote]) -> SharpBook {
    let mut book = SharpBook::new();

    for quote in quotes {
        book.entry(quote.instance(event_id))
            .or_default()
            .entry(quote.source.to_lowercase())
            .or_insert_with(|| SourceLine::new(quote.source.clone(), quote.market))
            .prices
            .insert(quote.selection, quote.american_odds);
    }

    book
}

/// Sharp sources quoting the instance's market only at other lines.
fn point_mismatches(
    instance: &MarketInstance,
    book: &SharpBook,
    exclusions: &mut Vec<Exclusion>,
) -> Vec<String> {
    let present: BTreeSet<&String> = book
        .get(instance)
        .map(|lines| lines.keys().collect())
        .unwrap_or_default();

    let mut mismatched = BTreeSet::new();
    for (other, lines) in book {
        if other.market != instance.market || other.line == instance.line {
            continue;
        }
        for (key, line) in lines {
            exclusions.push(Exclusion {
                source: line.source.clone(),
                market: other.market,
                selection: None,
                line: other.line,
                reason: ExclusionReason::PointMismatch {
                    evaluated_line: instance.line,
                },
            });
            if !present.contains(key) {
                mismatched.insert(line.source.clone());
            }
        }
    }

    mismatched.into_iter().collect()
}

/// Devig every sharp line at the instance and build its consensus.
fn instance_consensus(
    instance: &MarketInstance,
    book: &SharpBook,
    exclusions: &mut Vec<Exclusion>,
) -> (Vec<FairLine>, Result<ConsensusResult, String>) {
    let mut fair: Vec<FairLine> = Vec::new();

    for line in book.get(instance).into_iter().flat_map(|lines| lines.values()) {
        match fair_line(line) {
            Ok(fair_line) => fair.push(fair_line),
            Err(e) => {
                warn!(source = %line.source, error = %e, "Excluding sharp line");
                exclusions.push(Exclusion {
                    source: line.source.clone(),
                    market: instance.market,
                    selection: None,
                    line: instance.line,
                    reason: ExclusionReason::InvalidMarket {
                        reason: e.to_string(),
                    },
                });
            }
        }
    }

    let consensus = build_consensus(instance, &fair).map_err(|e| e.to_string());
    (fair, consensus)
}
