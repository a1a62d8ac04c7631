//! End-to-end tests of the evaluation pipeline.
//!
//! The live feed test requires THE_ODDS_API_KEY.
//! Run with: cargo test --test integration -- --ignored

use pretty_assertions::assert_eq;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use time::macros::datetime;
use time::OffsetDateTime;

use odds_ev::config::{Config, EvaluationConfig};
use odds_ev::evaluation::{evaluate_event, EvaluationOutcome, ExclusionReason};
use odds_ev::feed::OddsApiClient;
use odds_ev::ingest::{QuoteExtractor, TextExtractor, UploadFormat};
use odds_ev::market::{EventContext, MarketKind, RawQuote, Side};

fn event() -> EventContext {
    EventContext::new("nyg-dal", "Dallas Cowboys", "New York Giants")
}

fn as_of() -> OffsetDateTime {
    datetime!(2024-09-08 20:00 UTC)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn even_sharp_line_prices_user_plus_120() {
    let quotes = vec![
        RawQuote::new("user", "moneyline", "Giants", "+120", None),
        RawQuote::new("pinnacle", "h2h", "New York Giants", -110, None),
        RawQuote::new("pinnacle", "h2h", "Dallas Cowboys", -110, None),
    ];

    let report = evaluate_event(&event(), &quotes, &EvaluationConfig::default(), as_of());

    assert_eq!(report.results.len(), 1);
    let ev = report.results[0].ev().unwrap();
    assert_eq!(ev.selection, Side::Away);
    assert!(close(ev.fair_probability, 0.5));
    assert_eq!(ev.fair_american_odds, -100);
    assert!(close(ev.expected_value_per_unit_stake, 0.1));
    assert!(close(ev.kelly_full, 0.1 / 1.2));
    // half Kelly on a 1000 bankroll
    let stake = ev.recommended_stake.to_f64().unwrap();
    assert!((stake - 1000.0 * 0.5 * 0.1 / 1.2).abs() < 1e-6);
    assert_eq!(ev.expected_profit.round_dp(6), dec!(10));
}

#[test]
fn consensus_averages_books_and_flags_single_sided_ones() {
    let quotes = vec![
        RawQuote::new("user", "h2h", "Cowboys", -105, None),
        RawQuote::new("pinnacle", "h2h", "Giants", -110, None),
        RawQuote::new("pinnacle", "h2h", "Cowboys", -110, None),
        RawQuote::new("circasports", "h2h", "Giants", 100, None),
    ];

    let report = evaluate_event(&event(), &quotes, &EvaluationConfig::default(), as_of());

    let ev = report.results[0].ev().unwrap();
    assert_eq!(ev.consensus_sources, vec!["circasports", "pinnacle"]);
    assert_eq!(ev.ungigged_sources, vec!["circasports"]);
    assert!(close(ev.fair_probability, 0.5));
    assert!(!ev.is_positive_ev());
    assert_eq!(ev.recommended_stake, rust_decimal::Decimal::ZERO);
}

#[test]
fn missing_consensus_only_affects_its_instance() {
    let quotes = vec![
        RawQuote::new("user", "h2h", "Giants", 140, None),
        RawQuote::new("user", "totals", "Over", -105, Some(dec!(44.5))),
        RawQuote::new("pinnacle", "h2h", "Giants", 130, None),
        RawQuote::new("pinnacle", "h2h", "Cowboys", -150, None),
    ];

    let report = evaluate_event(&event(), &quotes, &EvaluationConfig::default(), as_of());

    assert_eq!(report.results.len(), 2);
    assert!(report.results[0].ev().unwrap().is_positive_ev());
    match &report.results[1] {
        EvaluationOutcome::NoConsensus { instance, reason, .. } => {
            assert_eq!(instance.market, MarketKind::Total);
            assert_eq!(instance.line, Some(dec!(44.5)));
            assert!(reason.contains("no sharp source has data"));
        }
        other => panic!("expected no consensus, got {:?}", other),
    }
}

#[test]
fn malformed_rows_are_skipped_and_reported() {
    let quotes = vec![
        RawQuote::new("user", "h2h", "Giants", 120, None),
        RawQuote::new("user", "h2h", "Giants", 50, None),
        RawQuote::new("user", "spreads", "Giants", -110, None),
        RawQuote::new("user", "h2h", "Eagles", 110, None),
        RawQuote::new("user", "h2h", "Giants", 120, Some(dec!(3))),
        RawQuote::new("user", "parlay", "Giants", 600, None),
        RawQuote::new("pinnacle", "h2h", "Giants", -110, None),
        RawQuote::new("pinnacle", "h2h", "Cowboys", -110, None),
    ];

    let report = evaluate_event(&event(), &quotes, &EvaluationConfig::default(), as_of());

    let skipped: Vec<usize> = report.skipped.iter().map(|s| s.index).collect();
    assert_eq!(skipped, vec![1, 2, 3, 4, 5]);
    assert!(report.skipped[0].reason.contains("out of range"));
    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].ev().is_some());
}

#[test]
fn spread_consensus_uses_only_matching_points() {
    let quotes = vec![
        RawQuote::new("user", "spreads", "Giants", 100, Some(dec!(6.5))),
        RawQuote::new("pinnacle", "spreads", "Giants", -105, Some(dec!(6.5))),
        RawQuote::new("pinnacle", "spreads", "Cowboys", -115, Some(dec!(-6.5))),
        RawQuote::new("bookmaker", "spreads", "Giants", -110, Some(dec!(7))),
        RawQuote::new("bookmaker", "spreads", "Cowboys", -110, Some(dec!(-7))),
    ];

    let report = evaluate_event(&event(), &quotes, &EvaluationConfig::default(), as_of());

    let ev = report.results[0].ev().unwrap();
    assert_eq!(ev.consensus_sources, vec!["pinnacle"]);
    assert_eq!(ev.excluded_point_mismatch, vec!["bookmaker"]);
    assert_eq!(ev.instance.line, Some(dec!(-6.5)));

    let mismatches: Vec<_> = report
        .exclusions
        .iter()
        .filter(|e| matches!(e.reason, ExclusionReason::PointMismatch { .. }))
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].line, Some(dec!(-7)));
}

#[test]
fn results_do_not_depend_on_input_order() {
    let quotes = vec![
        RawQuote::new("user", "h2h", "Giants", 125, None),
        RawQuote::new("pinnacle", "h2h", "Giants", 112, None),
        RawQuote::new("pinnacle", "h2h", "Cowboys", -124, None),
        RawQuote::new("bookmaker", "h2h", "Giants", 115, None),
        RawQuote::new("bookmaker", "h2h", "Cowboys", -135, None),
        RawQuote::new("circasports", "h2h", "Giants", 110, None),
        RawQuote::new("circasports", "h2h", "Cowboys", -130, None),
    ];
    let mut reversed = quotes.clone();
    reversed.reverse();

    let config = EvaluationConfig::default();
    let forward = evaluate_event(&event(), &quotes, &config, as_of());
    let backward = evaluate_event(&event(), &reversed, &config, as_of());

    assert_eq!(forward.results, backward.results);
    let ev = forward.results[0].ev().unwrap();
    assert_eq!(ev.consensus_sources.len(), 3);
    assert!(ev.fair_probability > 0.45 && ev.fair_probability < 0.48);
}

#[test]
fn ocr_upload_runs_through_the_pipeline() {
    let upload = "New York Giants +135\nDallas Cowboys -160\n";
    let user: Vec<RawQuote> = TextExtractor
        .extract_quote_tuples(upload)
        .unwrap()
        .into_iter()
        .map(|line| line.into_raw("user", "h2h", as_of()))
        .collect();

    let mut quotes = user;
    quotes.push(RawQuote::new("pinnacle", "h2h", "Giants", 130, None));
    quotes.push(RawQuote::new("pinnacle", "h2h", "Cowboys", -150, None));

    let report = evaluate_event(&event(), &quotes, &EvaluationConfig::default(), as_of());

    assert_eq!(report.results.len(), 2);
    assert!(report.skipped.is_empty());
    let ranked = report.ranked();
    assert_eq!(ranked[0].label, "New York Giants");
    assert!(ranked[0].expected_value_per_unit_stake > ranked[1].expected_value_per_unit_stake);
}

#[test]
fn json_upload_with_overrides_runs_through_the_pipeline() {
    let upload = r#"{"lines": [
        {"team": "Giants", "odds": "+7.0e0", "point": 3},
        {"team": "Giants", "odds": 105, "point": "+3", "market": "spreads"},
        {"source": "pinnacle", "team": "Giants", "odds": -108, "point": 3, "market": "spreads"},
        {"source": "pinnacle", "team": "Cowboys", "odds": -112, "point": -3, "market": "spreads"}
    ]}"#;

    let lines = UploadFormat::Json.extract(upload).unwrap();
    let quotes: Vec<RawQuote> = lines
        .into_iter()
        .map(|line| line.into_raw("user", "h2h", as_of()))
        .collect();

    let report = evaluate_event(&event(), &quotes, &EvaluationConfig::default(), as_of());

    // +7 is below the minimum magnitude
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 0);
    let ev = report.results[0].ev().unwrap();
    assert!(ev.is_positive_ev());
    assert!(report.exclusions.is_empty());
}

#[tokio::test]
#[ignore = "requires THE_ODDS_API_KEY"]
async fn live_feed_lists_events() {
    dotenvy::dotenv().ok();
    let config = match Config::load() {
        Ok(c) if c.the_odds_api_key.is_some() => c,
        _ => {
            println!("Skipping: THE_ODDS_API_KEY not set");
            return;
        }
    };

    let client = OddsApiClient::new(&config).unwrap();
    let events = client.fetch_events(&config.sport).await.unwrap();

    for event in events.iter().take(3) {
        println!("{} {} @ {}", event.id, event.away_team, event.home_team);
    }
}
