//! Raw quote tuples and their normalization into [`Quote`]s.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::types::{AmericanOdds, EventContext, MarketKind, Quote};
use crate::error::QuoteError;

/// Odds as they arrive from an upload or feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OddsValue {
    /// Integer price, e.g. `-110`.
    Integer(i64),
    /// Float price, accepted only when integral, e.g. `-110.0`.
    Float(f64),
    /// Text price, e.g. `"+150"`.
    Text(String),
}

impl OddsValue {
    /// Parse into validated American odds.
    pub fn to_american(&self) -> Result<AmericanOdds, QuoteError> {
        let value = match self {
            OddsValue::Integer(v) => *v,
            OddsValue::Float(v) => integral(*v).ok_or_else(|| QuoteError::UnparseableOdds {
                value: v.to_string(),
            })?,
            OddsValue::Text(text) => parse_odds_text(text)?,
        };

        AmericanOdds::new(value)
    }
}

impl From<i64> for OddsValue {
    fn from(value: i64) -> Self {
        OddsValue::Integer(value)
    }
}

impl From<i32> for OddsValue {
    fn from(value: i32) -> Self {
        OddsValue::Integer(value as i64)
    }
}

impl From<&str> for OddsValue {
    fn from(value: &str) -> Self {
        OddsValue::Text(value.to_string())
    }
}

impl fmt::Display for OddsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OddsValue::Integer(v) => write!(f, "{}", v),
            OddsValue::Float(v) => write!(f, "{}", v),
            OddsValue::Text(v) => write!(f, "{}", v),
        }
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn parse_odds_text(text: &str) -> Result<i64, QuoteError> {
    let unparseable = || QuoteError::UnparseableOdds {
        value: text.to_string(),
    };
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    if let Ok(value) = unsigned.parse::<i64>() {
        return Ok(value);
    }

    unsigned
        .parse::<f64>()
        .ok()
        .and_then(integral)
        .ok_or_else(unparseable)
}

/// One raw observation: `(source, market, selection_label, odds, point, observed_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    /// Book or user identifier.
    pub source: String,
    /// Market name, e.g. `spread` or `spreads`.
    #[serde(default)]
    pub market: String,
    /// Selection label, e.g. a team name or `Over`.
    pub label: String,
    /// Price in American format.
    pub odds: OddsValue,
    /// Point for spread/total.
    #[serde(default)]
    pub point: Option<Decimal>,
    /// Capture time. Falls back to the evaluation time when absent.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub observed_at: Option<OffsetDateTime>,
}

impl RawQuote {
    /// Create a raw quote without a capture time.
    pub fn new(
        source: impl Into<String>,
        market: impl Into<String>,
        label: impl Into<String>,
        odds: impl Into<OddsValue>,
        point: Option<Decimal>,
    ) -> Self {
        Self {
            source: source.into(),
            market: market.into(),
            label: label.into(),
            odds: odds.into(),
            point,
            observed_at: None,
        }
    }

    /// Set the capture time.
    pub fn observed_at(mut self, at: OffsetDateTime) -> Self {
        self.observed_at = Some(at);
        self
    }
}

/// Normalize a raw tuple into a [`Quote`] for the given event.
///
/// Fails when the odds are zero, below 100 in magnitude or not integral,
/// when a spread/total lacks a point or a moneyline carries one, or when
/// the label maps to no side of the event.
pub fn normalize_quote(
    raw: &RawQuote,
    event: &EventContext,
    as_of: OffsetDateTime,
) -> Result<Quote, QuoteError> {
    let market = MarketKind::from_str(raw.market.trim()).map_err(|_| QuoteError::UnknownMarket {
        value: raw.market.clone(),
    })?;

    let american_odds = raw.odds.to_american()?;

    match (market.requires_point(), raw.point) {
        (true, None) => return Err(QuoteError::MissingPoint { market }),
        (false, Some(point)) => return Err(QuoteError::UnexpectedPoint { point }),
        _ => {}
    }

    let selection = event.resolve_side(&raw.label, market)?;

    Ok(Quote {
        source: raw.source.trim().to_string(),
        market,
        selection,
        label: raw.label.trim().to_string(),
        american_odds,
        point: raw.point,
        observed_at: raw.observed_at.unwrap_or(as_of),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Side;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn event() -> EventContext {
        EventContext::new("evt-1", "Kansas City Chiefs", "Buffalo Bills")
    }

    fn now() -> OffsetDateTime {
        datetime!(2024-01-21 18:00 UTC)
    }

    #[test]
    fn odds_value_parses_all_encodings() {
        assert_eq!(OddsValue::Integer(-110).to_american().unwrap().value(), -110);
        assert_eq!(OddsValue::Float(120.0).to_american().unwrap().value(), 120);
        assert_eq!(OddsValue::from("+150").to_american().unwrap().value(), 150);
        assert_eq!(OddsValue::from(" -110 ").to_american().unwrap().value(), -110);
        assert_eq!(OddsValue::from("-105.0").to_american().unwrap().value(), -105);
    }

    #[test]
    fn odds_value_rejects_bad_values() {
        assert_eq!(OddsValue::from("0").to_american(), Err(QuoteError::ZeroOdds));
        assert_eq!(
            OddsValue::Integer(50).to_american(),
            Err(QuoteError::OddsOutOfRange { odds: 50 })
        );
        assert!(matches!(
            OddsValue::Float(-110.5).to_american(),
            Err(QuoteError::UnparseableOdds { .. })
        ));
        assert!(matches!(
            OddsValue::from("even").to_american(),
            Err(QuoteError::UnparseableOdds { .. })
        ));
    }

    #[test]
    fn odds_value_deserializes_untagged() {
        let values: Vec<OddsValue> = serde_json::from_str(r#"[-110, 120.0, "+150"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                OddsValue::Integer(-110),
                OddsValue::Float(120.0),
                OddsValue::Text("+150".to_string())
            ]
        );
    }

    #[test]
    fn normalize_spread_quote() {
        let raw = RawQuote::new("Pinnacle ", "spreads", " buffalo bills", "+105", Some(dec!(2.5)));

        let quote = normalize_quote(&raw, &event(), now()).unwrap();

        assert_eq!(quote.source, "Pinnacle");
        assert_eq!(quote.market, MarketKind::Spread);
        assert_eq!(quote.selection, Side::Away);
        assert_eq!(quote.american_odds.value(), 105);
        assert_eq!(quote.point, Some(dec!(2.5)));
        assert_eq!(quote.observed_at, now());
    }

    #[test]
    fn normalize_keeps_capture_time() {
        let at = datetime!(2024-01-21 17:30 UTC);
        let raw = RawQuote::new("user", "h2h", "Chiefs", -130, None).observed_at(at);

        let quote = normalize_quote(&raw, &event(), now()).unwrap();

        assert_eq!(quote.observed_at, at);
        assert_eq!(quote.selection, Side::Home);
    }

    #[test]
    fn normalize_rejects_point_shape_errors() {
        let missing = RawQuote::new("user", "total", "Over", -110, None);
        assert_eq!(
            normalize_quote(&missing, &event(), now()),
            Err(QuoteError::MissingPoint {
                market: MarketKind::Total
            })
        );

        let forbidden = RawQuote::new("user", "moneyline", "Chiefs", -110, Some(dec!(1)));
        assert_eq!(
            normalize_quote(&forbidden, &event(), now()),
            Err(QuoteError::UnexpectedPoint { point: dec!(1) })
        );
    }

    #[test]
    fn normalize_rejects_unknown_market_and_selection() {
        let market = RawQuote::new("user", "outrights", "Chiefs", -110, None);
        assert!(matches!(
            normalize_quote(&market, &event(), now()),
            Err(QuoteError::UnknownMarket { .. })
        ));

        let selection = RawQuote::new("user", "h2h", "Ravens", -110, None);
        assert!(matches!(
            normalize_quote(&selection, &event(), now()),
            Err(QuoteError::UnknownSelection { .. })
        ));
    }
}
