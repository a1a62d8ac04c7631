//! Market, selection and quote types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use crate::error::QuoteError;

/// Two-way market type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum MarketKind {
    /// Straight win market.
    #[strum(to_string = "moneyline", serialize = "h2h")]
    #[serde(alias = "h2h")]
    Moneyline,
    /// Handicap market.
    #[strum(to_string = "spread", serialize = "spreads")]
    #[serde(alias = "spreads")]
    Spread,
    /// Over/under market.
    #[strum(to_string = "total", serialize = "totals")]
    #[serde(alias = "totals")]
    Total,
}

impl MarketKind {
    /// Whether quotes in this market carry a point.
    pub fn requires_point(&self) -> bool {
        !matches!(self, MarketKind::Moneyline)
    }

    /// Market key used by The Odds API.
    pub fn api_key(&self) -> &'static str {
        match self {
            MarketKind::Moneyline => "h2h",
            MarketKind::Spread => "spreads",
            MarketKind::Total => "totals",
        }
    }

    /// The two sides of this market, in canonical order.
    pub fn sides(&self) -> [Side; 2] {
        match self {
            MarketKind::Moneyline | MarketKind::Spread => [Side::Away, Side::Home],
            MarketKind::Total => [Side::Over, Side::Under],
        }
    }
}

/// Side being priced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Side {
    /// Visiting team.
    Away,
    /// Home team.
    Home,
    /// Total goes over the point.
    Over,
    /// Total stays under the point.
    Under,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Away => Side::Home,
            Side::Home => Side::Away,
            Side::Over => Side::Under,
            Side::Under => Side::Over,
        }
    }

    /// Check if the side belongs to the given market.
    pub fn belongs_to(&self, market: MarketKind) -> bool {
        market.sides().contains(self)
    }
}

/// Event whose sides quotes are mapped onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Event identifier.
    pub event_id: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
}

impl EventContext {
    /// Create a new event context.
    pub fn new(
        event_id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
        }
    }

    /// Map a selection label to a side of the given market.
    ///
    /// Labels are trimmed and compared case-insensitively. Team names are
    /// compared on their letters only, and a label contained in exactly one
    /// team name is accepted as a partial match.
    pub fn resolve_side(&self, label: &str, market: MarketKind) -> Result<Side, QuoteError> {
        let trimmed = label.trim().to_lowercase();
        let unknown = || QuoteError::UnknownSelection {
            label: label.to_string(),
            market,
        };

        if market == MarketKind::Total {
            return match trimmed.as_str() {
                "over" | "o" => Ok(Side::Over),
                "under" | "u" => Ok(Side::Under),
                s if s.starts_with("over ") => Ok(Side::Over),
                s if s.starts_with("under ") => Ok(Side::Under),
                _ => Err(unknown()),
            };
        }

        match trimmed.as_str() {
            "home" => return Ok(Side::Home),
            "away" => return Ok(Side::Away),
            _ => {}
        }

        let key = canonical_name(&trimmed);
        if key.is_empty() {
            return Err(unknown());
        }
        let home = canonical_name(&self.home_team);
        let away = canonical_name(&self.away_team);

        if key == home {
            return Ok(Side::Home);
        }
        if key == away {
            return Ok(Side::Away);
        }

        match (home.contains(&key), away.contains(&key)) {
            (true, false) => Ok(Side::Home),
            (false, true) => Ok(Side::Away),
            _ => Err(unknown()),
        }
    }

    /// Display name for a side.
    pub fn side_name(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
            Side::Over => "Over",
            Side::Under => "Under",
        }
    }
}

/// Lowercase letters only.
fn canonical_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// American odds. Magnitude is always at least 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct AmericanOdds(i32);

impl AmericanOdds {
    /// Validate and wrap an American price.
    pub fn new(odds: i64) -> Result<Self, QuoteError> {
        if odds == 0 {
            return Err(QuoteError::ZeroOdds);
        }
        if odds.unsigned_abs() < 100 {
            return Err(QuoteError::OddsOutOfRange { odds });
        }
        i32::try_from(odds)
            .map(Self)
            .map_err(|_| QuoteError::OddsOutOfRange { odds })
    }

    /// Raw signed value.
    pub fn value(&self) -> i32 {
        self.0
    }

    /// Implied probability of this price (vig included).
    pub fn implied_probability(&self) -> f64 {
        crate::pricing::american_to_implied_probability(self.0)
    }

    /// Profit per unit stake if the bet wins.
    pub fn payout_multiplier(&self) -> f64 {
        crate::pricing::american_to_payout(self.0)
    }
}

impl TryFrom<i64> for AmericanOdds {
    type Error = QuoteError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AmericanOdds> for i64 {
    fn from(odds: AmericanOdds) -> Self {
        odds.0 as i64
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// One price observation, validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Book or user identifier.
    pub source: String,
    /// Market type.
    pub market: MarketKind,
    /// Side being priced.
    pub selection: Side,
    /// Label as supplied.
    pub label: String,
    /// Price.
    pub american_odds: AmericanOdds,
    /// Point for spread/total, absent for moneyline.
    pub point: Option<Decimal>,
    /// Capture time.
    #[serde(with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
}

impl Quote {
    /// Line shared by both sides of the instance this quote belongs to.
    ///
    /// Spread points are expressed from the home side, so an away quote at
    /// +3.5 and a home quote at -3.5 share the line -3.5. A pick'em line is
    /// always a plain zero.
    pub fn line(&self) -> Option<Decimal> {
        let point = self.point?;
        if point.is_zero() {
            return Some(Decimal::ZERO);
        }
        match (self.market, self.selection) {
            (MarketKind::Spread, Side::Away) => Some(-point),
            _ => Some(point),
        }
    }

    /// Market instance this quote belongs to.
    pub fn instance(&self, event_id: &str) -> MarketInstance {
        MarketInstance {
            event_id: event_id.to_string(),
            market: self.market,
            line: self.line(),
        }
    }

    /// Whether the quote's source matches the identifier, ignoring case.
    pub fn is_from(&self, source: &str) -> bool {
        self.source.eq_ignore_ascii_case(source)
    }
}

/// Unit of comparison: `(event_id, market, line)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketInstance {
    /// Event identifier.
    pub event_id: String,
    /// Market type.
    pub market: MarketKind,
    /// Canonical line (home-side point for spreads), `None` for moneyline.
    pub line: Option<Decimal>,
}

impl fmt::Display for MarketInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}/{}@{}", self.event_id, self.market, line),
            None => write!(f, "{}/{}", self.event_id, self.market),
        }
    }
}
