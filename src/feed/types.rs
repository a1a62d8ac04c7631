//! The Odds API v4 response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::market::{EventContext, MarketKind, OddsValue, RawQuote};

/// Entry of `GET /sports`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSport {
    /// Sport key, e.g. `americanfootball_nfl`.
    pub key: String,
    /// Sport group, e.g. `American Football`.
    #[serde(default)]
    pub group: String,
    /// Display title.
    pub title: String,
    /// Whether the sport is in season.
    #[serde(default)]
    pub active: bool,
}

/// Event, with bookmakers when fetched from the odds endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiEvent {
    /// Event identifier.
    pub id: String,
    /// Sport key.
    pub sport_key: String,
    /// Kick-off time.
    #[serde(with = "time::serde::rfc3339")]
    pub commence_time: OffsetDateTime,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Bookmaker prices, absent on the events endpoint.
    #[serde(default)]
    pub bookmakers: Vec<ApiBookmaker>,
}

/// One bookmaker's markets for an event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiBookmaker {
    /// Bookmaker key, e.g. `pinnacle`.
    pub key: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Last time any market changed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
    /// Markets offered.
    #[serde(default)]
    pub markets: Vec<ApiMarket>,
}

/// One market of a bookmaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiMarket {
    /// Market key, e.g. `spreads`.
    pub key: String,
    /// Last time this market changed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
    /// Priced outcomes.
    #[serde(default)]
    pub outcomes: Vec<ApiOutcome>,
}

/// One priced outcome.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiOutcome {
    /// Team name, or `Over`/`Under`.
    pub name: String,
    /// American price.
    pub price: OddsValue,
    /// Point for spreads and totals.
    #[serde(default)]
    pub point: Option<Decimal>,
}

impl ApiEvent {
    /// Event context used to resolve selection labels.
    pub fn context(&self) -> EventContext {
        EventContext::new(self.id.clone(), self.home_team.clone(), self.away_team.clone())
    }

    /// Flatten every bookmaker's outcomes in one market into raw quotes.
    pub fn raw_quotes(&self, market: MarketKind) -> Vec<RawQuote> {
        let key = market.api_key();

        self.bookmakers
            .iter()
            .flat_map(|bookmaker| {
                bookmaker
                    .markets
                    .iter()
                    .filter(move |m| m.key == key)
                    .flat_map(move |m| {
                        let observed_at = m.last_update.or(bookmaker.last_update);
                        m.outcomes.iter().map(move |outcome| RawQuote {
                            source: bookmaker.key.clone(),
                            market: key.to_string(),
                            label: outcome.name.clone(),
                            odds: outcome.price.clone(),
                            point: outcome.point,
                            observed_at,
                        })
                    })
            })
            .collect()
    }
}
