//! The Odds API v4 client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::types::{ApiEvent, ApiSport};
use crate::config::Config;
use crate::error::FeedError;
use crate::market::MarketKind;

/// Client for The Odds API.
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL, e.g. `https://api.the-odds-api.com/v4`.
    base_url: String,
    /// API key sent as the `apiKey` query parameter.
    api_key: String,
    /// Bookmaker regions.
    regions: String,
}

impl OddsApiClient {
    /// Create a client from config. Fails when no API key is configured.
    pub fn new(config: &Config) -> Result<Self, FeedError> {
        let api_key = config
            .the_odds_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(FeedError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: config.odds_api_url.clone(),
            api_key,
            regions: config.odds_api_regions.clone(),
        })
    }

    /// Build the URL of an API path with the key attached.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, FeedError> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
            .map_err(|e| FeedError::ParseError(format!("invalid API url: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("apiKey", &self.api_key)
            .extend_pairs(query);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: &str, url: Url) -> Result<T, FeedError> {
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::FetchFailed {
                resource: resource.to_string(),
                reason: format!("HTTP {} - {}", status, body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| FeedError::ParseError(format!("Failed to parse {}: {}", resource, e)))
    }

    /// List available sports.
    #[instrument(skip(self))]
    pub async fn fetch_sports(&self) -> Result<Vec<ApiSport>, FeedError> {
        let url = self.endpoint("sports/", &[])?;
        let sports: Vec<ApiSport> = self.get_json("sports", url).await?;
        debug!(count = sports.len(), "Fetched sports");
        Ok(sports)
    }

    /// List upcoming events for a sport.
    #[instrument(skip(self))]
    pub async fn fetch_events(&self, sport: &str) -> Result<Vec<ApiEvent>, FeedError> {
        let url = self.endpoint(&format!("sports/{}/events/", sport), &[])?;
        let events: Vec<ApiEvent> = self.get_json("events", url).await?;
        debug!(count = events.len(), "Fetched events");
        Ok(events)
    }

    /// Fetch one event with every bookmaker's prices for a market.
    #[instrument(skip(self, market), fields(market = %market))]
    pub async fn fetch_event_odds(
        &self,
        sport: &str,
        event_id: &str,
        market: MarketKind,
    ) -> Result<ApiEvent, FeedError> {
        let url = self.odds_url(sport, event_id, market)?;
        let events: Vec<ApiEvent> = self.get_json("odds", url).await?;

        let event = events
            .into_iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| FeedError::EventNotFound {
                event_id: event_id.to_string(),
            })?;

        debug!(bookmakers = event.bookmakers.len(), "Fetched event odds");
        Ok(event)
    }

    fn odds_url(&self, sport: &str, event_id: &str, market: MarketKind) -> Result<Url, FeedError> {
        self.endpoint(
            &format!("sports/{}/odds", sport),
            &[
                ("regions", self.regions.as_str()),
                ("markets", market.api_key()),
                ("eventIds", event_id),
                ("oddsFormat", "american"),
            ],
        )
    }
}
