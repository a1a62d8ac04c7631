//! Application configuration loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Evaluation ===
    /// Books treated as sharp (comma-separated in the environment).
    #[serde(default = "default_sharp_sources")]
    pub sharp_sources: Vec<String>,

    /// Fraction of full Kelly to stake (0.5 = half Kelly).
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: f64,

    /// Bankroll used for stake sizing.
    #[serde(default = "default_bankroll")]
    pub bankroll: Decimal,

    /// Stake used for expected profit.
    #[serde(default = "default_stake")]
    pub stake: Decimal,

    /// Source identifier of the user's own lines.
    #[serde(default = "default_user_source")]
    pub user_source: String,

    /// Sharp quotes older than this are not used.
    #[serde(default)]
    pub max_quote_age_secs: Option<u64>,

    // === Odds API ===
    /// The Odds API key.
    #[serde(default)]
    pub the_odds_api_key: Option<String>,

    /// The Odds API base URL.
    #[serde(default = "default_odds_api_url")]
    pub odds_api_url: String,

    /// Bookmaker regions requested from the API.
    #[serde(default = "default_regions")]
    pub odds_api_regions: String,

    /// Default sport key.
    #[serde(default = "default_sport")]
    pub sport: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_sharp_sources() -> Vec<String> {
    vec![
        "pinnacle".to_string(),
        "bookmaker".to_string(),
        "circasports".to_string(),
    ]
}

fn default_kelly_fraction() -> f64 {
    0.5
}

fn default_bankroll() -> Decimal {
    Decimal::new(1000, 0) // $1000
}

fn default_stake() -> Decimal {
    Decimal::new(100, 0) // $100
}

fn default_user_source() -> String {
    "user".to_string()
}

fn default_odds_api_url() -> String {
    "https://api.the-odds-api.com/v4".to_string()
}

fn default_regions() -> String {
    "us".to_string()
}

fn default_sport() -> String {
    "americanfootball_nfl".to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sharp_sources: default_sharp_sources(),
            kelly_fraction: default_kelly_fraction(),
            bankroll: default_bankroll(),
            stake: default_stake(),
            user_source: default_user_source(),
            max_quote_age_secs: None,
            the_odds_api_key: None,
            odds_api_url: default_odds_api_url(),
            odds_api_regions: default_regions(),
            sport: default_sport(),
            http_timeout_ms: default_http_timeout_ms(),
            port: default_port(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Tracing filter directive. `--verbose` or `VERBOSE` wins over `RUST_LOG`.
    pub fn log_directive(&self, verbose: bool) -> String {
        if verbose || self.verbose {
            "odds_ev=debug,info".to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evaluation().validate()?;

        if self.http_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "HTTP_TIMEOUT_MS must be positive".to_string(),
            ));
        }

        url::Url::parse(&self.odds_api_url).map_err(|e| {
            ConfigError::Invalid(format!("ODDS_API_URL is not a valid URL: {}", e))
        })?;

        Ok(())
    }

    /// Per-call evaluation settings derived from this configuration.
    pub fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig {
            sharp_sources: self.sharp_sources.clone(),
            kelly_fraction: self.kelly_fraction,
            bankroll: self.bankroll,
            stake: self.stake,
            user_source: self.user_source.clone(),
            max_quote_age_secs: self.max_quote_age_secs,
        }
    }

    /// HTTP timeout as a duration.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

/// Settings passed explicitly into each evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Books treated as sharp.
    pub sharp_sources: Vec<String>,
    /// Fraction of full Kelly, in (0, 1].
    pub kelly_fraction: f64,
    /// Bankroll, positive.
    pub bankroll: Decimal,
    /// Stake, positive.
    pub stake: Decimal,
    /// Source identifier of the user's own lines.
    pub user_source: String,
    /// Staleness bound for sharp quotes.
    #[serde(default)]
    pub max_quote_age_secs: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Config::default().evaluation()
    }
}

impl EvaluationConfig {
    /// Check ranges of the sizing parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "KELLY_FRACTION must be in (0, 1], got {}",
                self.kelly_fraction
            )));
        }

        if self.bankroll <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "BANKROLL must be positive, got {}",
                self.bankroll
            )));
        }

        if self.stake <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "STAKE must be positive, got {}",
                self.stake
            )));
        }

        if self.sharp_sources.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "SHARP_SOURCES must name at least one book".to_string(),
            ));
        }

        if self.user_source.trim().is_empty() {
            return Err(ConfigError::Invalid("USER_SOURCE must not be empty".to_string()));
        }

        Ok(())
    }

    /// Whether a source is configured as sharp, ignoring case.
    pub fn is_sharp(&self, source: &str) -> bool {
        self.sharp_sources
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(source.trim()))
    }

    /// Whether a source is the user's own line, ignoring case.
    pub fn is_user(&self, source: &str) -> bool {
        self.user_source.trim().eq_ignore_ascii_case(source.trim())
    }
}
