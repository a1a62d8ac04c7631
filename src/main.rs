//! Odds EV engine entry point.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use odds_ev::api::{create_router, AppState};
use odds_ev::config::Config;
use odds_ev::evaluation::{evaluate_event, EvaluationOutcome, EvaluationReport};
use odds_ev::feed::OddsApiClient;
use odds_ev::ingest::UploadFormat;
use odds_ev::market::{EventContext, MarketKind, RawQuote};
use odds_ev::metrics;
use odds_ev::utils::shutdown_signal;

/// Sportsbook line EV calculator.
#[derive(Parser, Debug)]
#[command(name = "odds-ev")]
#[command(about = "Compare your lines against a sharp consensus and size bets with Kelly")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an uploaded set of lines against sharp books.
    Analyze {
        /// Upload with your lines (.json, .html or OCR .txt).
        file: PathBuf,

        /// Home team name.
        #[arg(long)]
        home: Option<String>,

        /// Away team name.
        #[arg(long)]
        away: Option<String>,

        /// Event identifier, required with --sport.
        #[arg(long)]
        event: Option<String>,

        /// Market of the uploaded lines.
        #[arg(long, default_value = "moneyline")]
        market: MarketKind,

        /// JSON file with sharp quotes.
        #[arg(long, conflicts_with = "sport")]
        sharp_file: Option<PathBuf>,

        /// Fetch sharp quotes for the event from The Odds API.
        #[arg(long, requires = "event")]
        sport: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List upcoming events from The Odds API.
    Events {
        /// Sport key, defaults to SPORT.
        #[arg(long)]
        sport: Option<String>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Run the HTTP API.
    Serve {
        /// HTTP server port, defaults to PORT.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging. RUST_LOG and VERBOSE come from the environment or
    // .env; a config that fails to load is reported by the subcommand.
    let log_config = Config::load().unwrap_or_default();
    let filter = EnvFilter::try_new(log_config.log_directive(args.verbose))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so --json output stays clean
    if args.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    match args.command {
        Command::Analyze {
            file,
            home,
            away,
            event,
            market,
            sharp_file,
            sport,
            json,
        } => {
            let teams = home.zip(away);
            cmd_analyze(&file, teams, event, market, sharp_file, sport, json).await
        }
        Command::Events { sport } => cmd_events(sport).await,
        Command::CheckConfig => cmd_check_config(),
        Command::Serve { port } => cmd_serve(port).await,
    }
}

/// Evaluate an upload against sharp quotes from a file or the odds API.
async fn cmd_analyze(
    file: &Path,
    teams: Option<(String, String)>,
    event_id: Option<String>,
    market: MarketKind,
    sharp_file: Option<PathBuf>,
    sport: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;
    let evaluation = config.evaluation();
    let as_of = OffsetDateTime::now_utc();

    let format = UploadFormat::from_path(file)?;
    let upload = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let lines = format.extract(&upload)?;
    info!(file = %file.display(), lines = lines.len(), "Extracted user lines");

    let mut quotes: Vec<RawQuote> = lines
        .into_iter()
        .map(|line| line.into_raw(&evaluation.user_source, market.api_key(), as_of))
        .collect();

    let event = match (sharp_file, sport) {
        (Some(path), _) => {
            let Some((home, away)) = teams else {
                bail!("--home and --away are required with --sharp-file");
            };
            quotes.extend(read_sharp_file(&path)?);
            EventContext::new(event_id.unwrap_or_else(|| "event".to_string()), home, away)
        }
        (None, Some(sport)) => {
            let Some(event_id) = event_id else {
                bail!("--event is required with --sport");
            };
            let client = OddsApiClient::new(&config)?;
            let api_event = client.fetch_event_odds(&sport, &event_id, market).await?;
            quotes.extend(api_event.raw_quotes(market));
            match teams {
                Some((home, away)) => EventContext::new(event_id, home, away),
                None => api_event.context(),
            }
        }
        (None, None) => bail!("provide sharp quotes with --sharp-file or --sport"),
    };

    let report = evaluate_event(&event, &quotes, &evaluation, as_of);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&event, &report);
    }

    Ok(())
}

/// Sharp quotes as a JSON array of raw tuples, or `{"quotes": [...]}`.
fn read_sharp_file(path: &Path) -> anyhow::Result<Vec<RawQuote>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum SharpFile {
        List(Vec<RawQuote>),
        Wrapped { quotes: Vec<RawQuote> },
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let quotes = match serde_json::from_str(&text)? {
        SharpFile::List(quotes) | SharpFile::Wrapped { quotes } => quotes,
    };

    info!(file = %path.display(), quotes = quotes.len(), "Loaded sharp quotes");
    Ok(quotes)
}

fn print_report(event: &EventContext, report: &EvaluationReport) {
    println!("======================================================================");
    println!("{} @ {}", event.away_team, event.home_team);
    println!("======================================================================");
    println!(
        "{:<24} {:>7} {:>7} {:>7} {:>8} {:>8} {:>10}",
        "Selection", "Odds", "Fair", "Fair%", "EV/u", "Kelly", "Stake"
    );
    println!("----------------------------------------------------------------------");

    for row in report.ranked() {
        let label = match row.point {
            Some(point) => format!("{} {}", row.label, point),
            None => row.label.clone(),
        };
        println!(
            "{:<24} {:>7} {:>7} {:>6.2}% {:>+8.4} {:>7.2}% {:>10.2}",
            label,
            row.american_odds.to_string(),
            format!("{:+}", row.fair_american_odds),
            row.fair_probability * 100.0,
            row.expected_value_per_unit_stake,
            row.recommended_fraction * 100.0,
            row.recommended_stake,
        );
        if row.is_ungigged() {
            println!("    ungigged sources: {}", row.ungigged_sources.join(", "));
        }
        if !row.excluded_point_mismatch.is_empty() {
            println!(
                "    other points from: {}",
                row.excluded_point_mismatch.join(", ")
            );
        }
    }

    for outcome in &report.results {
        if let EvaluationOutcome::NoConsensus { label, reason, .. } = outcome {
            println!("{:<24} no consensus: {}", label, reason);
        }
    }

    if !report.skipped.is_empty() {
        println!("----------------------------------------------------------------------");
        println!("Skipped:");
        for skipped in &report.skipped {
            println!(
                "  #{} {} {} {}: {}",
                skipped.index, skipped.source, skipped.label, skipped.odds, skipped.reason
            );
        }
    }

    if !report.exclusions.is_empty() {
        println!("----------------------------------------------------------------------");
        println!("Excluded:");
        for exclusion in &report.exclusions {
            let line = exclusion.line.map(|l| format!("@{}", l)).unwrap_or_default();
            println!(
                "  {} {}{}: {}",
                exclusion.source, exclusion.market, line, exclusion.reason
            );
        }
    }
    println!("======================================================================");
}

/// List upcoming events for a sport.
async fn cmd_events(sport: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let sport = sport.unwrap_or_else(|| config.sport.clone());
    let client = OddsApiClient::new(&config)?;

    let events = client.fetch_events(&sport).await?;
    if events.is_empty() {
        warn!(sport = %sport, "No upcoming events");
    }

    for event in events {
        println!(
            "{}  {}  {} @ {}",
            event.id, event.commence_time, event.away_team, event.home_team
        );
    }

    Ok(())
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ODDS EV - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Sharp Sources: {}", config.sharp_sources.join(", "));
    println!("  Kelly Fraction: {}", config.kelly_fraction);
    println!("  Bankroll: ${}", config.bankroll);
    println!("  Stake: ${}", config.stake);
    println!("  User Source: {}", config.user_source);
    match config.max_quote_age_secs {
        Some(age) => println!("  Max Quote Age: {}s", age),
        None => println!("  Max Quote Age: unbounded"),
    }
    println!(
        "  Odds API Key: {}",
        if config.the_odds_api_key.is_some() { "present" } else { "missing" }
    );
    println!("  Odds API: {} (regions {})", config.odds_api_url, config.odds_api_regions);
    println!("  Sport: {}", config.sport);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP API until a shutdown signal arrives.
async fn cmd_serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let handle = metrics::install_prometheus()?;
    let state = AppState::new(config.evaluation()).with_metrics(handle);
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.port)));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
