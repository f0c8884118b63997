//! edge-finder: college basketball prediction aggregator and edge finder.
//!
//! Single-binary Tokio application that:
//! 1. Fetches per-game predictions from every selected source
//! 2. Matches games across sources and builds a consensus per metric
//! 3. Compares the consensus against sportsbook lines
//! 4. Prints ranked edges (or a backtest summary) as JSON on stdout

mod config;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use common::EdgeFinderConfig;
use edge_engine::{backtest, EdgeFinder, SourceSelection};
use prediction_sources::{MarketLineSource, OddsApiClient, SourceRegistry};

/// College basketball edge finder
#[derive(Parser)]
#[command(name = "edge-finder", about = "Find betting edges from aggregated model predictions")]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan one date for edges.
    Scan {
        /// `today`, `tomorrow` or YYYY-MM-DD.
        #[arg(long, default_value = "today")]
        date: String,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Scan today's slate.
    Today {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Scan every date in a range and summarize.
    Backtest {
        #[arg(long)]
        start_date: String,

        /// Defaults to today.
        #[arg(long)]
        end_date: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Source ids to query, or `all`.
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    sources: Vec<String>,

    /// Minimum absolute edge percentage to report.
    #[arg(long)]
    min_edge: Option<f64>,

    /// Bankroll for Kelly stake sizing.
    #[arg(long)]
    bankroll: Option<f64>,

    /// Cancel outstanding fetches after this many seconds and report what arrived.
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "edge_finder=debug,edge_engine=debug,prediction_sources=debug"
    } else {
        "edge_finder=info,edge_engine=info,prediction_sources=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve a CLI date argument against `today`.
fn parse_date(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => today
            .checked_add_days(Days::new(1))
            .context("date out of range"),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}': expected today, tomorrow or YYYY-MM-DD", raw)),
    }
}

/// Reject selections naming sources that are not registered.
fn check_selection(selection: &SourceSelection, registry: &SourceRegistry) -> Result<()> {
    let SourceSelection::Only(ids) = selection else {
        return Ok(());
    };
    let known: HashSet<String> = registry.ids().into_iter().collect();
    let unknown: Vec<&str> = ids
        .iter()
        .filter(|id| !known.contains(id.as_str()))
        .map(|id| id.as_str())
        .collect();
    if !unknown.is_empty() {
        bail!(common::Error::Config(format!(
            "unknown source(s): {} (registered: {})",
            unknown.join(", "),
            registry.ids().join(", ")
        )));
    }
    Ok(())
}

fn build_finder(cfg: &EdgeFinderConfig) -> Result<EdgeFinder> {
    let registry = SourceRegistry::from_config(&cfg.sources, cfg.timing.source_timeout_secs)
        .context("failed to build source registry")?;
    if registry.is_empty() {
        warn!("No prediction sources configured; add [[sources]] entries to config.toml");
    }

    let odds: Option<Arc<dyn MarketLineSource>> = if cfg.odds.api_key.is_empty() {
        warn!("ODDS_API_KEY not set; market lines unavailable, no edges will be found");
        None
    } else {
        let client = OddsApiClient::new(
            cfg.odds.clone(),
            Duration::from_secs(cfg.timing.odds_timeout_secs),
        )
        .context("failed to build odds client")?;
        Some(Arc::new(client))
    };

    EdgeFinder::from_config(cfg, registry, odds).context("invalid team configuration")
}

/// Cancel `token` on Ctrl-C or once `deadline` elapses.
fn spawn_cancel_watcher(token: CancellationToken, deadline: Option<Duration>) {
    tokio::spawn(async move {
        let deadline_elapsed = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = token.cancelled() => return,
            r = tokio::signal::ctrl_c() => {
                if let Err(e) = r {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                warn!("Interrupted; reporting what has arrived so far");
            }
            _ = deadline_elapsed => {
                warn!("Deadline reached; reporting what has arrived so far");
            }
        }
        token.cancel();
    });
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut cfg = config::load_config().context("configuration error")?;
    let today = Local::now().date_naive();

    let run = match &cli.command {
        Command::Scan { run, .. } | Command::Today { run } | Command::Backtest { run, .. } => run,
    };
    if let Some(bankroll) = run.bankroll {
        cfg.edge.bankroll = bankroll;
    }
    if let Some(min_edge) = run.min_edge {
        cfg.edge.min_edge_percent = min_edge;
    }
    config::validate_config(&cfg).context("configuration error")?;

    let finder = build_finder(&cfg)?;
    let selection = SourceSelection::from_args(&run.sources);
    check_selection(&selection, finder.registry())?;

    let cancel = CancellationToken::new();
    spawn_cancel_watcher(cancel.clone(), run.deadline_secs.map(Duration::from_secs));

    let min_edge = cfg.edge.min_edge_percent;
    info!(
        "Edge finder starting: min_edge={}%, bankroll={}, sources={:?}",
        min_edge,
        cfg.edge.bankroll,
        selection.resolve(finder.registry())
    );

    match &cli.command {
        Command::Scan { date, .. } => {
            let date = parse_date(date, today)?;
            let reports = finder.find_edges(date, &selection, min_edge, &cancel).await;
            print_json(&reports, run.pretty)?;
        }
        Command::Today { .. } => {
            let reports = finder.find_edges(today, &selection, min_edge, &cancel).await;
            print_json(&reports, run.pretty)?;
        }
        Command::Backtest {
            start_date,
            end_date,
            ..
        } => {
            let start = parse_date(start_date, today)?;
            let end = match end_date {
                Some(raw) => parse_date(raw, today)?,
                None => today,
            };
            let summary = backtest(&finder, start, end, &selection, min_edge, &cancel).await?;
            print_json(&summary, run.pretty)?;
        }
    }

    cancel.cancel();
    Ok(())
}
