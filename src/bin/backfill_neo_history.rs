//! Backfill `neo_data` over a historical range in feed-sized windows.
//!
//! Usage:
//!   cargo run --bin backfill_neo_history
//!   cargo run --bin backfill_neo_history -- --start-date 2023-01-01 --end-date 2023-12-31
//!
//! The run stops at the first window whose fetch or parse fails. Restarting
//! from the same start date is safe; rows already present are skipped.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use clap::Parser;
use sea_orm::Database;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neo_ingest::config::{validate_window_days, EtlConfig};
use neo_ingest::error::EtlResult;
use neo_ingest::jobs::neo_backfill::{run_backfill, BackfillOptions, BackfillSummary};
use neo_ingest::services::neo_feed::NeoFeedService;
use neo_ingest::services::neo_schema::ensure_neo_data_table;
use neo_ingest::services::persistence::NeoDataRepository;

/// Historical NEO backfill
#[derive(Parser, Debug)]
#[command(name = "backfill_neo_history")]
#[command(about = "Load near-earth-object approaches into neo_data over a date range")]
struct Cli {
    /// First day to ingest (defaults to NEO_BACKFILL_START)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day to ingest, inclusive (defaults to yesterday)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Days per feed request, 1 to 7 (defaults to NEO_WINDOW_DAYS)
    #[arg(long)]
    window_days: Option<u32>,

    /// Pause between feed requests in milliseconds (defaults to NEO_REQUEST_DELAY_MS)
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables (RUST_LOG may come from .env)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(summary) => {
            tracing::info!("=== Backfill Complete ===");
            tracing::info!("Windows: {} ({} empty)", summary.windows, summary.empty_windows);
            tracing::info!("Inserted: {}", summary.inserted);
            tracing::info!("Skipped (already present): {}", summary.conflicts);

            if summary.failed > 0 {
                tracing::warn!("Failed rows: {}", summary.failed);
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!("Backfill aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> EtlResult<BackfillSummary> {
    let config = EtlConfig::from_env()?;

    let start = cli.start_date.unwrap_or(config.schedule.backfill_start);
    let end = cli
        .end_date
        .unwrap_or_else(|| Utc::now().date_naive() - ChronoDuration::days(1));

    let options = BackfillOptions {
        window_days: validate_window_days(cli.window_days.unwrap_or(config.schedule.window_days))?,
        pacing: cli
            .delay_ms
            .map(Duration::from_millis)
            .unwrap_or(config.schedule.request_delay),
    };

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    ensure_neo_data_table(&db).await?;

    let feed = NeoFeedService::new(&config.feed)?;
    let store = NeoDataRepository::new(db);

    run_backfill(&feed, &store, start, end, &options).await
}
