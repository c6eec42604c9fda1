//! Single-run NEO ingestion: pulls the latest feed window (ending today) and
//! loads it into `neo_data`.
//!
//! Exit status: 0 on success, 1 when the run fails, 2 when it completed but
//! some rows could not be written.

use chrono::{Duration, Utc};
use sea_orm::Database;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neo_ingest::config::EtlConfig;
use neo_ingest::error::EtlResult;
use neo_ingest::jobs::neo_backfill::{ingest_window, FeedWindow, WindowReport};
use neo_ingest::services::neo_feed::NeoFeedService;
use neo_ingest::services::neo_schema::ensure_neo_data_table;
use neo_ingest::services::persistence::NeoDataRepository;

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

    match run().await {
        Ok(report) if report.failed > 0 => {
            tracing::warn!(
                "Completed with {} failed rows ({} inserted, {} already present)",
                report.failed,
                report.inserted,
                report.conflicts
            );
            ExitCode::from(2)
        }
        Ok(report) => {
            if report.normalized == 0 {
                tracing::info!("No new NEO data found.");
            } else {
                tracing::info!(
                    "Inserted {} rows into neo_data ({} already present).",
                    report.inserted,
                    report.conflicts
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Error occurred: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> EtlResult<WindowReport> {
    let config = EtlConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    ensure_neo_data_table(&db).await?;

    let feed = NeoFeedService::new(&config.feed)?;
    let store = NeoDataRepository::new(db);

    let end = Utc::now().date_naive();
    let start = end - Duration::days(config.schedule.window_days as i64 - 1);

    ingest_window(&feed, &store, FeedWindow { start, end }).await
}
