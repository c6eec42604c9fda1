//! Windowed NEO ingestion.
//!
//! The feed only serves short ranges, so a long historical range is split
//! into consecutive windows of at most `window_days` days. Each window is
//! fetched, normalized and persisted to completion before the next one starts.
//! A fetch or parse failure stops the whole run; rows already written stay
//! written, and re-running from the same start date is safe because writes
//! are idempotent.

use chrono::{Duration as ChronoDuration, NaiveDate};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::EtlResult;
use crate::services::neo_feed::NeoFeed;
use crate::services::normalizer::normalize_feed;
use crate::services::persistence::{persist_records, NeoStore, WritePath};

/// Inclusive date range submitted in one feed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FeedWindow {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone)]
pub struct BackfillOptions {
    pub window_days: u32,
    /// Pause between consecutive feed requests
    pub pacing: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub window: FeedWindow,
    pub fetched: usize,
    pub normalized: usize,
    pub inserted: usize,
    pub conflicts: usize,
    pub failed: usize,
    pub path: Option<WritePath>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillSummary {
    pub windows: usize,
    pub empty_windows: usize,
    pub normalized: usize,
    pub inserted: usize,
    pub conflicts: usize,
    pub failed: usize,
}

impl BackfillSummary {
    fn add(&mut self, report: &WindowReport) {
        self.windows += 1;
        if report.normalized == 0 {
            self.empty_windows += 1;
        }
        self.normalized += report.normalized;
        self.inserted += report.inserted;
        self.conflicts += report.conflicts;
        self.failed += report.failed;
    }
}

/// Split `[start, end]` into consecutive windows of at most `window_days`
/// days. The last window is the short one. Empty when `start > end`.
pub fn plan_windows(start: NaiveDate, end: NaiveDate, window_days: u32) -> Vec<FeedWindow> {
    let mut windows = Vec::new();
    if window_days == 0 {
        return windows;
    }

    let span = ChronoDuration::days(window_days as i64 - 1);
    let mut cursor = start;

    while cursor <= end {
        let window_end = std::cmp::min(cursor + span, end);
        windows.push(FeedWindow {
            start: cursor,
            end: window_end,
        });

        match window_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }

    windows
}

/// Fetch, normalize and persist a single window.
pub async fn ingest_window<F, S>(
    feed: &F,
    store: &S,
    window: FeedWindow,
) -> EtlResult<WindowReport>
where
    F: NeoFeed + ?Sized,
    S: NeoStore + ?Sized,
{
    let response = feed.fetch_window(window.start, window.end).await?;
    let fetched = response.object_count();
    let records = normalize_feed(&response)?;

    if records.is_empty() {
        tracing::info!("No NEO data found for {} to {}", window.start, window.end);
        return Ok(WindowReport {
            window,
            fetched,
            normalized: 0,
            inserted: 0,
            conflicts: 0,
            failed: 0,
            path: None,
        });
    }

    let batch = persist_records(store, &records).await?;

    tracing::info!(
        start = %window.start,
        end = %window.end,
        normalized = records.len(),
        inserted = batch.inserted,
        conflicts = batch.conflicts,
        failed = batch.failed(),
        "Inserted {} rows for {} to {}",
        batch.inserted,
        window.start,
        window.end
    );

    Ok(WindowReport {
        window,
        fetched,
        normalized: records.len(),
        inserted: batch.inserted,
        conflicts: batch.conflicts,
        failed: batch.failed(),
        path: Some(batch.path),
    })
}

/// Ingest every window in `[start, end]`, pacing requests.
pub async fn run_backfill<F, S>(
    feed: &F,
    store: &S,
    start: NaiveDate,
    end: NaiveDate,
    options: &BackfillOptions,
) -> EtlResult<BackfillSummary>
where
    F: NeoFeed + ?Sized,
    S: NeoStore + ?Sized,
{
    let windows = plan_windows(start, end, options.window_days);
    let total = windows.len();
    let mut summary = BackfillSummary::default();

    if windows.is_empty() {
        tracing::warn!("Nothing to backfill: start {} is after end {}", start, end);
        return Ok(summary);
    }

    tracing::info!(
        "Starting NEO backfill from {} to {} ({} windows of up to {} days)",
        start,
        end,
        total,
        options.window_days
    );

    for (index, window) in windows.into_iter().enumerate() {
        let progress = index + 1;
        tracing::debug!("[{}/{}] Window {} to {}", progress, total, window.start, window.end);

        let report = ingest_window(feed, store, window).await?;
        summary.add(&report);

        // Rate limiting between feed requests
        if progress < total && !options.pacing.is_zero() {
            sleep(options.pacing).await;
        }
    }

    tracing::info!(
        windows = summary.windows,
        empty_windows = summary.empty_windows,
        inserted = summary.inserted,
        conflicts = summary.conflicts,
        failed = summary.failed,
        "Historical data load complete"
    );

    Ok(summary)
}
