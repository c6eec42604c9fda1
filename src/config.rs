//! Runtime configuration for the NEO ingestion binaries.
//!
//! Values come from the process environment (after `.env` has been loaded by
//! the binary). The resulting [`EtlConfig`] is handed to the feed service and
//! the repository at construction time.

use chrono::NaiveDate;
use std::env;
use std::time::Duration;

use crate::error::{EtlError, EtlResult};

pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov/neo/rest/v1";
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// The feed endpoint rejects ranges longer than this.
pub const MAX_WINDOW_DAYS: u32 = 7;

const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BACKFILL_START: &str = "2019-01-01";

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub window_days: u32,
    pub request_delay: Duration,
    pub backfill_start: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub database_url: String,
    pub feed: FeedConfig,
    pub schedule: ScheduleConfig,
}

impl EtlConfig {
    pub fn from_env() -> EtlResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> EtlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| EtlError::Config("DATABASE_URL must be set".to_string()))?;

        let api_key = match lookup("NASA_API_KEY").filter(|v| !v.trim().is_empty()) {
            Some(key) => key,
            None => {
                tracing::warn!("NASA_API_KEY not set, falling back to {}", DEMO_API_KEY);
                DEMO_API_KEY.to_string()
            }
        };

        let base_url = lookup("NASA_NEO_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 =
            parse_or_default(&lookup, "NEO_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let delay_ms: u64 =
            parse_or_default(&lookup, "NEO_REQUEST_DELAY_MS", DEFAULT_REQUEST_DELAY_MS)?;
        let window_days = validate_window_days(parse_or_default(
            &lookup,
            "NEO_WINDOW_DAYS",
            MAX_WINDOW_DAYS,
        )?)?;

        let start_raw =
            lookup("NEO_BACKFILL_START").unwrap_or_else(|| DEFAULT_BACKFILL_START.to_string());
        let backfill_start = NaiveDate::parse_from_str(start_raw.trim(), "%Y-%m-%d")
            .map_err(|e| EtlError::Config(format!("NEO_BACKFILL_START '{}': {}", start_raw, e)))?;

        Ok(Self {
            database_url,
            feed: FeedConfig {
                api_key,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            schedule: ScheduleConfig {
                window_days,
                request_delay: Duration::from_millis(delay_ms),
                backfill_start,
            },
        })
    }
}

/// Window span must be between one day and the feed maximum.
pub fn validate_window_days(days: u32) -> EtlResult<u32> {
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(EtlError::Config(format!(
            "window size must be between 1 and {} days, got {}",
            MAX_WINDOW_DAYS, days
        )));
    }
    Ok(days)
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> EtlResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| EtlError::Config(format!("{} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
