use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Request};

use crate::config::{FeedConfig, MAX_WINDOW_DAYS};
use crate::error::{EtlError, EtlResult, FetchError};
use crate::models::neo_feed::NeoFeedResponse;

/// Source of raw NEO feed pages for a date range.
#[async_trait]
pub trait NeoFeed: Send + Sync {
    /// Fetch every object with a close approach between `start` and `end`
    /// (both inclusive).
    async fn fetch_window(&self, start: NaiveDate, end: NaiveDate) -> EtlResult<NeoFeedResponse>;
}

/// Client for the NASA NeoWs `/feed` endpoint.
#[derive(Clone)]
pub struct NeoFeedService {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NeoFeedService {
    pub fn new(config: &FeedConfig) -> EtlResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EtlError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    /// Build (without sending) the feed request for a window.
    pub fn feed_request(&self, start: NaiveDate, end: NaiveDate) -> EtlResult<Request> {
        validate_window(start, end)?;

        let url = format!("{}/feed", self.base_url);
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();

        let request = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(&[
                ("start_date", start_date.as_str()),
                ("end_date", end_date.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .build()?;

        Ok(request)
    }
}

#[async_trait]
impl NeoFeed for NeoFeedService {
    async fn fetch_window(&self, start: NaiveDate, end: NaiveDate) -> EtlResult<NeoFeedResponse> {
        let request = self.feed_request(start, end)?;

        tracing::info!("Requesting NEO feed for {} to {}...", start, end);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(FetchError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body }.into());
        }

        let feed = response
            .json::<NeoFeedResponse>()
            .await
            .map_err(|e| EtlError::Parse(format!("failed to decode NEO feed: {}", e)))?;

        tracing::debug!(
            element_count = feed.element_count.unwrap_or(0),
            objects = feed.object_count(),
            "Fetched NEO feed window"
        );

        Ok(feed)
    }
}

/// The feed accepts at most seven days per request, start before end.
pub fn validate_window(start: NaiveDate, end: NaiveDate) -> EtlResult<()> {
    if start > end {
        return Err(EtlError::Config(format!(
            "window start {} is after end {}",
            start, end
        )));
    }

    let span = (end - start).num_days() + 1;
    if span > MAX_WINDOW_DAYS as i64 {
        return Err(EtlError::Config(format!(
            "window {} to {} spans {} days, feed maximum is {}",
            start, end, span, MAX_WINDOW_DAYS
        )));
    }

    Ok(())
}
