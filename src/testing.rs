//! In-memory doubles for the feed and the store, used by unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DbErr;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{EtlError, EtlResult, FetchError};
use crate::jobs::neo_backfill::FeedWindow;
use crate::models::neo_feed::NeoFeedResponse;
use crate::models::neo_record::NeoRecord;
use crate::services::neo_feed::NeoFeed;
use crate::services::persistence::{NeoStore, RowOutcome};

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn record(id: &str, approach_date: &str) -> NeoRecord {
    NeoRecord {
        reference_id: Some(id.to_string()),
        name: Some(format!("({})", id)),
        close_approach_date: date(approach_date),
        estimated_diameter_km: Some(0.2),
        velocity_km_h: Some(50000.0),
        miss_distance_km: Some(1000.0),
        is_potentially_hazardous: false,
    }
}

/// Behaves like the `neo_data` table: composite key, atomic bulk insert.
#[derive(Default)]
pub struct InMemoryNeoStore {
    rows: Mutex<BTreeMap<(String, NaiveDate), NeoRecord>>,
    rejected_ids: Mutex<HashSet<String>>,
    bulk_calls: Mutex<usize>,
    row_pass_calls: Mutex<usize>,
}

impl InMemoryNeoStore {
    pub fn seed(&self, record: NeoRecord) {
        let key = (record.reference_id.clone().unwrap(), record.close_approach_date);
        self.rows.lock().unwrap().insert(key, record);
    }

    /// Rows with this id fail with a non-conflict error.
    pub fn reject_id(&self, id: &str) {
        self.rejected_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn bulk_calls(&self) -> usize {
        *self.bulk_calls.lock().unwrap()
    }

    pub fn row_pass_calls(&self) -> usize {
        *self.row_pass_calls.lock().unwrap()
    }

    fn check(&self, record: &NeoRecord) -> Result<(String, NaiveDate), RowOutcome> {
        let id = match &record.reference_id {
            Some(id) => id.clone(),
            None => return Err(RowOutcome::Failed("missing reference_id".to_string())),
        };
        if self.rejected_ids.lock().unwrap().contains(&id) {
            return Err(RowOutcome::Failed(format!("value rejected for {}", id)));
        }
        let key = (id, record.close_approach_date);
        if self.rows.lock().unwrap().contains_key(&key) {
            return Err(RowOutcome::Conflict);
        }
        Ok(key)
    }
}

#[async_trait]
impl NeoStore for InMemoryNeoStore {
    async fn insert_batch(&self, records: &[NeoRecord]) -> EtlResult<u64> {
        *self.bulk_calls.lock().unwrap() += 1;

        let mut staged = HashMap::new();
        for record in records {
            match self.check(record) {
                Ok(key) => {
                    if staged.insert(key, record.clone()).is_some() {
                        return Err(DbErr::Custom("duplicate key in batch".to_string()).into());
                    }
                }
                Err(_) => {
                    let message = format!("bulk insert rejected {}", record.label());
                    return Err(DbErr::Custom(message).into());
                }
            }
        }

        let written = staged.len() as u64;
        self.rows.lock().unwrap().extend(staged);
        Ok(written)
    }

    async fn insert_rows(&self, records: &[NeoRecord]) -> EtlResult<Vec<RowOutcome>> {
        *self.row_pass_calls.lock().unwrap() += 1;

        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            match self.check(record) {
                Ok(key) => {
                    self.rows.lock().unwrap().insert(key, record.clone());
                    outcomes.push(RowOutcome::Inserted);
                }
                Err(outcome) => outcomes.push(outcome),
            }
        }
        Ok(outcomes)
    }
}

/// Feed double: canned bodies keyed by window start, optional failure.
#[derive(Default)]
pub struct ScriptedFeed {
    bodies: HashMap<NaiveDate, String>,
    fail_at: Option<NaiveDate>,
    calls: Mutex<Vec<FeedWindow>>,
}

impl ScriptedFeed {
    pub fn with_body(mut self, window_start: &str, body: &str) -> Self {
        self.bodies.insert(date(window_start), body.to_string());
        self
    }

    pub fn failing_at(mut self, window_start: &str) -> Self {
        self.fail_at = Some(date(window_start));
        self
    }

    pub fn calls(&self) -> Vec<FeedWindow> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NeoFeed for ScriptedFeed {
    async fn fetch_window(&self, start: NaiveDate, end: NaiveDate) -> EtlResult<NeoFeedResponse> {
        self.calls.lock().unwrap().push(FeedWindow { start, end });

        if self.fail_at == Some(start) {
            return Err(EtlError::Fetch(FetchError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "upstream unavailable".to_string(),
            }));
        }

        match self.bodies.get(&start) {
            Some(body) => Ok(NeoFeedResponse::from_json(body)?),
            None => Ok(NeoFeedResponse::default()),
        }
    }
}
