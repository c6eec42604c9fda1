//! Persistence gateway for normalized NEO records.
//!
//! Writes go through two phases:
//! 1. Bulk: the whole batch as one multi-row `INSERT` in one transaction.
//! 2. Fallback (only when phase 1 failed for any reason): one transaction,
//!    each row under its own savepoint. Primary-key collisions are counted and
//!    skipped, any other row error is recorded in the report and the batch
//!    carries on.
//!
//! Persisting the same records twice therefore never errors and never adds a
//! second row for a key.
//!
//! Precondition: this process is the only writer for the `neo_data` key space
//! while a batch runs. The fallback classifies conflicts after the fact and
//! makes no attempt to coordinate with concurrent inserters.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set, SqlErr, TransactionTrait};

use crate::entities::{neo_data, prelude::NeoData};
use crate::error::{EtlError, EtlResult};
use crate::models::neo_record::NeoRecord;

/// Result of inserting a single row on the fallback path.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Inserted,
    /// Key already present. Silently skipped.
    Conflict,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePath {
    Bulk,
    RowByRow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub reference_id: Option<String>,
    pub close_approach_date: NaiveDate,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub path: WritePath,
    pub attempted: usize,
    pub inserted: usize,
    pub conflicts: usize,
    pub failures: Vec<RowFailure>,
}

impl BatchReport {
    fn bulk(inserted: usize) -> Self {
        Self {
            path: WritePath::Bulk,
            attempted: inserted,
            inserted,
            conflicts: 0,
            failures: Vec::new(),
        }
    }

    fn from_outcomes(records: &[NeoRecord], outcomes: Vec<RowOutcome>) -> Self {
        let mut report = Self {
            path: WritePath::RowByRow,
            attempted: records.len(),
            inserted: 0,
            conflicts: 0,
            failures: Vec::new(),
        };

        for (record, outcome) in records.iter().zip(outcomes) {
            match outcome {
                RowOutcome::Inserted => report.inserted += 1,
                RowOutcome::Conflict => report.conflicts += 1,
                RowOutcome::Failed(message) => report.failures.push(RowFailure {
                    reference_id: record.reference_id.clone(),
                    close_approach_date: record.close_approach_date,
                    message,
                }),
            }
        }

        report
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Storage seam for the gateway. The production implementation is
/// [`NeoDataRepository`].
#[async_trait]
pub trait NeoStore: Send + Sync {
    /// All-or-nothing insert of the whole batch. Returns rows written.
    async fn insert_batch(&self, records: &[NeoRecord]) -> EtlResult<u64>;

    /// Insert rows one by one, returning one outcome per input record in
    /// input order. Only errors that prevent the pass as a whole (e.g. the
    /// transaction cannot be opened) are returned as `Err`.
    async fn insert_rows(&self, records: &[NeoRecord]) -> EtlResult<Vec<RowOutcome>>;
}

/// Persist a batch with bulk-then-fallback semantics.
pub async fn persist_records<S>(store: &S, records: &[NeoRecord]) -> EtlResult<BatchReport>
where
    S: NeoStore + ?Sized,
{
    if records.is_empty() {
        return Ok(BatchReport::bulk(0));
    }

    let bulk_error = match store.insert_batch(records).await {
        Ok(written) => {
            tracing::debug!(rows = written, "Bulk insert committed");
            return Ok(BatchReport::bulk(records.len()));
        }
        Err(e) => e,
    };

    tracing::warn!(
        error = %bulk_error,
        rows = records.len(),
        "Bulk insert failed, falling back to row-by-row insertion"
    );

    let outcomes = store.insert_rows(records).await?;
    let report = BatchReport::from_outcomes(records, outcomes);

    for failure in &report.failures {
        tracing::warn!(
            reference_id = failure.reference_id.as_deref().unwrap_or("<missing>"),
            date = %failure.close_approach_date,
            error = %failure.message,
            "Row insert error"
        );
    }

    tracing::info!(
        inserted = report.inserted,
        conflicts = report.conflicts,
        failed = report.failed(),
        "Row-by-row insertion complete"
    );

    Ok(report)
}

/// PostgreSQL `unique_violation` (SQLSTATE 23505).
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// SeaORM-backed store for the `neo_data` table.
#[derive(Clone)]
pub struct NeoDataRepository {
    db: DatabaseConnection,
}

impl NeoDataRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn to_active_model(record: &NeoRecord) -> EtlResult<neo_data::ActiveModel> {
    let reference_id = record.reference_id.clone().ok_or_else(|| {
        EtlError::InvalidRecord(format!(
            "missing reference_id for approach on {}",
            record.close_approach_date
        ))
    })?;

    Ok(neo_data::ActiveModel {
        reference_id: Set(reference_id),
        close_approach_date: Set(record.close_approach_date),
        name: Set(record.name.clone()),
        estimated_diameter_km: Set(record.estimated_diameter_km),
        velocity_km_h: Set(record.velocity_km_h),
        miss_distance_km: Set(record.miss_distance_km),
        is_potentially_hazardous: Set(record.is_potentially_hazardous),
    })
}

#[async_trait]
impl NeoStore for NeoDataRepository {
    async fn insert_batch(&self, records: &[NeoRecord]) -> EtlResult<u64> {
        let models = records
            .iter()
            .map(to_active_model)
            .collect::<EtlResult<Vec<_>>>()?;

        if models.is_empty() {
            return Ok(0);
        }

        // Dropping the transaction on error rolls it back
        let txn = self.db.begin().await?;
        let written = NeoData::insert_many(models)
            .exec_without_returning(&txn)
            .await?;
        txn.commit().await?;

        Ok(written)
    }

    async fn insert_rows(&self, records: &[NeoRecord]) -> EtlResult<Vec<RowOutcome>> {
        let txn = self.db.begin().await?;
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            let model = match to_active_model(record) {
                Ok(model) => model,
                Err(e) => {
                    outcomes.push(RowOutcome::Failed(e.to_string()));
                    continue;
                }
            };

            // A failed statement aborts the enclosing PostgreSQL transaction,
            // so every row gets its own savepoint.
            let savepoint = txn.begin().await?;
            match NeoData::insert(model).exec_without_returning(&savepoint).await {
                Ok(_) => {
                    savepoint.commit().await?;
                    outcomes.push(RowOutcome::Inserted);
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    if is_unique_violation(&e) {
                        outcomes.push(RowOutcome::Conflict);
                    } else {
                        outcomes.push(RowOutcome::Failed(e.to_string()));
                    }
                }
            }
        }

        txn.commit().await?;
        Ok(outcomes)
    }
}
