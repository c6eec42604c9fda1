use sea_orm::{ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use neo_ingest::entities::{neo_data, prelude::NeoData};
use neo_ingest::services::neo_schema::ensure_neo_data_table;

/// Set up test database connection from TEST_DATABASE_URL.
///
/// Returns `None` when the variable is unset so the suite can run on machines
/// without PostgreSQL.
pub async fn setup_test_db() -> Option<DatabaseConnection> {
    let database_url = match env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        }
    };

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    // Parallel tests can race on CREATE TABLE IF NOT EXISTS; the loser retries
    if ensure_neo_data_table(&db).await.is_err() {
        ensure_neo_data_table(&db)
            .await
            .expect("Failed to create neo_data table");
    }

    Some(db)
}

/// Reference id prefix unique to one test run, so tests never collide with
/// each other or with real rows.
pub fn unique_prefix(test_name: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("t{}-{}-{}", nanos % 1_000_000_000, std::process::id(), test_name)
}

pub async fn rows_with_prefix(
    db: &DatabaseConnection,
    prefix: &str,
) -> Result<Vec<neo_data::Model>, DbErr> {
    NeoData::find()
        .filter(neo_data::Column::ReferenceId.starts_with(prefix))
        .all(db)
        .await
}

pub async fn cleanup_test_db(db: &DatabaseConnection, prefix: &str) -> Result<(), DbErr> {
    NeoData::delete_many()
        .filter(neo_data::Column::ReferenceId.starts_with(prefix))
        .exec(db)
        .await?;
    Ok(())
}
