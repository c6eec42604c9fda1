//! Idempotent creation of the `neo_data` table.
//!
//! Safe to call on every run: the statement is `CREATE TABLE IF NOT EXISTS`,
//! so an existing table (and its rows) is left untouched.

use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;

pub async fn ensure_neo_data_table(db: &DatabaseConnection) -> Result<(), DbErr> {
    let manager = SchemaManager::new(db);

    manager.create_table(neo_data_table()).await?;

    tracing::info!("Table check/creation complete for neo_data");
    Ok(())
}

pub fn neo_data_table() -> TableCreateStatement {
    Table::create()
        .table(NeoData::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(NeoData::ReferenceId)
                .string_len(50)
                .not_null(),
        )
        .col(ColumnDef::new(NeoData::Name).string_len(200).null())
        .col(
            ColumnDef::new(NeoData::CloseApproachDate)
                .date()
                .not_null(),
        )
        .col(ColumnDef::new(NeoData::EstimatedDiameterKm).double().null())
        .col(ColumnDef::new(NeoData::VelocityKmH).double().null())
        .col(ColumnDef::new(NeoData::MissDistanceKm).double().null())
        .col(
            ColumnDef::new(NeoData::IsPotentiallyHazardous)
                .boolean()
                .not_null()
                .default(false),
        )
        .primary_key(
            Index::create()
                .name("pk_neo_data")
                .col(NeoData::ReferenceId)
                .col(NeoData::CloseApproachDate),
        )
        .to_owned()
}

#[derive(DeriveIden)]
enum NeoData {
    Table,
    ReferenceId,
    Name,
    CloseApproachDate,
    EstimatedDiameterKm,
    #[sea_orm(iden = "velocity_km_h")]
    VelocityKmH,
    MissDistanceKm,
    IsPotentiallyHazardous,
}
