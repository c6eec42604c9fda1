//! `SeaORM` Entity for the neo_data table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "neo_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reference_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub close_approach_date: Date,
    pub name: Option<String>,
    /// Midpoint of the estimated kilometre range
    #[sea_orm(column_type = "Double", nullable)]
    pub estimated_diameter_km: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub velocity_km_h: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub miss_distance_km: Option<f64>,
    pub is_potentially_hazardous: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
