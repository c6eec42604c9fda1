use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One flattened near-earth-object approach, ready to persist.
///
/// Identity is `(reference_id, close_approach_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeoRecord {
    /// `None` when the feed omitted the identifier. Such records are still
    /// emitted and get rejected at write time.
    pub reference_id: Option<String>,
    pub name: Option<String>,
    pub close_approach_date: NaiveDate,
    pub estimated_diameter_km: Option<f64>,
    pub velocity_km_h: Option<f64>,
    pub miss_distance_km: Option<f64>,
    pub is_potentially_hazardous: bool,
}

impl NeoRecord {
    pub fn key(&self) -> (Option<&str>, NaiveDate) {
        (self.reference_id.as_deref(), self.close_approach_date)
    }

    /// Short label for log lines.
    pub fn label(&self) -> String {
        format!(
            "{}@{}",
            self.reference_id.as_deref().unwrap_or("<missing id>"),
            self.close_approach_date
        )
    }
}
