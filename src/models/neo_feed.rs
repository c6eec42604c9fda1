use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level body of `GET /feed`.
///
/// Objects are grouped under the calendar date (`YYYY-MM-DD`) of their
/// approach. The grouping keys sort chronologically, so a `BTreeMap` gives a
/// stable iteration order regardless of how the feed ordered its keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeoFeedResponse {
    #[serde(default)]
    pub element_count: Option<u64>,
    #[serde(default)]
    pub near_earth_objects: BTreeMap<String, Vec<RawNeo>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNeo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub close_approach_data: Option<Vec<RawCloseApproach>>,
    #[serde(default)]
    pub estimated_diameter: Option<RawEstimatedDiameter>,
    #[serde(default)]
    pub is_potentially_hazardous_asteroid: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCloseApproach {
    #[serde(default)]
    pub close_approach_date: Option<String>,
    #[serde(default)]
    pub relative_velocity: Option<RawVelocity>,
    #[serde(default)]
    pub miss_distance: Option<RawDistance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVelocity {
    #[serde(default)]
    pub kilometers_per_hour: Option<FeedNumber>,
    /// Remaining units (`miles_per_hour`, ...)
    #[serde(flatten)]
    pub other_units: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDistance {
    #[serde(default)]
    pub kilometers: Option<FeedNumber>,
    #[serde(flatten)]
    pub other_units: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEstimatedDiameter {
    #[serde(default)]
    pub kilometers: Option<RawDiameterRange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDiameterRange {
    #[serde(default)]
    pub estimated_diameter_min: Option<FeedNumber>,
    #[serde(default)]
    pub estimated_diameter_max: Option<FeedNumber>,
}

/// The feed sends velocities and distances as decimal strings and diameters
/// as JSON numbers. Both shapes are accepted everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedNumber {
    Number(f64),
    Text(String),
}

impl FeedNumber {
    pub fn to_f64(&self) -> Result<f64, String> {
        match self {
            FeedNumber::Number(value) => Ok(*value),
            FeedNumber::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid number '{}': {}", raw, e)),
        }
    }
}

impl RawVelocity {
    pub fn is_empty(&self) -> bool {
        self.kilometers_per_hour.is_none() && self.other_units.is_empty()
    }
}

impl RawDistance {
    pub fn is_empty(&self) -> bool {
        self.kilometers.is_none() && self.other_units.is_empty()
    }
}

impl NeoFeedResponse {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Total objects across all grouping dates.
    pub fn object_count(&self) -> usize {
        self.near_earth_objects.values().map(Vec::len).sum()
    }
}
