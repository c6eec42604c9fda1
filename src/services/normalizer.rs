//! Flattens the nested feed payload into [`NeoRecord`]s.
//!
//! Pure transformation, no I/O. Rules:
//! - only the first close-approach event of an object is used
//! - with no approach event the grouping date stands in for the approach date
//! - diameter is the midpoint of the kilometre range, only when both bounds exist
//! - an empty velocity or miss-distance object reads as absent, a non-empty one
//!   without the kilometre field as `0.0`
//! - a missing hazard flag reads as `false`
//! - duplicate `(reference_id, close_approach_date)` pairs keep the first occurrence
//!
//! Any malformed date or number fails the whole call; no partial output.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use crate::error::{EtlError, EtlResult};
use crate::models::neo_feed::{FeedNumber, NeoFeedResponse, RawNeo};
use crate::models::neo_record::NeoRecord;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn normalize_feed(feed: &NeoFeedResponse) -> EtlResult<Vec<NeoRecord>> {
    normalize_objects(&feed.near_earth_objects)
}

/// Normalize a `date -> objects` grouping.
///
/// Iteration runs over grouping dates in ascending order, then objects in
/// feed order; "first occurrence" for deduplication is defined by that order.
pub fn normalize_objects(grouped: &BTreeMap<String, Vec<RawNeo>>) -> EtlResult<Vec<NeoRecord>> {
    let mut seen: HashSet<(Option<String>, NaiveDate)> = HashSet::new();
    let mut records = Vec::new();

    for (grouping_date, objects) in grouped {
        for neo in objects {
            let record = normalize_object(grouping_date, neo)?;

            if seen.insert((record.reference_id.clone(), record.close_approach_date)) {
                records.push(record);
            } else {
                tracing::debug!("Dropping duplicate record {}", record.label());
            }
        }
    }

    Ok(records)
}

fn normalize_object(grouping_date: &str, neo: &RawNeo) -> EtlResult<NeoRecord> {
    // Later approach events for the same object are intentionally ignored
    let first_approach = neo
        .close_approach_data
        .as_ref()
        .and_then(|events| events.first());

    let (raw_date, velocity_km_h, miss_distance_km) = match first_approach {
        Some(approach) => {
            let date = approach
                .close_approach_date
                .as_deref()
                .unwrap_or(grouping_date);

            // An empty sub-structure counts as absent; a non-empty one with
            // no kilometre field reads as zero
            let velocity = approach
                .relative_velocity
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| number_or_zero(v.kilometers_per_hour.as_ref(), "kilometers_per_hour"))
                .transpose()?;

            let distance = approach
                .miss_distance
                .as_ref()
                .filter(|d| !d.is_empty())
                .map(|d| number_or_zero(d.kilometers.as_ref(), "kilometers"))
                .transpose()?;

            (date, velocity, distance)
        }
        None => (grouping_date, None, None),
    };

    let close_approach_date = parse_feed_date(raw_date)?;

    let diameter_range = neo
        .estimated_diameter
        .as_ref()
        .and_then(|d| d.kilometers.as_ref());

    let estimated_diameter_km = match diameter_range {
        Some(range) => match (&range.estimated_diameter_min, &range.estimated_diameter_max) {
            (Some(min), Some(max)) => {
                let min = to_f64(min, "estimated_diameter_min")?;
                let max = to_f64(max, "estimated_diameter_max")?;
                Some((min + max) / 2.0)
            }
            _ => None,
        },
        None => None,
    };

    Ok(NeoRecord {
        reference_id: neo.id.clone(),
        name: neo.name.clone(),
        close_approach_date,
        estimated_diameter_km,
        velocity_km_h,
        miss_distance_km,
        is_potentially_hazardous: neo.is_potentially_hazardous_asteroid.unwrap_or(false),
    })
}

pub fn parse_feed_date(raw: &str) -> EtlResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| EtlError::Parse(format!("invalid close approach date '{}': {}", raw, e)))
}

fn number_or_zero(value: Option<&FeedNumber>, field: &str) -> EtlResult<f64> {
    match value {
        Some(number) => to_f64(number, field),
        None => Ok(0.0),
    }
}

fn to_f64(value: &FeedNumber, field: &str) -> EtlResult<f64> {
    value
        .to_f64()
        .map_err(|e| EtlError::Parse(format!("{}: {}", field, e)))
}
