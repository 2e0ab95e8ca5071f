//! Station observations and feed ingest.
//!
//! The observation feed delivers a full list of [`StationRecord`]s on every
//! refresh. [`ingest`] turns one delivery into the immutable snapshot of
//! [`Observation`]s the engine indexes; nothing is merged with the previous
//! delivery.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// A single ingested station reading. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
    /// When the station reported; `None` when the feed omitted it.
    pub observed_at: Option<DateTime<Utc>>,
}

impl Observation {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64, value: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            value,
            observed_at: None,
        }
    }

    pub fn with_observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = Some(observed_at);
        self
    }
}

/// Raw station record as delivered by the observation feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    pub lat: f64,

    pub lon: f64,

    /// Air temperature; the feed sends numbers or numeric strings.
    #[serde(default, deserialize_with = "lenient_number")]
    pub air_temp: Option<f64>,

    /// RFC 3339 timestamp of the reading.
    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub source: Option<String>,
}

impl StationRecord {
    /// Finite reading value, if any.
    pub fn value(&self) -> Option<f64> {
        self.air_temp.filter(|v| v.is_finite())
    }

    /// Parsed reading time. Unparseable timestamps are treated as absent.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Whole minutes since the reading; 0 when the time is unknown.
    pub fn minutes_since(&self, now: DateTime<Utc>) -> i64 {
        self.observed_at()
            .map(|t| (now - t).num_minutes())
            .unwrap_or(0)
    }

    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.minutes_since(now) > stale_after.num_minutes()
    }

    fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(v)) => Some(v),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Build the observation snapshot for one feed delivery.
///
/// Records without a finite value or with non-finite coordinates are
/// dropped, as are readings older than `stale_after`.
pub fn ingest(records: &[StationRecord], now: DateTime<Utc>, stale_after: Duration) -> Vec<Observation> {
    let mut dropped_invalid = 0usize;
    let mut dropped_stale = 0usize;

    let observations: Vec<Observation> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let Some(value) = record.value() else {
                dropped_invalid += 1;
                return None;
            };
            if !record.lat.is_finite() || !record.lon.is_finite() {
                dropped_invalid += 1;
                return None;
            }
            if record.is_stale(now, stale_after) {
                dropped_stale += 1;
                return None;
            }

            Some(Observation {
                id: record
                    .id
                    .clone()
                    .or_else(|| record.name.clone())
                    .unwrap_or_else(|| format!("station-{}", index)),
                lat: record.lat,
                lon: record.lon,
                value,
                observed_at: record.observed_at(),
            })
        })
        .collect();

    debug!(
        records = records.len(),
        kept = observations.len(),
        dropped_invalid,
        dropped_stale,
        "Ingested observation snapshot"
    );

    observations
}

/// A named station reading used for extremes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationExtreme {
    pub name: String,
    pub value: f64,
}

/// Freshness and extremes over one feed delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    /// Every record in the delivery.
    pub total: usize,
    /// Records with a finite value reported within the freshness window.
    pub fresh: usize,
    /// Records with a finite value older than the freshness window.
    pub stale: usize,
    /// Warmest fresh station.
    pub warmest: Option<StationExtreme>,
    /// Coldest fresh station.
    pub coldest: Option<StationExtreme>,
    /// Most recent reading time across all records with a value.
    pub newest: Option<DateTime<Utc>>,
}

/// Summarize a delivery for the status collaborator.
pub fn summarize(records: &[StationRecord], now: DateTime<Utc>, stale_after: Duration) -> FieldSummary {
    let mut summary = FieldSummary {
        total: records.len(),
        ..FieldSummary::default()
    };

    for record in records {
        let Some(value) = record.value() else {
            continue;
        };

        if record.is_stale(now, stale_after) {
            summary.stale += 1;
        } else {
            summary.fresh += 1;

            if summary.coldest.as_ref().map_or(true, |c| value < c.value) {
                summary.coldest = Some(StationExtreme {
                    name: record.display_name(),
                    value,
                });
            }
            if summary.warmest.as_ref().map_or(true, |w| value > w.value) {
                summary.warmest = Some(StationExtreme {
                    name: record.display_name(),
                    value,
                });
            }
        }

        if let Some(t) = record.observed_at() {
            if summary.newest.map_or(true, |n| t > n) {
                summary.newest = Some(t);
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_lenient_air_temp() {
        let json = r#"[
            {"name": "Kiruna", "lat": 67.85, "lon": 20.23, "airTemp": -21.5},
            {"name": "Lund", "lat": 55.7, "lon": 13.2, "airTemp": "3.4"},
            {"name": "Broken", "lat": 60.0, "lon": 15.0, "airTemp": "n/a"},
            {"name": "Missing", "lat": 60.0, "lon": 15.0}
        ]"#;
        let records: Vec<StationRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].value(), Some(-21.5));
        assert_eq!(records[1].value(), Some(3.4));
        assert_eq!(records[2].value(), None);
        assert_eq!(records[3].value(), None);
    }

    #[test]
    fn test_unknown_time_counts_as_fresh() {
        let record = StationRecord {
            lat: 60.0,
            lon: 15.0,
            air_temp: Some(1.0),
            updated_at: Some("not a time".into()),
            ..Default::default()
        };
        assert_eq!(record.minutes_since(now()), 0);
        assert!(!record.is_stale(now(), Duration::minutes(90)));
    }
}
