//! Observation feed file loading.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use field_common::{ingest, summarize, FieldSummary, Observation, StationRecord};

/// One delivery of the feed, ready for the scheduler.
#[derive(Debug)]
pub struct Delivery {
    pub observations: Vec<Observation>,
    pub summary: FieldSummary,
}

/// Read a JSON array of station records.
pub fn read_records(path: &Path) -> Result<Vec<StationRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading station feed {}", path.display()))?;
    let records = serde_json::from_str(&text)
        .with_context(|| format!("parsing station feed {}", path.display()))?;
    Ok(records)
}

/// Load the feed and build the observation snapshot for `now`.
pub fn load(path: &Path, now: DateTime<Utc>, stale_after: Duration) -> Result<Delivery> {
    let records = read_records(path)?;
    Ok(Delivery {
        observations: ingest(&records, now, stale_after),
        summary: summarize(&records, now, stale_after),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{fixtures, temp_file_with};

    #[test]
    fn test_load_mixed_feed() {
        let file = temp_file_with(fixtures::feed::MIXED_FEED, ".json");
        let delivery = load(
            file.path(),
            fixtures::time::reference_time(),
            Duration::minutes(90),
        )
        .unwrap();

        // kiruna, lund and the untimed umeå reading survive
        assert_eq!(delivery.observations.len(), 3);
        assert_eq!(delivery.summary.total, 5);
        assert_eq!(delivery.summary.fresh, 3);
        assert_eq!(delivery.summary.stale, 1);
        assert_eq!(delivery.summary.coldest.unwrap().name, "Kiruna");
        assert_eq!(delivery.summary.warmest.unwrap().name, "Lund");
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        let file = temp_file_with("{\"not\": \"an array\"}", ".json");
        let err = load(file.path(), Utc::now(), Duration::minutes(90)).unwrap_err();
        assert!(err.to_string().contains("parsing station feed"));
    }
}
