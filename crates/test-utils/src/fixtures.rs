//! Common fixtures for field engine tests.

/// Common bounding boxes.
pub mod bounds {
    use field_common::GeoBounds;

    /// Sweden and surroundings, the original deployment area.
    pub const SWEDEN: GeoBounds = GeoBounds::new(55.0, 10.5, 69.5, 24.5);

    /// One-degree box around Stockholm.
    pub const STOCKHOLM: GeoBounds = GeoBounds::new(59.0, 17.5, 60.0, 18.5);

    /// Box used by the closed-form IDW case.
    pub const IDW_CASE: GeoBounds = GeoBounds::new(59.0, 14.0, 62.0, 17.0);

    /// Box with no stations anywhere near the fixtures.
    pub const EMPTY_OCEAN: GeoBounds = GeoBounds::new(-40.0, -30.0, -30.0, -20.0);
}

/// Reference times.
pub mod time {
    use chrono::{DateTime, Utc};

    /// Reference "now" used by feed fixtures.
    pub const REFERENCE_TIME: &str = "2024-01-15T12:00:00Z";

    pub fn reference_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(REFERENCE_TIME)
            .expect("valid reference time")
            .with_timezone(&Utc)
    }
}

/// Observation feed documents.
pub mod feed {
    /// Five records relative to [`super::time::REFERENCE_TIME`]:
    /// two fresh, one stale (3 hours old), one without a value and one
    /// without a timestamp.
    pub const MIXED_FEED: &str = r#"[
        {"id": "kiruna", "name": "Kiruna", "lat": 67.85, "lon": 20.23, "airTemp": -21.5, "updatedAt": "2024-01-15T11:50:00Z", "source": "smhi"},
        {"id": "lund", "name": "Lund", "lat": 55.70, "lon": 13.19, "airTemp": "3.4", "updatedAt": "2024-01-15T11:30:00Z"},
        {"id": "visby", "name": "Visby", "lat": 57.64, "lon": 18.30, "airTemp": 1.0, "updatedAt": "2024-01-15T09:00:00Z"},
        {"id": "ostersund", "name": "Östersund", "lat": 63.18, "lon": 14.64, "airTemp": null, "updatedAt": "2024-01-15T11:55:00Z"},
        {"name": "Umeå", "lat": 63.83, "lon": 20.26, "airTemp": -8.0}
    ]"#;
}

/// Boundary geometry documents.
///
/// Rings are densified (24 vertices per side) so that load-time decimation
/// keeps every corner.
pub mod geojson {
    use serde_json::{json, Value};

    /// Closed counter-clockwise rectangle as GeoJSON positions.
    pub fn rectangle_ring(west: f64, south: f64, east: f64, north: f64) -> Value {
        const PER_SIDE: usize = 24;
        let corners = [(west, south), (east, south), (east, north), (west, north)];
        let mut ring = Vec::with_capacity(PER_SIDE * 4 + 1);
        for i in 0..4 {
            let (x0, y0) = corners[i];
            let (x1, y1) = corners[(i + 1) % 4];
            for k in 0..PER_SIDE {
                let t = k as f64 / PER_SIDE as f64;
                ring.push(json!([x0 + (x1 - x0) * t, y0 + (y1 - y0) * t]));
            }
        }
        ring.push(json!([west, south]));
        Value::Array(ring)
    }

    /// A single polygon feature covering lon 12..20, lat 56..66.
    pub fn square_feature() -> String {
        json!({
            "type": "Feature",
            "properties": {"name": "square"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [rectangle_ring(12.0, 56.0, 20.0, 66.0)]
            }
        })
        .to_string()
    }

    /// Square lon 0..10, lat 0..10 with a hole lon 4..6, lat 4..6, plus a
    /// separate island lon 20..22, lat 0..2, and a point feature that is
    /// ignored.
    pub fn hole_and_island() -> String {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [
                                rectangle_ring(0.0, 0.0, 10.0, 10.0),
                                rectangle_ring(4.0, 4.0, 6.0, 6.0)
                            ],
                            [
                                rectangle_ring(20.0, 0.0, 22.0, 2.0)
                            ]
                        ]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {"type": "Point", "coordinates": [5.0, 5.0]}
                }
            ]
        })
        .to_string()
    }
}
