//! Synthetic station sets.
//!
//! Generators are deterministic so tests can assert on exact values.

use field_common::{GeoBounds, Observation, StationRecord};

/// A single station observation.
pub fn station(id: &str, lat: f64, lon: f64, value: f64) -> Observation {
    Observation::new(id, lat, lon, value)
}

/// Stations on a regular `rows`×`cols` lattice covering `bounds`, with
/// values from `value_at(lat, lon)`.
///
/// Stations sit at cell centers so none lies on the bounds edge.
pub fn station_lattice(
    bounds: GeoBounds,
    rows: usize,
    cols: usize,
    value_at: impl Fn(f64, f64) -> f64,
) -> Vec<Observation> {
    let mut out = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let lat = bounds.north - (r as f64 + 0.5) * bounds.height() / rows as f64;
            let lon = bounds.west + (c as f64 + 0.5) * bounds.width() / cols as f64;
            out.push(station(&format!("lattice-{}-{}", r, c), lat, lon, value_at(lat, lon)));
        }
    }
    out
}

/// Temperature-like stations: colder to the north, with a small
/// east-west wobble. Values stay within -30..20.
pub fn temperature_stations(bounds: GeoBounds, rows: usize, cols: usize) -> Vec<Observation> {
    station_lattice(bounds, rows, cols, |lat, lon| {
        let north = (lat - bounds.south) / bounds.height().max(f64::EPSILON);
        20.0 - 45.0 * north + (lon * 0.7).sin() * 5.0
    })
}

/// Pseudo-randomly scattered stations inside `bounds`.
///
/// Values range over -30..30.
pub fn scattered_stations(bounds: GeoBounds, count: usize, seed: u32) -> Vec<Observation> {
    (0..count)
        .map(|i| {
            let i = i as u32;
            let fx = unit(simple_hash(i, 0, seed));
            let fy = unit(simple_hash(i, 1, seed));
            let fv = unit(simple_hash(i, 2, seed));
            station(
                &format!("scatter-{}", i),
                bounds.south + fy * bounds.height(),
                bounds.west + fx * bounds.width(),
                -30.0 + fv * 60.0,
            )
        })
        .collect()
}

/// Feed records for a set of observations, all stamped with `updated_at`.
pub fn station_records(observations: &[Observation], updated_at: &str) -> Vec<StationRecord> {
    observations
        .iter()
        .map(|o| StationRecord {
            id: Some(o.id.clone()),
            name: Some(o.id.clone()),
            lat: o.lat,
            lon: o.lon,
            air_temp: Some(o.value),
            updated_at: Some(updated_at.to_string()),
            source: Some("synthetic".to_string()),
        })
        .collect()
}

fn unit(h: u32) -> f64 {
    h as f64 / u32::MAX as f64
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
