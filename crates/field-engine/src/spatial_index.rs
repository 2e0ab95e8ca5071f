//! Uniform-grid bucketing of observations for neighborhood queries.

use std::collections::HashMap;

use field_common::Observation;

use crate::config::IndexConfig;

/// Bin key: `(floor(lat * scale), floor(lon * scale))`.
pub type BinKey = (i64, i64);

/// Observations bucketed into square bins.
///
/// The bin scale is fixed at construction and used for both insertion and
/// query. Rebuilding means constructing a new index.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    bins: HashMap<BinKey, Vec<Observation>>,
    bins_per_degree: f64,
    max_rings: u32,
    len: usize,
}

impl SpatialIndex {
    /// Build an index over a full observation snapshot.
    pub fn build(observations: &[Observation], config: &IndexConfig) -> Self {
        let mut index = Self {
            bins: HashMap::new(),
            bins_per_degree: config.bins_per_degree,
            max_rings: config.max_rings,
            len: 0,
        };
        index.rebuild(observations);
        index
    }

    /// Discard all bins and insert every observation again.
    pub fn rebuild(&mut self, observations: &[Observation]) {
        self.bins.clear();
        self.len = 0;
        for obs in observations {
            let key = self.bin_key(obs.lat, obs.lon);
            self.bins.entry(key).or_default().push(obs.clone());
            self.len += 1;
        }
    }

    pub fn bin_key(&self, lat: f64, lon: f64) -> BinKey {
        (
            (lat * self.bins_per_degree).floor() as i64,
            (lon * self.bins_per_degree).floor() as i64,
        )
    }

    /// Candidates around `(lat, lon)`.
    ///
    /// Rings of increasing Chebyshev distance are added whole until at least
    /// `min_candidates` are collected or the ring cap is reached, so the
    /// result can be larger or smaller than requested.
    pub fn query(&self, lat: f64, lon: f64, min_candidates: usize) -> Vec<&Observation> {
        let mut out = Vec::new();
        self.query_into(lat, lon, min_candidates, &mut out);
        out
    }

    /// Like [`query`](Self::query) but reuses `out`, which is cleared first.
    pub fn query_into<'a>(
        &'a self,
        lat: f64,
        lon: f64,
        min_candidates: usize,
        out: &mut Vec<&'a Observation>,
    ) {
        out.clear();
        if self.len == 0 {
            return;
        }

        let (la, lo) = self.bin_key(lat, lon);
        for d in 0..=self.max_rings as i64 {
            self.collect_ring(la, lo, d, out);
            if out.len() >= min_candidates {
                break;
            }
        }
    }

    fn collect_ring<'a>(&'a self, la: i64, lo: i64, d: i64, out: &mut Vec<&'a Observation>) {
        let mut visit = |key: BinKey| {
            if let Some(bin) = self.bins.get(&key) {
                out.extend(bin.iter());
            }
        };

        if d == 0 {
            visit((la, lo));
            return;
        }

        // Keys saturate for absurd coordinates; the ring arithmetic must too.
        let (south, north) = (la.saturating_sub(d), la.saturating_add(d));
        let (west, east) = (lo.saturating_sub(d), lo.saturating_add(d));
        for x in west..=east {
            visit((south, x));
            visit((north, x));
        }
        for y in la.saturating_sub(d - 1)..=la.saturating_add(d - 1) {
            visit((y, west));
            visit((y, east));
        }
    }

    /// Number of indexed observations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied bins.
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn bins_per_degree(&self) -> f64 {
        self.bins_per_degree
    }

    pub fn max_rings(&self) -> u32 {
        self.max_rings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(id: &str, lat: f64, lon: f64) -> Observation {
        Observation::new(id, lat, lon, 0.0)
    }

    #[test]
    fn test_bin_key_uses_floor() {
        let index = SpatialIndex::build(&[], &IndexConfig::default());
        assert_eq!(index.bin_key(60.2, 15.7), (120, 31));
        assert_eq!(index.bin_key(-0.1, -0.6), (-1, -2));
    }

    #[test]
    fn test_query_stops_after_first_sufficient_ring() {
        let stations = vec![
            obs("center", 60.1, 15.1),
            obs("ring1", 60.6, 15.1),
            obs("ring2", 61.1, 15.1),
        ];
        let index = SpatialIndex::build(&stations, &IndexConfig::default());

        let ids: Vec<_> = index.query(60.1, 15.1, 1).iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["center"]);

        let ids: Vec<_> = index.query(60.1, 15.1, 2).iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["center", "ring1"]);
    }

    #[test]
    fn test_query_never_duplicates() {
        let stations: Vec<_> = (0..20)
            .map(|i| obs(&format!("s{}", i), 60.0 + i as f64 * 0.3, 15.0))
            .collect();
        let index = SpatialIndex::build(&stations, &IndexConfig::default());

        let found = index.query(61.0, 15.0, 1000);
        let mut ids: Vec<_> = found.iter().map(|o| o.id.clone()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_extreme_coordinates_find_nothing() {
        let index = SpatialIndex::build(&[obs("a", 60.0, 15.0)], &IndexConfig::default());
        assert!(index.query(1e300, 15.0, 34).is_empty());
        assert!(index.query(60.0, -1e300, 34).is_empty());
        assert!(index.query(f64::INFINITY, f64::NEG_INFINITY, 34).is_empty());
    }

    #[test]
    fn test_ring_cap_limits_reach() {
        let stations = vec![obs("far", 70.0, 15.0)];
        let index = SpatialIndex::build(&stations, &IndexConfig::default());
        // 10 degrees is 20 bins away, beyond the 6-ring cap.
        assert!(index.query(60.0, 15.0, 1).is_empty());
    }
}
