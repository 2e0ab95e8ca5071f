//! Inverse-distance-weighted estimation.
//!
//! Distances are planar in degree space, so east-west distances are
//! overstated at high latitudes.

use field_common::Observation;

use crate::config::InterpolationParams;

/// IDW estimate at `(lat, lon)` from a candidate set.
///
/// A candidate whose squared distance is below `epsilon` is returned
/// directly. Otherwise every candidate within `params.radius` contributes
/// with weight `1 / (d + softening)^power`. Returns `None` when nothing is
/// within the radius.
pub fn idw_estimate(
    candidates: &[&Observation],
    lat: f64,
    lon: f64,
    params: &InterpolationParams,
    epsilon: f64,
) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for obs in candidates {
        let dlat = obs.lat - lat;
        let dlon = obs.lon - lon;
        let d2 = dlat * dlat + dlon * dlon;
        if d2 < epsilon {
            return Some(obs.value);
        }

        let d = d2.sqrt();
        if d > params.radius {
            continue;
        }

        let w = 1.0 / (d + params.softening).powf(params.power);
        weighted_sum += w * obs.value;
        weight_total += w;
    }

    if weight_total > 0.0 {
        Some(weighted_sum / weight_total)
    } else {
        None
    }
}
