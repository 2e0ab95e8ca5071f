//! Memoization key for raster recomputes.

use field_common::GeoBounds;
use field_engine::{InterpolationParams, QualityProfile};

/// Decimal places kept from each bounds edge.
pub const BOUNDS_DECIMALS: u32 = 3;

/// Everything a recompute depends on.
///
/// Bounds are quantized so sub-meter jitter from the view does not force a
/// recompute. Float parameters compare by bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderSignature {
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub zoom: u8,
    pub bounds: [i64; 4],
    pub data_version: u64,
    pub grid_step: u32,
    downscale: u64,
    radius: u64,
    max_candidates: usize,
    power: u64,
    softening: u64,
    blur: u32,
}

impl RenderSignature {
    pub fn new(
        pixel_width: usize,
        pixel_height: usize,
        zoom: u8,
        bounds: &GeoBounds,
        data_version: u64,
        profile: QualityProfile,
        params: &InterpolationParams,
        blur: f32,
    ) -> Self {
        Self {
            pixel_width,
            pixel_height,
            zoom,
            bounds: bounds.quantized(BOUNDS_DECIMALS),
            data_version,
            grid_step: profile.grid_step,
            downscale: profile.downscale.to_bits(),
            radius: params.radius.to_bits(),
            max_candidates: params.max_candidates,
            power: params.power.to_bits(),
            softening: params.softening.to_bits(),
            blur: blur.to_bits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> QualityProfile {
        QualityProfile {
            grid_step: 6,
            downscale: 1.85,
        }
    }

    fn sig(bounds: GeoBounds, version: u64, params: &InterpolationParams) -> RenderSignature {
        RenderSignature::new(800, 600, 6, &bounds, version, profile(), params, 14.0)
    }

    #[test]
    fn test_bounds_jitter_ignored() {
        let params = InterpolationParams::default();
        let a = sig(GeoBounds::new(55.0, 10.5, 69.5, 24.5), 1, &params);
        let b = sig(GeoBounds::new(55.0001, 10.5002, 69.4999, 24.5001), 1, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_real_changes_detected() {
        let params = InterpolationParams::default();
        let bounds = GeoBounds::new(55.0, 10.5, 69.5, 24.5);
        let base = sig(bounds, 1, &params);

        assert_ne!(base, sig(GeoBounds::new(55.01, 10.5, 69.5, 24.5), 1, &params));
        assert_ne!(base, sig(bounds, 2, &params));

        let mut other = params;
        other.power = 1.0;
        assert_ne!(base, sig(bounds, 1, &other));

        let sharper = RenderSignature::new(800, 600, 6, &bounds, 1, profile(), &params, 0.0);
        assert_ne!(base, sharper);
    }
}
