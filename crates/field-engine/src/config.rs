//! Configuration for the field engine.

use std::path::Path;

use field_common::{FieldError, FieldResult};
use serde::{Deserialize, Serialize};

/// Inverse-distance-weighting parameters.
///
/// Serialized with the camelCase keys used on the compute channel wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationParams {
    /// Maximum distance in degrees for a candidate to contribute.
    pub radius: f64,

    /// Candidate count the spatial index tries to reach.
    pub max_candidates: usize,

    /// Distance exponent.
    pub power: f64,

    /// Added to every distance before the exponent is applied.
    pub softening: f64,
}

impl Default for InterpolationParams {
    fn default() -> Self {
        Self {
            radius: 2.8,
            max_candidates: 34,
            power: 0.75,
            softening: 0.18,
        }
    }
}

impl InterpolationParams {
    pub fn validate(&self) -> FieldResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(FieldError::invalid_parameter("radius", "must be finite and > 0"));
        }
        if self.max_candidates == 0 {
            return Err(FieldError::invalid_parameter("max_candidates", "must be > 0"));
        }
        if !(self.power.is_finite() && self.power > 0.0) {
            return Err(FieldError::invalid_parameter("power", "must be finite and > 0"));
        }
        if !(self.softening.is_finite() && self.softening >= 0.0) {
            return Err(FieldError::invalid_parameter("softening", "must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Spatial index layout. Fixed when a snapshot is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Bins per degree along each axis.
    pub bins_per_degree: f64,

    /// Largest Chebyshev ring searched around the query cell.
    pub max_rings: u32,

    /// Squared distance under which a candidate counts as coincident.
    pub coincidence_epsilon: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bins_per_degree: 2.0,
            max_rings: 6,
            coincidence_epsilon: 1e-12,
        }
    }
}

/// Sampling quality for one zoom band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfile {
    /// Block size in offscreen pixels.
    pub grid_step: u32,

    /// Divisor from view pixels to offscreen pixels.
    pub downscale: f64,
}

/// Zoom-adaptive quality selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Zoom level from which the `near` profile applies.
    pub near_zoom: u8,
    pub near: QualityProfile,
    pub far: QualityProfile,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            near_zoom: 9,
            near: QualityProfile {
                grid_step: 5,
                downscale: 1.55,
            },
            far: QualityProfile {
                grid_step: 6,
                downscale: 1.85,
            },
        }
    }
}

impl QualityConfig {
    /// Profile for a zoom level.
    pub fn for_zoom(&self, zoom: u8) -> QualityProfile {
        if zoom >= self.near_zoom {
            self.near
        } else {
            self.far
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub index: IndexConfig,

    pub idw: InterpolationParams,

    pub quality: QualityConfig,

    /// Smallest raster edge the sampler evaluates, in pixels.
    pub min_raster_size: usize,

    /// Smallest offscreen edge the scheduler requests, in pixels.
    pub min_offscreen_size: usize,

    /// Smallest block size.
    pub min_grid_step: u32,

    /// Readings older than this are left out of the field.
    pub stale_minutes: i64,

    /// Value mapped to the first ramp stop.
    pub domain_min: f64,

    /// Value mapped to the last ramp stop.
    pub domain_max: f64,

    /// Opacity of filled pixels, 0..=1.
    pub fill_alpha: f32,

    /// Gaussian blur radius in display pixels; 0 disables the soft pass.
    pub blur_radius: f32,

    /// Alpha of the sharp frame drawn over the blurred one.
    pub overlay_alpha: f32,

    /// Opacity of the whole field layer on the display.
    pub layer_opacity: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index: IndexConfig::default(),
            idw: InterpolationParams::default(),
            quality: QualityConfig::default(),
            min_raster_size: 240,
            min_offscreen_size: 300,
            min_grid_step: 3,
            stale_minutes: 90,
            domain_min: -40.0,
            domain_max: 40.0,
            fill_alpha: 0.80,
            blur_radius: 14.0,
            overlay_alpha: 0.92,
            layer_opacity: 0.72,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `FIELD_*` environment variables.
    ///
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = parsed("FIELD_BINS_PER_DEGREE") {
            self.index.bins_per_degree = v;
        }
        if let Some(v) = parsed("FIELD_MAX_RINGS") {
            self.index.max_rings = v;
        }
        if let Some(v) = parsed("FIELD_IDW_RADIUS") {
            self.idw.radius = v;
        }
        if let Some(v) = parsed("FIELD_IDW_MAX_CANDIDATES") {
            self.idw.max_candidates = v;
        }
        if let Some(v) = parsed("FIELD_IDW_POWER") {
            self.idw.power = v;
        }
        if let Some(v) = parsed("FIELD_IDW_SOFTENING") {
            self.idw.softening = v;
        }
        if let Some(v) = parsed("FIELD_STALE_MINUTES") {
            self.stale_minutes = v;
        }
        if let Some(v) = parsed("FIELD_DOMAIN_MIN") {
            self.domain_min = v;
        }
        if let Some(v) = parsed("FIELD_DOMAIN_MAX") {
            self.domain_max = v;
        }
        if let Some(v) = parsed("FIELD_FILL_ALPHA") {
            self.fill_alpha = v;
        }
        if let Some(v) = parsed("FIELD_BLUR_RADIUS") {
            self.blur_radius = v;
        }
        if let Some(v) = parsed("FIELD_LAYER_OPACITY") {
            self.layer_opacity = v;
        }
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> FieldResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| FieldError::ConfigError(format!("Invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> FieldResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FieldError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> FieldResult<()> {
        self.idw.validate()?;

        if !(self.index.bins_per_degree.is_finite() && self.index.bins_per_degree > 0.0) {
            return Err(FieldError::invalid_parameter(
                "bins_per_degree",
                "must be finite and > 0",
            ));
        }
        if !(self.index.coincidence_epsilon >= 0.0) {
            return Err(FieldError::invalid_parameter("coincidence_epsilon", "must be >= 0"));
        }
        for (name, profile) in [("near", self.quality.near), ("far", self.quality.far)] {
            if profile.grid_step == 0 {
                return Err(FieldError::invalid_parameter(
                    format!("quality.{}.grid_step", name),
                    "must be > 0",
                ));
            }
            if !(profile.downscale.is_finite() && profile.downscale >= 1.0) {
                return Err(FieldError::invalid_parameter(
                    format!("quality.{}.downscale", name),
                    "must be >= 1",
                ));
            }
        }
        if self.min_raster_size < 2 {
            return Err(FieldError::invalid_parameter("min_raster_size", "must be >= 2"));
        }
        if self.min_grid_step == 0 {
            return Err(FieldError::invalid_parameter("min_grid_step", "must be > 0"));
        }
        if self.stale_minutes < 0 {
            return Err(FieldError::invalid_parameter("stale_minutes", "must be >= 0"));
        }
        if !(self.domain_min.is_finite() && self.domain_max.is_finite())
            || self.domain_max < self.domain_min
        {
            return Err(FieldError::invalid_parameter(
                "domain",
                "domain_min and domain_max must be finite with min <= max",
            ));
        }
        for (name, value) in [
            ("fill_alpha", self.fill_alpha),
            ("overlay_alpha", self.overlay_alpha),
            ("layer_opacity", self.layer_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(FieldError::invalid_parameter(name, "must be within 0..=1"));
            }
        }
        if !(self.blur_radius.is_finite() && self.blur_radius >= 0.0) {
            return Err(FieldError::invalid_parameter("blur_radius", "must be finite and >= 0"));
        }

        Ok(())
    }

    /// Freshness window as a chrono duration.
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.stale_minutes)
    }

    /// Fill alpha as an 8-bit channel value.
    pub fn fill_alpha_u8(&self) -> u8 {
        (self.fill_alpha.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}
