//! Geographic bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
///
/// Serialized with the short `{s, w, n, e}` keys used on the compute
/// channel wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    #[serde(rename = "s")]
    pub south: f64,
    #[serde(rename = "w")]
    pub west: f64,
    #[serde(rename = "n")]
    pub north: f64,
    #[serde(rename = "e")]
    pub east: f64,
}

impl GeoBounds {
    /// Create a new bounding box from its edges.
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Parse a "south,west,north,east" string.
    pub fn from_query_string(s: &str) -> Result<Self, BoundsParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BoundsParseError::InvalidFormat(s.to_string()));
        }

        let parse = |part: &str| -> Result<f64, BoundsParseError> {
            part.trim()
                .parse()
                .map_err(|_| BoundsParseError::InvalidNumber(part.to_string()))
        };

        let bounds = Self {
            south: parse(parts[0])?,
            west: parse(parts[1])?,
            north: parse(parts[2])?,
            east: parse(parts[3])?,
        };

        if !bounds.is_valid() {
            return Err(BoundsParseError::Inverted(s.to_string()));
        }

        Ok(bounds)
    }

    /// Longitude extent in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Finite edges with north >= south and east >= west.
    pub fn is_valid(&self) -> bool {
        [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite())
            && self.north >= self.south
            && self.east >= self.west
    }

    /// Check if a point is contained within this box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// Map a pixel coordinate to (lat, lon) by straight linear interpolation.
    ///
    /// Pixel `(0, 0)` is the north-west corner and `(width-1, height-1)` the
    /// south-east corner. Rasters narrower than two pixels collapse onto the
    /// west/north edge.
    pub fn pixel_to_lat_lon(&self, x: f64, y: f64, width: usize, height: usize) -> (f64, f64) {
        let fx = if width > 1 { x / (width - 1) as f64 } else { 0.0 };
        let fy = if height > 1 { y / (height - 1) as f64 } else { 0.0 };
        let lon = lerp(self.west, self.east, fx);
        let lat = lerp(self.north, self.south, fy);
        (lat, lon)
    }

    /// Edges quantized to `decimals` decimal places, stable for use in cache keys.
    pub fn quantized(&self, decimals: u32) -> [i64; 4] {
        let scale = 10f64.powi(decimals as i32);
        [
            (self.south * scale).round() as i64,
            (self.west * scale).round() as i64,
            (self.north * scale).round() as i64,
            (self.east * scale).round() as i64,
        ]
    }
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[derive(Debug, thiserror::Error)]
pub enum BoundsParseError {
    #[error("Invalid bounds format: {0}. Expected 'south,west,north,east'")]
    InvalidFormat(String),

    #[error("Invalid number in bounds: {0}")]
    InvalidNumber(String),

    #[error("Bounds are inverted or non-finite: {0}")]
    Inverted(String),
}
