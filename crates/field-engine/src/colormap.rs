//! Piecewise-linear color ramps.

use std::path::Path;

use field_common::{FieldError, FieldResult, Rgba};
use serde::{Deserialize, Serialize};

/// A color at a normalized position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgba,
}

impl ColorStop {
    pub fn new(t: f64, color: Rgba) -> Self {
        Self { t, color }
    }
}

/// Non-empty list of stops sorted by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

#[derive(Deserialize)]
struct RampDocument {
    stops: Vec<ColorStop>,
}

impl<'de> Deserialize<'de> for ColorRamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = RampDocument::deserialize(deserializer)?;
        ColorRamp::new(doc.stops).map_err(serde::de::Error::custom)
    }
}

impl ColorRamp {
    /// Build a ramp; stops are sorted by `t`.
    pub fn new(mut stops: Vec<ColorStop>) -> FieldResult<Self> {
        if stops.is_empty() {
            return Err(FieldError::InvalidRamp("at least one stop is required".into()));
        }
        if let Some(bad) = stops.iter().find(|s| !(0.0..=1.0).contains(&s.t)) {
            return Err(FieldError::InvalidRamp(format!(
                "stop position {} is outside 0..=1",
                bad.t
            )));
        }
        stops.sort_by(|a, b| a.t.total_cmp(&b.t));
        Ok(Self { stops })
    }

    /// Air temperature ramp: black through blue and green to yellow and red.
    pub fn temperature() -> Self {
        Self {
            stops: vec![
                ColorStop::new(0.0, Rgba::opaque(0x00, 0x00, 0x00)),
                ColorStop::new(0.25, Rgba::opaque(0x00, 0x2b, 0x7f)),
                ColorStop::new(0.4375, Rgba::opaque(0x1e, 0x6c, 0xff)),
                ColorStop::new(0.5, Rgba::opaque(0x00, 0xb0, 0x50)),
                ColorStop::new(0.75, Rgba::opaque(0xff, 0xd2, 0x00)),
                ColorStop::new(1.0, Rgba::opaque(0xc0, 0x00, 0x00)),
            ],
        }
    }

    /// Parse `{"stops": [{"t": 0.0, "color": "#000000"}, ...]}`.
    pub fn from_json(json: &str) -> FieldResult<Self> {
        serde_json::from_str(json).map_err(|e| FieldError::InvalidRamp(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> FieldResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FieldError::InvalidRamp(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at normalized position `t`. Positions outside the stops take
    /// the nearest endpoint color.
    pub fn color_at(&self, t: f64) -> Rgba {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if t <= first.t {
            return first.color;
        }
        if t >= last.t {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t >= a.t && t <= b.t {
                let span = b.t - a.t;
                let local = if span > 0.0 { (t - a.t) / span } else { 0.0 };
                return mix(a.color, b.color, local);
            }
        }

        last.color
    }

    /// Color for `value` on the domain `min..max`.
    ///
    /// A zero-width domain maps everything to the first stop; NaN is
    /// transparent.
    pub fn color_for(&self, value: f64, min: f64, max: f64) -> Rgba {
        if value.is_nan() {
            return Rgba::transparent();
        }
        let span = max - min;
        let t = if span != 0.0 {
            ((value - min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.color_at(t)
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::temperature()
    }
}

fn mix(a: Rgba, b: Rgba, t: f64) -> Rgba {
    let channel = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    Rgba::new(
        channel(a.r, b.r),
        channel(a.g, b.g),
        channel(a.b, b.b),
        channel(a.a, b.a),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_clamp() {
        let ramp = ColorRamp::temperature();
        assert_eq!(ramp.color_for(-60.0, -40.0, 40.0), Rgba::opaque(0, 0, 0));
        assert_eq!(ramp.color_for(-40.0, -40.0, 40.0), Rgba::opaque(0, 0, 0));
        assert_eq!(ramp.color_for(40.0, -40.0, 40.0), Rgba::opaque(0xc0, 0, 0));
        assert_eq!(ramp.color_for(55.0, -40.0, 40.0), Rgba::opaque(0xc0, 0, 0));
    }

    #[test]
    fn test_exact_stop() {
        let ramp = ColorRamp::temperature();
        // 0 degrees is t = 0.5
        assert_eq!(ramp.color_for(0.0, -40.0, 40.0), Rgba::opaque(0x00, 0xb0, 0x50));
    }

    #[test]
    fn test_midpoint_rounds() {
        let ramp = ColorRamp::new(vec![
            ColorStop::new(0.0, Rgba::opaque(0, 0, 0)),
            ColorStop::new(1.0, Rgba::opaque(255, 100, 1)),
        ])
        .unwrap();
        assert_eq!(ramp.color_at(0.5), Rgba::opaque(128, 50, 1));
    }

    #[test]
    fn test_zero_width_domain() {
        let ramp = ColorRamp::temperature();
        assert_eq!(ramp.color_for(12.0, 5.0, 5.0), Rgba::opaque(0, 0, 0));
    }

    #[test]
    fn test_unsorted_stops_are_sorted() {
        let ramp = ColorRamp::new(vec![
            ColorStop::new(1.0, Rgba::opaque(255, 255, 255)),
            ColorStop::new(0.0, Rgba::opaque(0, 0, 0)),
        ])
        .unwrap();
        assert_eq!(ramp.stops()[0].t, 0.0);
    }

    #[test]
    fn test_invalid_ramps() {
        assert!(ColorRamp::new(vec![]).is_err());
        assert!(ColorRamp::new(vec![ColorStop::new(1.5, Rgba::opaque(0, 0, 0))]).is_err());
        assert!(ColorRamp::from_json(r#"{"stops": []}"#).is_err());
    }
}
