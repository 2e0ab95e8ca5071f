//! Boundary polygons and clipping of field frames.
//!
//! Polygons come from GeoJSON and are decimated on load. Clipping is an
//! even-odd scanline pass over the colorized frame: every pixel outside the
//! union of all rings of all polygons becomes transparent.

use std::path::Path;

use field_common::{lerp, FieldError, FieldResult};
use serde_json::Value;
use tracing::{debug, warn};

use crate::frame::FieldFrame;

/// A `(lon, lat)` vertex.
pub type Vertex = (f64, f64);

/// Vertex stride used when decimating a ring of `len` points.
pub fn decimation_step(len: usize) -> usize {
    match len {
        n if n > 8000 => 14,
        n if n > 3000 => 10,
        n if n > 1200 => 6,
        n if n > 600 => 4,
        _ => 2,
    }
}

/// Keep every `step`-th vertex and re-close the ring.
///
/// Rings shorter than four vertices are returned unchanged.
pub fn decimate_ring(ring: &[Vertex], step: usize) -> Vec<Vertex> {
    if ring.len() < 4 {
        return ring.to_vec();
    }

    let mut out: Vec<Vertex> = ring.iter().step_by(step.max(1)).copied().collect();
    let first = out[0];
    if out.last() != Some(&first) {
        out.push(first);
    }
    out
}

/// One polygon: outer ring and holes, all decimated and closed.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    pub rings: Vec<Vec<Vertex>>,
}

impl BoundaryPolygon {
    /// Decimate raw rings into a polygon.
    pub fn from_rings(rings: Vec<Vec<Vertex>>) -> Self {
        let rings = rings
            .into_iter()
            .map(|ring| {
                let step = decimation_step(ring.len());
                decimate_ring(&ring, step)
            })
            .collect();
        Self { rings }
    }

    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }
}

/// Parse polygons from a GeoJSON document.
///
/// Accepts a `FeatureCollection`, `Feature`, `Polygon` or `MultiPolygon`.
/// Features with other geometry types are skipped.
pub fn polygons_from_geojson(json: &str) -> FieldResult<Vec<BoundaryPolygon>> {
    let doc: Value = serde_json::from_str(json)
        .map_err(|e| FieldError::BoundaryUnavailable(format!("Invalid GeoJSON: {}", e)))?;

    let mut polygons = Vec::new();
    collect_polygons(&doc, &mut polygons)?;

    if polygons.is_empty() {
        return Err(FieldError::BoundaryUnavailable(
            "GeoJSON contains no polygons".to_string(),
        ));
    }

    debug!(
        polygons = polygons.len(),
        vertices = polygons.iter().map(BoundaryPolygon::vertex_count).sum::<usize>(),
        "Loaded boundary"
    );
    Ok(polygons)
}

/// Read and parse a GeoJSON boundary file.
pub fn polygons_from_file(path: impl AsRef<Path>) -> FieldResult<Vec<BoundaryPolygon>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        FieldError::BoundaryUnavailable(format!("Failed to read {}: {}", path.display(), e))
    })?;
    polygons_from_geojson(&text)
}

/// Load a boundary, logging and returning an empty set on failure so
/// rendering continues unclipped.
pub fn load_boundary_or_unclipped(path: impl AsRef<Path>) -> Vec<BoundaryPolygon> {
    match polygons_from_file(path) {
        Ok(polygons) => polygons,
        Err(e) => {
            warn!(error = %e, "Boundary unavailable, rendering unclipped");
            Vec::new()
        }
    }
}

fn collect_polygons(node: &Value, out: &mut Vec<BoundaryPolygon>) -> FieldResult<()> {
    match node.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let features = node
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("FeatureCollection without features"))?;
            for feature in features {
                collect_polygons(feature, out)?;
            }
        }
        Some("Feature") => {
            if let Some(geometry) = node.get("geometry").filter(|g| !g.is_null()) {
                collect_polygons(geometry, out)?;
            }
        }
        Some("Polygon") => {
            out.push(BoundaryPolygon::from_rings(parse_rings(coordinates(node)?)?));
        }
        Some("MultiPolygon") => {
            let polys = coordinates(node)?
                .as_array()
                .ok_or_else(|| invalid("MultiPolygon coordinates must be an array"))?;
            for poly in polys {
                out.push(BoundaryPolygon::from_rings(parse_rings(poly)?));
            }
        }
        Some(other) => debug!(geometry = other, "Skipping non-polygon geometry"),
        None => return Err(invalid("missing 'type'")),
    }
    Ok(())
}

fn coordinates(node: &Value) -> FieldResult<&Value> {
    node.get("coordinates")
        .ok_or_else(|| invalid("geometry without coordinates"))
}

fn parse_rings(value: &Value) -> FieldResult<Vec<Vec<Vertex>>> {
    let rings = value
        .as_array()
        .ok_or_else(|| invalid("polygon coordinates must be an array of rings"))?;

    rings
        .iter()
        .map(|ring| {
            ring.as_array()
                .ok_or_else(|| invalid("ring must be an array of positions"))?
                .iter()
                .map(|pos| {
                    let lon = pos.get(0).and_then(Value::as_f64);
                    let lat = pos.get(1).and_then(Value::as_f64);
                    match (lon, lat) {
                        (Some(lon), Some(lat)) => Ok((lon, lat)),
                        _ => Err(invalid("position must be [lon, lat]")),
                    }
                })
                .collect()
        })
        .collect()
}

fn invalid(message: &str) -> FieldError {
    FieldError::BoundaryUnavailable(format!("Invalid GeoJSON: {}", message))
}

/// Clear every pixel of `frame` outside the polygons.
///
/// Pixel `(x, y)` is tested at the geographic position of its top-left
/// corner, using the same mapping the sampler uses. An empty polygon set
/// leaves the frame untouched.
pub fn apply_mask(frame: &mut FieldFrame, polygons: &[BoundaryPolygon]) {
    if polygons.is_empty() || frame.is_empty() {
        return;
    }

    let edges: Vec<(Vertex, Vertex)> = polygons
        .iter()
        .flat_map(|p| p.rings.iter())
        .filter(|ring| !ring.is_empty())
        .flat_map(|ring| {
            let n = ring.len();
            (0..n).map(move |i| (ring[(i + n - 1) % n], ring[i]))
        })
        .collect();

    let (width, height) = (frame.width, frame.height);
    let bounds = frame.bounds;
    let fx = |x: usize| if width > 1 { x as f64 / (width - 1) as f64 } else { 0.0 };
    let fy = |y: usize| if height > 1 { y as f64 / (height - 1) as f64 } else { 0.0 };

    let mut crossings: Vec<f64> = Vec::new();
    let mut cleared = 0usize;

    for y in 0..height {
        let lat = lerp(bounds.north, bounds.south, fy(y));

        crossings.clear();
        for &((lon_a, lat_a), (lon_b, lat_b)) in &edges {
            if (lat_a > lat) != (lat_b > lat) {
                crossings.push(lon_a + (lat - lat_a) * (lon_b - lon_a) / (lat_b - lat_a));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        // Pixels advance west to east, so the count of crossings to the
        // west of the pixel only grows along the row.
        let mut passed = 0usize;
        for x in 0..width {
            let lon = lerp(bounds.west, bounds.east, fx(x));
            while passed < crossings.len() && crossings[passed] < lon {
                passed += 1;
            }
            if passed % 2 == 0 {
                frame.clear_pixel(x, y);
                cleared += 1;
            }
        }
    }

    debug!(cleared, "Applied boundary mask");
}
