//! Boundary loading and frame clipping.

use field_common::{FieldError, GeoBounds, Rgba};
use field_engine::{
    apply_mask, decimate_ring, decimation_step, load_boundary_or_unclipped, polygons_from_file,
    polygons_from_geojson, FieldFrame, Vertex,
};
use test_utils::{fixtures, temp_file_with};

fn opaque_frame(bounds: GeoBounds, width: usize, height: usize) -> FieldFrame {
    let mut frame = FieldFrame::transparent(width, height, bounds);
    frame.rgba.chunks_exact_mut(4).for_each(|px| px.copy_from_slice(&[10, 20, 30, 204]));
    frame
}

/// Pixel whose top-left corner maps to `(lat, lon)` on a frame.
fn pixel_at(frame: &FieldFrame, lat: f64, lon: f64) -> Option<Rgba> {
    let b = frame.bounds;
    let x = ((lon - b.west) / b.width() * (frame.width - 1) as f64).round() as usize;
    let y = ((b.north - lat) / b.height() * (frame.height - 1) as f64).round() as usize;
    frame.pixel(x, y)
}

#[test]
fn test_decimated_rings_are_closed() {
    for n in [4usize, 5, 9, 601, 1201, 3001, 8001, 9000] {
        let ring: Vec<Vertex> = (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                (a.cos(), a.sin())
            })
            .collect();
        let out = decimate_ring(&ring, decimation_step(n));
        assert_eq!(out.first(), out.last(), "ring of {} not closed", n);
        assert!(out.len() <= n / 2 + 2);
    }
}

#[test]
fn test_already_closed_ring_not_doubled() {
    let ring: Vec<Vertex> = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)];
    // Stride 2 keeps indices 0, 2 and 4, which already closes the ring.
    assert_eq!(
        decimate_ring(&ring, 2),
        vec![(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]
    );
}

#[test]
fn test_load_multipolygon_collection() {
    let polygons = polygons_from_geojson(&fixtures::geojson::hole_and_island()).unwrap();
    assert_eq!(polygons.len(), 2);
    assert_eq!(polygons[0].rings.len(), 2);
    assert_eq!(polygons[1].rings.len(), 1);
    for ring in polygons.iter().flat_map(|p| &p.rings) {
        assert_eq!(ring.first(), ring.last());
    }
}

#[test]
fn test_even_odd_clipping_with_hole_and_island() {
    let polygons = polygons_from_geojson(&fixtures::geojson::hole_and_island()).unwrap();
    let mut frame = opaque_frame(GeoBounds::new(-1.0, -1.0, 11.0, 23.0), 241, 121);
    apply_mask(&mut frame, &polygons);

    let transparent = Some(Rgba::transparent());
    let filled = Some(Rgba::new(10, 20, 30, 204));

    assert_eq!(pixel_at(&frame, 2.0, 2.0), filled);
    assert_eq!(pixel_at(&frame, 8.0, 8.5), filled);
    assert_eq!(pixel_at(&frame, 5.0, 5.0), transparent); // hole
    assert_eq!(pixel_at(&frame, 1.0, 21.0), filled); // island
    assert_eq!(pixel_at(&frame, 5.0, 15.0), transparent);
    assert_eq!(pixel_at(&frame, -0.5, 2.0), transparent);
}

#[test]
fn test_empty_polygon_set_leaves_frame_untouched() {
    let mut frame = opaque_frame(GeoBounds::new(0.0, 0.0, 1.0, 1.0), 20, 20);
    let before = frame.clone();
    apply_mask(&mut frame, &[]);
    assert_eq!(frame, before);
}

#[test]
fn test_boundary_file_roundtrip() {
    let file = temp_file_with(&fixtures::geojson::square_feature(), ".geojson");
    let polygons = polygons_from_file(file.path()).unwrap();
    assert_eq!(polygons.len(), 1);
}

#[test]
fn test_missing_boundary_is_unavailable() {
    let err = polygons_from_file("/nonexistent/boundary.geojson").unwrap_err();
    assert!(matches!(err, FieldError::BoundaryUnavailable(_)));
    assert!(err.is_recoverable());
    assert!(load_boundary_or_unclipped("/nonexistent/boundary.geojson").is_empty());
}
