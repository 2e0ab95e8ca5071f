//! Tests for GeoBounds parsing, validation and pixel mapping.

use field_common::bounds::{BoundsParseError, GeoBounds};

// ============================================================================
// from_query_string tests
// ============================================================================

#[test]
fn test_parse_query_string_negative() {
    let b = GeoBounds::from_query_string("-90,-180,90,180").unwrap();
    assert_eq!(b.south, -90.0);
    assert_eq!(b.west, -180.0);
    assert_eq!(b.north, 90.0);
    assert_eq!(b.east, 180.0);
}

#[test]
fn test_parse_query_string_tolerates_spaces() {
    let b = GeoBounds::from_query_string(" 55.0, 10.0 ,70.0,25.0 ").unwrap();
    assert_eq!(b.west, 10.0);
    assert_eq!(b.east, 25.0);
}

#[test]
fn test_parse_query_string_too_few() {
    let result = GeoBounds::from_query_string("55,10,70");
    assert!(matches!(result, Err(BoundsParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_query_string_invalid_number() {
    let result = GeoBounds::from_query_string("abc,10,70,25");
    assert!(matches!(result, Err(BoundsParseError::InvalidNumber(_))));
}

#[test]
fn test_parse_query_string_inverted() {
    let result = GeoBounds::from_query_string("70,10,55,25");
    assert!(matches!(result, Err(BoundsParseError::Inverted(_))));
}

// ============================================================================
// Geometry tests
// ============================================================================

#[test]
fn test_extent() {
    let b = GeoBounds::new(55.0, 10.0, 70.0, 25.0);
    assert_eq!(b.width(), 15.0);
    assert_eq!(b.height(), 15.0);
}

#[test]
fn test_contains() {
    let b = GeoBounds::new(55.0, 10.0, 70.0, 25.0);
    assert!(b.contains(60.0, 15.0));
    assert!(b.contains(55.0, 10.0));
    assert!(!b.contains(54.9, 15.0));
    assert!(!b.contains(60.0, 25.1));
}

#[test]
fn test_is_valid_rejects_nan() {
    assert!(!GeoBounds::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
    assert!(GeoBounds::new(0.0, 0.0, 0.0, 0.0).is_valid());
}

#[test]
fn test_pixel_midpoint() {
    let b = GeoBounds::new(60.0, 10.0, 70.0, 20.0);
    let (lat, lon) = b.pixel_to_lat_lon(50.0, 50.0, 101, 101);
    assert!((lat - 65.0).abs() < 1e-12);
    assert!((lon - 15.0).abs() < 1e-12);
}

#[test]
fn test_pixel_single_column_collapses_to_edge() {
    let b = GeoBounds::new(60.0, 10.0, 70.0, 20.0);
    let (lat, lon) = b.pixel_to_lat_lon(0.0, 0.0, 1, 1);
    assert_eq!((lat, lon), (70.0, 10.0));
}

#[test]
fn test_quantized_is_stable_under_jitter() {
    let a = GeoBounds::new(55.00001, 10.00002, 70.0, 25.0);
    let b = GeoBounds::new(55.00004, 10.00001, 70.0, 25.0);
    assert_eq!(a.quantized(3), b.quantized(3));
    assert_ne!(a.quantized(3), GeoBounds::new(55.01, 10.0, 70.0, 25.0).quantized(3));
}

#[test]
fn test_wire_keys() {
    let b = GeoBounds::new(1.0, 2.0, 3.0, 4.0);
    let json = serde_json::to_value(b).unwrap();
    assert_eq!(json, serde_json::json!({"s": 1.0, "w": 2.0, "n": 3.0, "e": 4.0}));
}

#[test]
fn test_lerp_from_crate_root() {
    assert_eq!(field_common::lerp(10.0, 20.0, 0.0), 10.0);
    assert_eq!(field_common::lerp(10.0, 20.0, 0.25), 12.5);
    assert_eq!(field_common::lerp(69.5, 55.0, 1.0), 55.0);
}
