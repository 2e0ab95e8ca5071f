//! Test support for the station field crates.
//!
//! Station generators, feed and boundary fixtures, temp files and a float
//! assertion that treats NaN as a failure. Pulled in as a dev-dependency:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures, station};
//! ```

pub mod files;
pub mod fixtures;
pub mod generators;

pub use files::*;
pub use generators::*;

/// Assert `|left - right| <= epsilon`, comparing as `f64`.
///
/// A NaN on either side fails the assertion.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right) = ($left as f64, $right as f64);
        let epsilon = $epsilon as f64;
        let diff = (left - right).abs();
        // NaN compares false, so the negation catches it.
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: {} ≈ {}\n  left: {:?}\n right: {:?}\n  diff: {:?} (epsilon {:?})",
                stringify!($left),
                stringify!($right),
                left,
                right,
                diff,
                epsilon
            );
        }
    }};
}
