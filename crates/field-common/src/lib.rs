//! Common types shared across the station-field crates.

pub mod bounds;
pub mod color;
pub mod error;
pub mod observation;

pub use bounds::{lerp, BoundsParseError, GeoBounds};
pub use color::{Rgba, ColorParseError};
pub use error::{FieldError, FieldResult};
pub use observation::{ingest, summarize, FieldSummary, Observation, StationExtreme, StationRecord};
