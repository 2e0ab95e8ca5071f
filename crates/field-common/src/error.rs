//! Error types for the station-field engine.

use thiserror::Error;

/// Result type alias using FieldError.
pub type FieldResult<T> = Result<T, FieldError>;

/// Primary error type for engine operations.
///
/// None of these abort a render cycle. Missing estimates, sparse
/// neighborhoods and stale results never surface as errors at all; they
/// degrade the raster instead.
#[derive(Debug, Error)]
pub enum FieldError {
    // === Configuration Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid color ramp: {0}")]
    InvalidRamp(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // === Input Errors ===
    #[error("Failed to parse observation feed: {0}")]
    FeedError(String),

    #[error("Boundary geometry unavailable: {0}")]
    BoundaryUnavailable(String),

    // === Compute Errors ===
    #[error("Compute channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("Malformed render response: {0}")]
    MalformedResponse(String),

    #[error("Encoding failed: {0}")]
    EncodeError(String),
}

impl FieldError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether the engine can keep rendering (possibly degraded) after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FieldError::BoundaryUnavailable(_) | FieldError::ChannelUnavailable(_)
        )
    }
}
