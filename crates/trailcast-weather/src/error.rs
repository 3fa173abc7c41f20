//! Store-level error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by [`crate::ForecastStore`].
///
/// Unknown locations are not errors; those calls degrade to no-ops.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Io { .. } => "Saved locations could not be updated. Please try again.",
            Self::Serialize(_) => "Location data could not be saved.",
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Rejected coordinate input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Coordinates must be finite numbers")]
    NotFinite,

    #[error("Latitude must be within -90 to 90, got {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude must be within -180 to 180, got {0}")]
    LongitudeOutOfRange(f64),
}
