//! Error types shared across the crate.

use thiserror::Error;

/// Failure while deriving geometric features from a mask.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// The mask has no foreground pixel (`m00 == 0`).
    #[error("degenerate mask: no foreground pixel in a {rows}x{cols} raster")]
    DegenerateMask { rows: usize, cols: usize },
    /// Contour tracing found no outer border.
    #[error("no outer contour in a {rows}x{cols} raster")]
    NoContour { rows: usize, cols: usize },
}

/// Invalid or incomplete configuration, reported before any frame is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(String),
    #[error("invalid value `{value}` for parameter `{key}`: {reason}")]
    InvalidParameter {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure of the background-subtraction detector on a frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    #[error("no background image set")]
    MissingBackground,
    #[error("frame is {frame:?} (rows, cols) but the background is {background:?}")]
    ShapeMismatch {
        frame: (usize, usize),
        background: (usize, usize),
    },
}
