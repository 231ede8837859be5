//! Error types for the globe-camera crate.

use std::fmt;

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the camera.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A geodesic needed to frame a region could not be solved.
    Geodesic(globe_geometry::Error),
    /// The viewport has a non-positive dimension.
    InvalidViewport {
        /// Requested width in pixels.
        width: f64,
        /// Requested height in pixels.
        height: f64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Geodesic(e) => write!(f, "geodesic error: {e}"),
            Error::InvalidViewport { width, height } => {
                write!(f, "invalid viewport size {width}x{height}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Geodesic(e) => Some(e),
            Error::InvalidViewport { .. } => None,
        }
    }
}

impl From<globe_geometry::Error> for Error {
    fn from(e: globe_geometry::Error) -> Self {
        Error::Geodesic(e)
    }
}
