//! Error types for the globe-geometry crate.

use std::fmt;

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when solving geodesics.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Vincenty's inverse formula did not settle within the iteration cap.
    GeodesicNoConvergence {
        /// Number of iterations performed before giving up.
        iterations: usize,
        /// Change in longitude on the sphere between the last two iterations.
        residual: f64,
    },
    /// The endpoints are too close to antipodal for the inverse formula.
    NearlyAntipodal {
        /// Angle between the endpoints' surface normals, in radians.
        angle: f64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::GeodesicNoConvergence {
                iterations,
                residual,
            } => {
                write!(
                    f,
                    "geodesic did not converge after {iterations} iterations (residual {residual:e})"
                )
            }
            Error::NearlyAntipodal { angle } => {
                write!(
                    f,
                    "geodesic endpoints are nearly antipodal ({angle} rad apart)"
                )
            }
        }
    }
}

impl std::error::Error for Error {}
