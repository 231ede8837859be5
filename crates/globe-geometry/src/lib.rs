//! Geometry kernel for navigating a camera around an ellipsoidal globe.
//!
//! This crate provides:
//! - The [`Ellipsoid`] model with geographic conversions and local ENU frames.
//! - Ray intersection against ellipsoids and planes, including the
//!   grazing-altitude point of a ray that misses the surface.
//! - Real root finders for quadratic, cubic and quartic polynomials.
//! - The [`EllipsoidGeodesic`] solver.
//!
//! All functions are pure and synchronous. "No intersection" is reported as
//! `None` rather than a sentinel value.

pub mod ellipsoid;
pub mod error;
pub mod geodesic;
pub mod intersection;
pub mod math;
pub mod polynomial;
pub mod ray;
pub mod transforms;

pub use ellipsoid::{Cartographic, Ellipsoid, Rectangle};
pub use error::{Error, Result};
pub use geodesic::EllipsoidGeodesic;
pub use intersection::{grazing_altitude_location, ray_ellipsoid, ray_plane};
pub use polynomial::{solve_cubic, solve_quadratic, solve_quartic};
pub use ray::{Interval, Plane, Ray};
pub use transforms::east_north_up_to_fixed_frame;
