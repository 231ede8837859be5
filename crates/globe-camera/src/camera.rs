//! Camera pose in a reference frame, with lazily derived world state.
//!
//! The camera is described by a [`CameraFrame`]: a position and an
//! orthonormal triad expressed in a reference transform. The transform is
//! usually identity (the frame is ECEF) but is temporarily replaced by local
//! east-north-up frames while tilting or framing a view.
//!
//! World-space quantities (position, axes, geographic position and the
//! inverse transform) are cached. Every accessor first compares the cache
//! against the authoritative frame and transform and recomputes only what
//! changed, so no derived value is ever read stale.
//!
//! ## Axis conventions
//!
//! ```text
//! x = right      y = direction      z = up
//! ```
//!
//! Window coordinates have their origin in the top-left corner with y growing
//! downwards.

use std::f64::consts::FRAC_PI_2;

use globe_geometry::{
    Cartographic, Ellipsoid, EllipsoidGeodesic, Ray, Rectangle, east_north_up_to_fixed_frame,
    math::{
        EPSILON2, EPSILON3, EPSILON4, TWO_PI, acos_clamped, equals_epsilon,
        quaternion_from_heading_pitch_roll, vec_equals_epsilon, zero_to_two_pi,
    },
    ray_ellipsoid,
};
use glam::{DMat3, DMat4, DQuat, DVec2, DVec3};

use crate::error::Result;
use crate::frustum::{PerspectiveFrustum, Viewport};

// ============================================================================
// Frame
// ============================================================================

/// Camera position and orientation relative to the reference transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub position: DVec3,
    /// Viewing direction (local y).
    pub direction: DVec3,
    /// Up vector (local z).
    pub up: DVec3,
    /// Right vector (local x).
    pub right: DVec3,
}

impl Default for CameraFrame {
    /// Looking down at North America from roughly 12,700 km.
    fn default() -> Self {
        let direction = DVec3::new(
            -0.106_682_262_416_508_87,
            0.810_332_258_750_215,
            -0.576_177_547_487_281_4,
        )
        .normalize();
        let up = DVec3::new(
            -0.075_206_261_312_602_74,
            0.571_248_268_695_229_8,
            0.817_324_558_404_763_4,
        );
        // The stored axes are only rounded to eight digits.
        let up = (up - direction * direction.dot(up)).normalize();
        Self {
            position: DVec3::new(2_033_992.677_662_228, -15_449_708.246_605_72, 10_948_396.652_844_096),
            direction,
            up,
            right: direction.cross(up),
        }
    }
}

impl CameraFrame {
    /// Largest deviation of the triad from orthonormality.
    pub fn orthonormality_error(&self) -> f64 {
        [
            self.direction.dot(self.up).abs(),
            self.direction.dot(self.right).abs(),
            self.up.dot(self.right).abs(),
            (self.direction.length() - 1.0).abs(),
            (self.up.length() - 1.0).abs(),
            (self.right.length() - 1.0).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

/// World-space quantities derived from the frame and the transform.
#[derive(Debug, Clone, Copy)]
struct Derived {
    frame: CameraFrame,
    transform: DMat4,
    inverse_transform: DMat4,
    position_wc: DVec3,
    direction_wc: DVec3,
    up_wc: DVec3,
    right_wc: DVec3,
    cartographic: Option<Cartographic>,
}

impl Derived {
    fn compute(frame: &CameraFrame, transform: DMat4, ellipsoid: &Ellipsoid) -> Self {
        let position_wc = transform.transform_point3(frame.position);
        Self {
            frame: *frame,
            transform,
            inverse_transform: transform.inverse(),
            position_wc,
            direction_wc: transform.transform_vector3(frame.direction).normalize(),
            up_wc: transform.transform_vector3(frame.up).normalize(),
            right_wc: transform.transform_vector3(frame.right).normalize(),
            cartographic: ellipsoid.cartesian_to_cartographic(position_wc),
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Owns the camera pose and exposes primitive motion operations.
#[derive(Debug, Clone)]
pub struct CameraController {
    frame: CameraFrame,
    transform: DMat4,
    frustum: PerspectiveFrustum,
    viewport: Viewport,
    ellipsoid: Ellipsoid,
    /// Axis that vertical and horizontal rotations are constrained about.
    pub constrained_axis: Option<DVec3>,
    derived: Derived,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl CameraController {
    /// Create a camera on the WGS84 globe with the default pose.
    pub fn new(viewport: Viewport) -> Self {
        let frame = CameraFrame::default();
        let ellipsoid = Ellipsoid::WGS84;
        let frustum = PerspectiveFrustum {
            aspect_ratio: viewport.aspect_ratio(),
            ..PerspectiveFrustum::default()
        };
        Self {
            frame,
            transform: DMat4::IDENTITY,
            frustum,
            viewport,
            ellipsoid,
            constrained_axis: None,
            derived: Derived::compute(&frame, DMat4::IDENTITY, &ellipsoid),
        }
    }

    // ------------------------------------------------------------------------
    // Frame access
    // ------------------------------------------------------------------------

    pub fn frame(&self) -> &CameraFrame {
        &self.frame
    }

    pub fn set_frame(&mut self, frame: CameraFrame) {
        self.frame = frame;
    }

    /// Position in the reference frame.
    pub fn position(&self) -> DVec3 {
        self.frame.position
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.frame.position = position;
    }

    pub fn direction(&self) -> DVec3 {
        self.frame.direction
    }

    pub fn up(&self) -> DVec3 {
        self.frame.up
    }

    pub fn right(&self) -> DVec3 {
        self.frame.right
    }

    /// Replace the orientation triad.
    pub fn set_axes(&mut self, right: DVec3, direction: DVec3, up: DVec3) {
        self.frame.right = right;
        self.frame.direction = direction;
        self.frame.up = up;
    }

    pub fn transform(&self) -> DMat4 {
        self.transform
    }

    pub fn frustum(&self) -> &PerspectiveFrustum {
        &self.frustum
    }

    pub fn set_frustum(&mut self, frustum: PerspectiveFrustum) {
        self.frustum = frustum;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Resize the viewport, keeping the frustum's aspect ratio in sync.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.frustum.aspect_ratio = viewport.aspect_ratio();
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Move the camera to a geographic position, keeping its orientation.
    pub fn set_position_cartographic(&mut self, cartographic: &Cartographic) {
        let world = self.ellipsoid.cartographic_to_cartesian(cartographic);
        let inverse = self.inverse_transform();
        self.frame.position = inverse.transform_point3(world);
    }

    /// Change the reference transform without moving the camera in world space.
    pub fn set_transform(&mut self, transform: DMat4) {
        let position_wc = self.position_wc();
        let up_wc = self.up_wc();
        let direction_wc = self.direction_wc();

        self.transform = transform;
        self.update_members();

        let inverse = self.derived.inverse_transform;
        let direction = inverse.transform_vector3(direction_wc).normalize();
        let up = inverse.transform_vector3(up_wc).normalize();
        let right = direction.cross(up).normalize();

        self.frame.position = inverse.transform_point3(position_wc);
        self.set_axes(right, direction, up);

        self.update_members();
    }

    // ------------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------------

    /// Recompute whatever derived state is out of date.
    fn update_members(&mut self) {
        let transform_changed = self.derived.transform != self.transform;
        if transform_changed {
            self.derived.transform = self.transform;
            self.derived.inverse_transform = self.transform.inverse();
        }

        let position_changed = self.derived.frame.position != self.frame.position;
        let direction_changed = self.derived.frame.direction != self.frame.direction;
        let mut up_changed = self.derived.frame.up != self.frame.up;
        let mut right_changed = self.derived.frame.right != self.frame.right;

        if position_changed || transform_changed {
            self.derived.frame.position = self.frame.position;
            self.derived.position_wc = self.transform.transform_point3(self.frame.position);
            self.derived.cartographic = self
                .ellipsoid
                .cartesian_to_cartographic(self.derived.position_wc);
        }

        if direction_changed || up_changed || right_changed {
            let frame = &mut self.frame;
            let det = frame.direction.dot(frame.up.cross(frame.right));
            if (1.0 - det).abs() > EPSILON2 {
                let scalar = frame.up.dot(frame.direction) / frame.up.length_squared();
                frame.up = (frame.up - frame.direction * scalar).normalize();
                frame.right = frame.direction.cross(frame.up).normalize();
                up_changed = true;
                right_changed = true;
            }
        }

        let transform = self.transform;
        if direction_changed || transform_changed {
            self.derived.frame.direction = self.frame.direction;
            self.derived.direction_wc = transform.transform_vector3(self.frame.direction).normalize();
        }
        if up_changed || transform_changed {
            self.derived.frame.up = self.frame.up;
            self.derived.up_wc = transform.transform_vector3(self.frame.up).normalize();
        }
        if right_changed || transform_changed {
            self.derived.frame.right = self.frame.right;
            self.derived.right_wc = transform.transform_vector3(self.frame.right).normalize();
        }
    }

    pub fn inverse_transform(&mut self) -> DMat4 {
        self.update_members();
        self.derived.inverse_transform
    }

    pub fn position_wc(&mut self) -> DVec3 {
        self.update_members();
        self.derived.position_wc
    }

    pub fn direction_wc(&mut self) -> DVec3 {
        self.update_members();
        self.derived.direction_wc
    }

    pub fn up_wc(&mut self) -> DVec3 {
        self.update_members();
        self.derived.up_wc
    }

    pub fn right_wc(&mut self) -> DVec3 {
        self.update_members();
        self.derived.right_wc
    }

    /// Geographic position of the camera, or `None` near the globe's center.
    pub fn position_cartographic(&mut self) -> Option<Cartographic> {
        self.update_members();
        self.derived.cartographic
    }

    /// Height above the ellipsoid, treating an undefined position as zero.
    pub fn height(&mut self) -> f64 {
        self.position_cartographic().map_or(0.0, |c| c.height)
    }

    /// Convert a world point into the reference frame.
    pub fn world_to_camera_coordinates(&mut self, point: DVec3) -> DVec3 {
        self.inverse_transform().transform_point3(point)
    }

    // ------------------------------------------------------------------------
    // Orientation angles
    // ------------------------------------------------------------------------

    /// Camera axes expressed in the east-north-up frame at the camera.
    fn local_axes(&mut self) -> (DVec3, DVec3, DVec3) {
        let enu = east_north_up_to_fixed_frame(self.position_wc(), &self.ellipsoid);
        let to_local = enu.inverse();
        let direction = to_local.transform_vector3(self.direction_wc()).normalize();
        let up = to_local.transform_vector3(self.up_wc()).normalize();
        let right = direction.cross(up).normalize();
        (direction, up, right)
    }

    /// Heading in radians, clockwise from north, in `[0, 2π)`.
    pub fn heading(&mut self) -> f64 {
        let (direction, up, _) = self.local_axes();
        let heading = if equals_epsilon(direction.z.abs(), 1.0, EPSILON3, EPSILON3) {
            up.y.atan2(up.x) - FRAC_PI_2
        } else {
            direction.y.atan2(direction.x) - FRAC_PI_2
        };
        TWO_PI - zero_to_two_pi(heading)
    }

    /// Pitch in radians, positive above the horizon.
    pub fn pitch(&mut self) -> f64 {
        let (direction, _, _) = self.local_axes();
        FRAC_PI_2 - acos_clamped(direction.z)
    }

    /// Roll in radians, in `[0, 2π)`.
    pub fn roll(&mut self) -> f64 {
        let (direction, up, right) = self.local_axes();
        if equals_epsilon(direction.z.abs(), 1.0, EPSILON3, EPSILON3) {
            return 0.0;
        }
        zero_to_two_pi((-right.z).atan2(up.z) + TWO_PI)
    }

    /// Place the camera at `destination` (world) with the given orientation.
    pub fn set_view(&mut self, destination: DVec3, heading: f64, pitch: f64, roll: f64) {
        let current = self.transform;
        self.set_transform(east_north_up_to_fixed_frame(destination, &self.ellipsoid));

        let rotation = DMat3::from_quat(quaternion_from_heading_pitch_roll(
            heading - FRAC_PI_2,
            pitch,
            roll,
        ));
        let direction = rotation.x_axis.normalize();
        let up = rotation.z_axis.normalize();
        let right = direction.cross(up).normalize();

        self.frame.position = DVec3::ZERO;
        self.set_axes(right, direction, up);

        self.set_transform(current);
    }

    // ------------------------------------------------------------------------
    // Motion primitives
    // ------------------------------------------------------------------------

    /// Rotate position and orientation about `axis` through the frame origin.
    pub fn rotate(&mut self, axis: DVec3, angle: f64) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        let rotation = DQuat::from_axis_angle(axis, -angle);

        self.frame.position = rotation * self.frame.position;
        let direction = (rotation * self.frame.direction).normalize();
        let up = (rotation * self.frame.up).normalize();
        let right = direction.cross(up).normalize();
        let up = right.cross(direction).normalize();
        self.set_axes(right, direction, up);
    }

    pub fn rotate_up(&mut self, angle: f64) {
        self.rotate_vertical(-angle);
    }

    pub fn rotate_down(&mut self, angle: f64) {
        self.rotate_vertical(angle);
    }

    pub fn rotate_right(&mut self, angle: f64) {
        self.rotate_horizontal(-angle);
    }

    pub fn rotate_left(&mut self, angle: f64) {
        self.rotate_horizontal(angle);
    }

    /// Rotate over the pole direction, stopping just short of the constrained axis.
    fn rotate_vertical(&mut self, mut angle: f64) {
        let p = self.frame.position.normalize();
        let Some(axis) = self.constrained_axis else {
            self.rotate(self.frame.right, angle);
            return;
        };

        let north_parallel = vec_equals_epsilon(p, axis, EPSILON2, EPSILON2);
        let south_parallel = vec_equals_epsilon(p, -axis, EPSILON2, EPSILON2);
        if !north_parallel && !south_parallel {
            let axis = axis.normalize();

            let angle_to_axis = acos_clamped(p.dot(axis));
            if angle > 0.0 && angle > angle_to_axis {
                angle = angle_to_axis - EPSILON4;
            }

            let angle_to_negative_axis = acos_clamped(p.dot(-axis));
            if angle < 0.0 && -angle > angle_to_negative_axis {
                angle = -angle_to_negative_axis + EPSILON4;
            }

            self.rotate(axis.cross(p), angle);
        } else if (north_parallel && angle < 0.0) || (south_parallel && angle > 0.0) {
            self.rotate(self.frame.right, angle);
        }
    }

    fn rotate_horizontal(&mut self, angle: f64) {
        let axis = self.constrained_axis.unwrap_or(self.frame.up);
        self.rotate(axis, angle);
    }

    /// Translate along `direction` (in the reference frame).
    pub fn move_by(&mut self, direction: DVec3, amount: f64) {
        self.frame.position += direction * amount;
    }

    pub fn move_forward(&mut self, amount: f64) {
        self.move_by(self.frame.direction, amount);
    }

    pub fn move_backward(&mut self, amount: f64) {
        self.move_by(self.frame.direction, -amount);
    }

    pub fn move_up(&mut self, amount: f64) {
        self.move_by(self.frame.up, amount);
    }

    pub fn move_down(&mut self, amount: f64) {
        self.move_by(self.frame.up, -amount);
    }

    pub fn move_right(&mut self, amount: f64) {
        self.move_by(self.frame.right, amount);
    }

    pub fn move_left(&mut self, amount: f64) {
        self.move_by(self.frame.right, -amount);
    }

    /// Rotate the orientation about `axis` without moving the camera.
    pub fn look(&mut self, axis: DVec3, angle: f64) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        let rotation = DQuat::from_axis_angle(axis, -angle);
        let direction = (rotation * self.frame.direction).normalize();
        let up = (rotation * self.frame.up).normalize();
        let right = (rotation * self.frame.right).normalize();
        self.set_axes(right, direction, up);
    }

    pub fn look_up(&mut self, amount: f64) {
        self.look(self.frame.right, -amount);
    }

    pub fn look_down(&mut self, amount: f64) {
        self.look(self.frame.right, amount);
    }

    pub fn look_right(&mut self, amount: f64) {
        self.look(self.frame.up, amount);
    }

    pub fn look_left(&mut self, amount: f64) {
        self.look(self.frame.up, -amount);
    }

    pub fn zoom_in(&mut self, amount: f64) {
        self.move_by(self.frame.direction, amount);
    }

    pub fn zoom_out(&mut self, amount: f64) {
        self.move_by(self.frame.direction, -amount);
    }

    // ------------------------------------------------------------------------
    // Picking and projection
    // ------------------------------------------------------------------------

    /// World-space ray through a window position.
    pub fn pick_ray(&mut self, window_position: DVec2) -> Ray {
        let tan_phi = self.frustum.tan_phi();
        let tan_theta = self.frustum.tan_theta();
        let near = self.frustum.near;

        let x = (2.0 / self.viewport.width) * window_position.x - 1.0;
        let y = (2.0 / self.viewport.height) * (self.viewport.height - window_position.y) - 1.0;

        let direction = self.direction_wc() * near
            + self.right_wc() * (x * near * tan_theta)
            + self.up_wc() * (y * near * tan_phi);

        Ray::new(self.position_wc(), direction.normalize())
    }

    /// Point on `ellipsoid` under a window position.
    pub fn pick_ellipsoid(&mut self, window_position: DVec2, ellipsoid: &Ellipsoid) -> Option<DVec3> {
        let ray = self.pick_ray(window_position);
        let interval = ray_ellipsoid(&ray, ellipsoid)?;
        let t = if interval.start > 0.0 {
            interval.start
        } else {
            interval.stop
        };
        Some(ray.point_at(t))
    }

    /// Window position of a world point, or `None` if it is behind the camera.
    pub fn world_to_window_coordinates(&mut self, point: DVec3) -> Option<DVec2> {
        let offset = point - self.position_wc();
        let depth = offset.dot(self.direction_wc());
        if depth <= 0.0 {
            return None;
        }

        let ndc_x = offset.dot(self.right_wc()) / (depth * self.frustum.tan_theta());
        let ndc_y = offset.dot(self.up_wc()) / (depth * self.frustum.tan_phi());

        Some(DVec2::new(
            (ndc_x + 1.0) * 0.5 * self.viewport.width,
            self.viewport.height - (ndc_y + 1.0) * 0.5 * self.viewport.height,
        ))
    }

    /// World position from which `rectangle` fills the view when looking straight down.
    pub fn rectangle_camera_position(&self, rectangle: &Rectangle) -> Result<DVec3> {
        let Rectangle {
            west,
            south,
            mut east,
            north,
        } = *rectangle;

        if west > east {
            east += TWO_PI;
        }

        let longitude = (west + east) * 0.5;
        // Rectangles spanning nearly pole to pole would need an antipodal geodesic.
        let latitude = if south < -FRAC_PI_2 + 1f64.to_radians()
            && north > FRAC_PI_2 - 1f64.to_radians()
        {
            0.0
        } else {
            let geodesic = EllipsoidGeodesic::between(
                self.ellipsoid,
                Cartographic::new(longitude, north, 0.0),
                Cartographic::new(longitude, south, 0.0),
            )?;
            geodesic
                .interpolate_using_fraction(0.5)
                .map_or((north + south) * 0.5, |c| c.latitude)
        };

        let to_cartesian = |lon: f64, lat: f64| {
            self.ellipsoid
                .cartographic_to_cartesian(&Cartographic::new(lon, lat, 0.0))
        };

        let center = to_cartesian(longitude, latitude);
        let corners = [
            to_cartesian(east, north) - center,
            to_cartesian(west, north) - center,
            to_cartesian(longitude, north) - center,
            to_cartesian(longitude, south) - center,
            to_cartesian(east, south) - center,
            to_cartesian(west, south) - center,
        ];

        let direction = -self.ellipsoid.geodetic_surface_normal(center);
        let right = direction.cross(DVec3::Z).normalize();
        let up = right.cross(direction);

        let tan_phi = self.frustum.tan_phi();
        let tan_theta = self.frustum.tan_theta();
        let fit = |corner: DVec3| {
            compute_d(direction, up, corner, tan_phi).max(compute_d(direction, right, corner, tan_theta))
        };

        let mut d = corners.into_iter().map(fit).fold(f64::NEG_INFINITY, f64::max);

        // The equator is the widest part of a rectangle that crosses it.
        if south < 0.0 && north > 0.0 {
            d = d
                .max(fit(to_cartesian(west, 0.0) - center))
                .max(fit(to_cartesian(east, 0.0) - center));
        }

        Ok(center - direction * d)
    }
}

/// Distance back from the center needed to fit `corner` within the frustum half-angle.
fn compute_d(direction: DVec3, up_or_right: DVec3, corner: DVec3, tan_theta_or_phi: f64) -> f64 {
    let opposite = up_or_right.dot(corner).abs();
    opposite / tan_theta_or_phi - direction.dot(corner)
}
