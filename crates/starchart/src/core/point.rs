//! 2D point arithmetic in model space.
//!
//! Model coordinates are `f64` (`glam::DVec2`); translation and scaling use
//! glam's operators (`+=`, `-=`, `*=`). This module adds the in-place
//! operations glam does not provide.

use glam::DVec2;

/// A point or vector in model space.
pub type Point = DVec2;

/// In-place point operations used by the orbit solver and the renderers.
pub trait PointExt {
    /// Rotate this point by `radians` about `center` (counter-clockwise in a
    /// Y-up frame, clockwise on a Y-down screen).
    fn rotate_around(&mut self, radians: f64, center: DVec2);

    /// Component-wise minimum with `other`, stored in `self`.
    fn min_assign(&mut self, other: DVec2);

    /// Component-wise maximum with `other`, stored in `self`.
    fn max_assign(&mut self, other: DVec2);
}

impl PointExt for DVec2 {
    fn rotate_around(&mut self, radians: f64, center: DVec2) {
        let d = *self - center;
        let (sin, cos) = radians.sin_cos();
        self.x = center.x + d.x * cos - d.y * sin;
        self.y = center.y + d.y * cos + d.x * sin;
    }

    fn min_assign(&mut self, other: DVec2) {
        *self = self.min(other);
    }

    fn max_assign(&mut self, other: DVec2) {
        *self = self.max(other);
    }
}

/// Axis-aligned bounds accumulated point by point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    /// Bounds containing only `point`.
    pub fn at(point: DVec2) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Grow to include `point`.
    pub fn include(&mut self, point: DVec2) {
        self.min.min_assign(point);
        self.max.max_assign(point);
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::at(DVec2::ZERO)
    }
}

/// The candidate closest to `target` within `radius`, if any.
pub fn nearest_within<I, T>(candidates: I, target: DVec2, radius: f64) -> Option<T>
where
    I: IntoIterator<Item = (DVec2, T)>,
{
    let limit = radius * radius;
    candidates
        .into_iter()
        .map(|(position, item)| (position.distance_squared(target), item))
        .filter(|(distance, _)| *distance <= limit)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, item)| item)
}
