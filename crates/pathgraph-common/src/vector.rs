//! Vector utilities for 3D positions

use glam::Vec3;

/// Drops the vertical component of a vector.
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Normalized horizontal direction from `from` towards `to`, or zero when
/// the points coincide on the XZ plane.
#[inline]
pub fn direction_2d(from: Vec3, to: Vec3) -> Vec3 {
    flatten(to - from).normalize_or_zero()
}
