//! 2D geometry operations
//!
//! This module provides 2D geometric operations used by the path graph builder
//! and the mesh queries. Every operation works on the XZ plane (Y-up coordinate
//! system) and ignores the Y component unless stated otherwise.

use glam::Vec3;

/// Tolerance used when comparing positions on the XZ plane.
pub const EQUAL_EPSILON_SQR: f32 = 0.00001;

/// 2D perpendicular product (cross product magnitude on XZ plane).
#[inline]
pub fn perp_2d(u: Vec3, v: Vec3) -> f32 {
    u.x * v.z - u.z * v.x
}

/// Calculate twice the signed area of a 2D triangle on the XZ plane.
///
/// Negative when `c` lies left of the line from `a` to `b`, positive when it
/// lies to the right and zero for collinear points.
#[inline]
pub fn tri_area_2d(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let abx = b.x - a.x;
    let abz = b.z - a.z;
    let acx = c.x - a.x;
    let acz = c.z - a.z;
    acx * abz - abx * acz
}

/// Check if point c is left of the line from a to b (on XZ plane).
#[inline]
pub fn left(a: Vec3, b: Vec3, c: Vec3) -> bool {
    tri_area_2d(a, b, c) < 0.0
}

/// Checks if two positions are approximately equal (ignoring Y)
#[inline]
pub fn v_equal_2d(a: Vec3, b: Vec3) -> bool {
    dist_sqr_2d(a, b) < EQUAL_EPSILON_SQR
}

/// Calculate squared distance between two points on the XZ plane.
#[inline]
pub fn dist_sqr_2d(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    dx * dx + dz * dz
}

/// Calculate distance between two points on the XZ plane.
#[inline]
pub fn dist_2d(a: Vec3, b: Vec3) -> f32 {
    dist_sqr_2d(a, b).sqrt()
}

/// Squared distance from a point to a segment on the XZ plane, plus the
/// clamped parameter of the closest point along the segment.
pub fn dist_point_segment_sqr_2d(p: Vec3, a: Vec3, b: Vec3) -> (f32, f32) {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    let d = dx * dx + dz * dz;
    let t = if d > f32::EPSILON {
        (((p.x - a.x) * dx + (p.z - a.z) * dz) / d).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let qx = a.x + t * dx;
    let qz = a.z + t * dz;
    let ex = p.x - qx;
    let ez = p.z - qz;
    (ex * ex + ez * ez, t)
}

/// Find the closest point on a segment to a given point on the XZ plane.
///
/// The Y of the result is interpolated along the segment.
pub fn closest_point_on_segment_2d(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let (_, t) = dist_point_segment_sqr_2d(p, a, b);
    a.lerp(b, t)
}

/// Twice the signed area of a polygon on the XZ plane.
///
/// Positive when the interior lies to the left of every edge.
pub fn poly_area_2d(verts: &[Vec3]) -> f32 {
    let n = verts.len();
    (0..n)
        .map(|i| perp_2d(verts[i], verts[(i + 1) % n]))
        .sum()
}

/// Check if a point is inside a convex polygon (on XZ plane), boundary included.
pub fn point_in_convex_poly_2d(p: Vec3, verts: &[Vec3]) -> bool {
    if verts.len() < 3 {
        return false;
    }
    let s = poly_area_2d(verts).signum();
    let n = verts.len();
    (0..n).all(|i| {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        s * perp_2d(b - a, p - a) >= -1e-3
    })
}

/// Checks that a polygon is convex with a consistent winding.
pub fn is_convex_poly_2d(verts: &[Vec3]) -> bool {
    if verts.len() < 3 {
        return false;
    }
    let area = poly_area_2d(verts);
    if area.abs() < f32::EPSILON {
        return false;
    }
    let s = area.signum();
    let n = verts.len();
    (0..n).all(|i| {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        let c = verts[(i + 2) % n];
        s * perp_2d(b - a, c - b) >= -1e-3
    })
}

/// Result of clipping a segment against a convex polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentClip {
    /// Normalized distance along the segment where it enters the polygon
    pub tmin: f32,
    /// Normalized distance along the segment where it exits the polygon
    pub tmax: f32,
    /// Edge the segment enters through, if it starts outside
    pub seg_min: Option<usize>,
    /// Edge the segment leaves through, if it ends outside
    pub seg_max: Option<usize>,
}

/// Finds the intersection of a 2D segment with a convex polygon.
///
/// Edge `i` runs from `verts[i]` to `verts[i + 1]`. Returns `None` when the
/// segment misses the polygon.
pub fn intersect_segment_poly_2d(p0: Vec3, p1: Vec3, verts: &[Vec3]) -> Option<SegmentClip> {
    const EPS: f32 = 0.000001;

    let n = verts.len();
    if n < 3 {
        return None;
    }
    let s = poly_area_2d(verts).signum();
    let dir = p1 - p0;

    let mut clip = SegmentClip {
        tmin: 0.0,
        tmax: 1.0,
        seg_min: None,
        seg_max: None,
    };

    for i in 0..n {
        let a = verts[i];
        let edge = verts[(i + 1) % n] - a;
        let num = s * perp_2d(edge, p0 - a);
        let den = s * perp_2d(edge, dir);

        if den.abs() < EPS {
            // Segment is nearly parallel to this edge
            if num < 0.0 {
                return None;
            }
            continue;
        }

        let t = -num / den;
        if den > 0.0 {
            // Segment is entering across this edge
            if t > clip.tmin {
                clip.tmin = t;
                clip.seg_min = Some(i);
            }
        } else if t < clip.tmax {
            // Segment is leaving across this edge
            clip.tmax = t;
            clip.seg_max = Some(i);
        }

        if clip.tmin > clip.tmax {
            return None;
        }
    }

    Some(clip)
}

/// Outward facing normal of a polygon edge on the XZ plane.
pub fn edge_outward_normal_2d(a: Vec3, b: Vec3, interior: Vec3) -> Vec3 {
    let edge = b - a;
    let normal = Vec3::new(edge.z, 0.0, -edge.x).normalize_or_zero();
    let mid = (a + b) * 0.5;
    if normal.dot(Vec3::new(interior.x - mid.x, 0.0, interior.z - mid.z)) > 0.0 {
        -normal
    } else {
        normal
    }
}

/// Calculates the axis-aligned bounds of a point set.
pub fn calc_bounds(verts: &[Vec3]) -> (Vec3, Vec3) {
    verts.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(bmin, bmax), v| (bmin.min(*v), bmax.max(*v)),
    )
}

/// Check if two axis-aligned bounding boxes overlap.
#[inline]
pub fn overlap_bounds(amin: Vec3, amax: Vec3, bmin: Vec3, bmax: Vec3) -> bool {
    amin.x <= bmax.x
        && amax.x >= bmin.x
        && amin.y <= bmax.y
        && amax.y >= bmin.y
        && amin.z <= bmax.z
        && amax.z >= bmin.z
}
