//! Navigation mesh query seam
//!
//! The path graph is built over a polygon mesh owned by an external library.
//! Everything the graph needs from that mesh goes through [`NavQuery`]; the
//! corridor and funnel helpers are provided as default methods built on the
//! required primitives.

use glam::Vec3;
use pathgraph_common::{dist_sqr_2d, perp_2d, tri_area_2d, v_equal_2d};
use serde::{Deserialize, Serialize};

/// A reference to a polygon in the navigation mesh. Zero is never valid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct PolyRef(u32);

impl PolyRef {
    /// The null polygon reference
    pub const NULL: PolyRef = PolyRef(0);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

/// One edge of a polygon as seen by the path graph builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolyEdge {
    /// Polygon on the other side, `None` for a wall
    pub neighbor: Option<PolyRef>,
    /// Edge start, or the departure point of an off-mesh connection
    pub start: Vec3,
    /// Edge end, or the arrival point of an off-mesh connection
    pub end: Vec3,
    /// True when the connection is an off-mesh link rather than a shared edge
    pub off_mesh: bool,
}

impl PolyEdge {
    pub fn is_wall(&self) -> bool {
        self.neighbor.is_none()
    }

    pub fn midpoint(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }
}

/// Result of a mesh raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The hit parameter along the ray, `f32::MAX` if no wall was hit
    pub t: f32,
    /// Normal of the wall that was hit
    pub normal: Vec3,
    /// Last polygon visited by the ray
    pub last_poly: PolyRef,
}

impl RaycastHit {
    pub fn no_hit(last_poly: PolyRef) -> Self {
        Self {
            t: f32::MAX,
            normal: Vec3::ZERO,
            last_poly,
        }
    }

    pub fn hit_wall(&self) -> bool {
        self.t < f32::MAX
    }
}

/// Queries the path graph needs from the navigation mesh.
pub trait NavQuery {
    /// Finds the polygon nearest to `center` within the `extent` half-size box,
    /// together with the closest point on it.
    fn find_nearest_poly(&self, center: Vec3, extent: Vec3) -> Option<(PolyRef, Vec3)>;

    fn poly_center(&self, poly: PolyRef) -> Option<Vec3>;

    fn poly_verts(&self, poly: PolyRef) -> Vec<Vec3>;

    /// Closest point on the polygon surface to `pos`.
    fn closest_point_on_poly(&self, poly: PolyRef, pos: Vec3) -> Option<Vec3>;

    /// Edges of the polygon in winding order followed by its off-mesh connections.
    fn poly_edges(&self, poly: PolyRef) -> Vec<PolyEdge>;

    /// Walks the mesh surface from `start` towards `end`.
    fn raycast(&self, start_poly: PolyRef, start: Vec3, end: Vec3) -> Option<RaycastHit>;

    /// Polygon corridor from `start_poly` to `end_poly`, `None` if unreachable.
    fn find_poly_path(
        &self,
        start_poly: PolyRef,
        end_poly: PolyRef,
        start: Vec3,
        end: Vec3,
    ) -> Option<Vec<PolyRef>>;

    /// Polygons whose bounds overlap the box around `center`.
    fn query_polygons(&self, center: Vec3, extent: Vec3) -> Vec<PolyRef>;

    /// Every polygon in the mesh in ascending reference order.
    fn all_polys(&self) -> Vec<PolyRef>;

    /// True while the mesh is being regenerated and polygon refs are unstable.
    fn is_build_in_progress(&self) -> bool {
        false
    }

    /// Counter bumped every time the mesh finishes a regeneration.
    fn generation(&self) -> u64 {
        0
    }

    /// Edges with no neighbor on the other side.
    fn wall_segments(&self, poly: PolyRef) -> Vec<(Vec3, Vec3)> {
        self.poly_edges(poly)
            .into_iter()
            .filter(|e| e.is_wall() && !e.off_mesh)
            .map(|e| (e.start, e.end))
            .collect()
    }

    /// Portal between two connected polygons as `(left, right)` seen when
    /// travelling from `from` into `to`. Off-mesh connections collapse to
    /// their departure point.
    fn portal_points(&self, from: PolyRef, to: PolyRef) -> Option<(Vec3, Vec3)> {
        let edge = self
            .poly_edges(from)
            .into_iter()
            .find(|e| e.neighbor == Some(to))?;
        if edge.off_mesh {
            return Some((edge.start, edge.start));
        }

        let center = self.poly_center(from)?;
        let travel = edge.midpoint() - center;
        if perp_2d(travel, edge.start - center) > 0.0 {
            Some((edge.start, edge.end))
        } else {
            Some((edge.end, edge.start))
        }
    }

    /// Straight path corners along a polygon corridor, start and end included.
    fn find_straight_path(&self, start: Vec3, end: Vec3, corridor: &[PolyRef]) -> Vec<Vec3> {
        let mut portals = Vec::with_capacity(corridor.len() + 1);
        for pair in corridor.windows(2) {
            let edge = self
                .poly_edges(pair[0])
                .into_iter()
                .find(|e| e.neighbor == Some(pair[1]));
            match edge {
                Some(edge) if edge.off_mesh => {
                    portals.push((edge.start, edge.start));
                    portals.push((edge.end, edge.end));
                }
                Some(_) => {
                    if let Some(portal) = self.portal_points(pair[0], pair[1]) {
                        portals.push(portal);
                    }
                }
                None => {
                    log::debug!(
                        "corridor polygons {:?} and {:?} are not connected",
                        pair[0],
                        pair[1]
                    );
                }
            }
        }
        funnel(start, end, &portals)
    }

    /// Length of the string pulled path between two points, `None` if the
    /// polygons are not connected.
    fn path_distance(
        &self,
        start_poly: PolyRef,
        start: Vec3,
        end_poly: PolyRef,
        end: Vec3,
    ) -> Option<f32> {
        let corridor = self.find_poly_path(start_poly, end_poly, start, end)?;
        let points = self.find_straight_path(start, end, &corridor);
        Some(points.windows(2).map(|w| w[0].distance(w[1])).sum())
    }
}

/// Funnel string pulling through a list of `(left, right)` portals.
///
/// The returned corners start with `start` and end with `end`.
pub fn funnel(start: Vec3, end: Vec3, portals: &[(Vec3, Vec3)]) -> Vec<Vec3> {
    let mut all = Vec::with_capacity(portals.len() + 2);
    all.push((start, start));
    all.extend_from_slice(portals);
    all.push((end, end));

    let mut corners = vec![start];
    let mut apex = start;
    let mut portal_left = start;
    let mut portal_right = start;
    let mut left_index = 0;
    let mut right_index = 0;

    let mut i = 1;
    while i < all.len() {
        let (left, right) = all[i];

        // Right vertex
        if tri_area_2d(apex, portal_right, right) <= 0.0 {
            if v_equal_2d(apex, portal_right) || tri_area_2d(apex, portal_left, right) > 0.0 {
                portal_right = right;
                right_index = i;
            } else {
                // Left side became the new apex
                push_corner(&mut corners, portal_left);
                apex = portal_left;
                let apex_index = left_index;
                portal_left = apex;
                portal_right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        // Left vertex
        if tri_area_2d(apex, portal_left, left) >= 0.0 {
            if v_equal_2d(apex, portal_left) || tri_area_2d(apex, portal_right, left) < 0.0 {
                portal_left = left;
                left_index = i;
            } else {
                push_corner(&mut corners, portal_right);
                apex = portal_right;
                let apex_index = right_index;
                portal_left = apex;
                portal_right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        i += 1;
    }

    push_corner(&mut corners, end);
    corners
}

fn push_corner(corners: &mut Vec<Vec3>, p: Vec3) {
    match corners.last() {
        Some(last) if dist_sqr_2d(*last, p) < 0.001 * 0.001 && (last.y - p.y).abs() < 1.0 => {}
        _ => corners.push(p),
    }
}
