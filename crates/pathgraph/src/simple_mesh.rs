//! A small polygon mesh implementing [`NavQuery`]
//!
//! Convex polygons are connected wherever two of them share an edge, plus
//! any number of off-mesh connections. This is enough to drive the path
//! graph without a tiled navigation mesh library and is what the scene files
//! of the command line tool load.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use glam::Vec3;
use pathgraph_common::{
    calc_bounds, closest_point_on_segment_2d, dist_2d, edge_outward_normal_2d,
    intersect_segment_poly_2d, is_convex_poly_2d, overlap_bounds, point_in_convex_poly_2d,
    tri_area_2d, Error, Result,
};
use serde::{Deserialize, Serialize};

use crate::nav_query::{NavQuery, PolyEdge, PolyRef, RaycastHit};

/// Maximum distance between two vertices considered shared
const VERTEX_WELD_DISTANCE: f32 = 0.01;

/// An explicit connection between two points of the mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffMeshLink {
    pub start: Vec3,
    pub end: Vec3,
    #[serde(default)]
    pub bidirectional: bool,
}

#[derive(Debug, Clone)]
struct MeshPoly {
    verts: Vec<Vec3>,
    center: Vec3,
    bmin: Vec3,
    bmax: Vec3,
    edges: Vec<PolyEdge>,
}

/// Convex polygon soup with shared-edge adjacency.
#[derive(Debug, Clone)]
pub struct SimplePolyMesh {
    polys: Vec<MeshPoly>,
    generation: u64,
    build_in_progress: bool,
}

impl SimplePolyMesh {
    /// Builds the mesh from convex polygons and off-mesh connections.
    ///
    /// Polygon `i` gets the reference `i + 1`.
    pub fn new(polys: Vec<Vec<Vec3>>, off_mesh_links: &[OffMeshLink]) -> Result<Self> {
        let mut mesh_polys = Vec::with_capacity(polys.len());
        for (i, verts) in polys.into_iter().enumerate() {
            if verts.len() < 3 {
                return Err(Error::InvalidMesh(format!(
                    "polygon {i} has {} vertices",
                    verts.len()
                )));
            }
            if !is_convex_poly_2d(&verts) {
                return Err(Error::InvalidMesh(format!("polygon {i} is not convex")));
            }
            let center = verts.iter().copied().sum::<Vec3>() / verts.len() as f32;
            let (bmin, bmax) = calc_bounds(&verts);
            mesh_polys.push(MeshPoly {
                verts,
                center,
                bmin,
                bmax,
                edges: Vec::new(),
            });
        }

        let mut mesh = Self {
            polys: mesh_polys,
            generation: 1,
            build_in_progress: false,
        };
        mesh.connect_edges();
        for link in off_mesh_links {
            mesh.connect_off_mesh(link.start, link.end)?;
            if link.bidirectional {
                mesh.connect_off_mesh(link.end, link.start)?;
            }
        }
        Ok(mesh)
    }

    pub fn poly_count(&self) -> usize {
        self.polys.len()
    }

    /// Marks the start of a regeneration. Polygon refs must not be used
    /// until [`SimplePolyMesh::finish_rebuild`].
    pub fn begin_rebuild(&mut self) {
        self.build_in_progress = true;
    }

    /// Ends a regeneration and bumps the generation counter.
    pub fn finish_rebuild(&mut self) {
        self.build_in_progress = false;
        self.generation += 1;
    }

    fn poly(&self, poly: PolyRef) -> Option<&MeshPoly> {
        if !poly.is_valid() {
            return None;
        }
        self.polys.get(poly.id() as usize - 1)
    }

    fn poly_ref(index: usize) -> PolyRef {
        PolyRef::new(index as u32 + 1)
    }

    fn connect_edges(&mut self) {
        let mut edge_owners: HashMap<(i64, i64, i64, i64), Vec<usize>> = HashMap::new();
        let key = |a: Vec3, b: Vec3| {
            let qa = quantize(a);
            let qb = quantize(b);
            if qa <= qb {
                (qa.0, qa.1, qb.0, qb.1)
            } else {
                (qb.0, qb.1, qa.0, qa.1)
            }
        };

        for (i, poly) in self.polys.iter().enumerate() {
            let n = poly.verts.len();
            for j in 0..n {
                edge_owners
                    .entry(key(poly.verts[j], poly.verts[(j + 1) % n]))
                    .or_default()
                    .push(i);
            }
        }

        for i in 0..self.polys.len() {
            let n = self.polys[i].verts.len();
            let mut edges = Vec::with_capacity(n);
            for j in 0..n {
                let a = self.polys[i].verts[j];
                let b = self.polys[i].verts[(j + 1) % n];
                let neighbor = edge_owners
                    .get(&key(a, b))
                    .and_then(|owners| {
                        owners.iter().copied().find(|&o| {
                            o != i && self.shares_edge(o, a, b)
                        })
                    })
                    .map(Self::poly_ref);
                edges.push(PolyEdge {
                    neighbor,
                    start: a,
                    end: b,
                    off_mesh: false,
                });
            }
            self.polys[i].edges = edges;
        }
    }

    fn shares_edge(&self, poly: usize, a: Vec3, b: Vec3) -> bool {
        let verts = &self.polys[poly].verts;
        let n = verts.len();
        (0..n).any(|j| {
            let c = verts[j];
            let d = verts[(j + 1) % n];
            (a.distance(d) < VERTEX_WELD_DISTANCE && b.distance(c) < VERTEX_WELD_DISTANCE)
                || (a.distance(c) < VERTEX_WELD_DISTANCE && b.distance(d) < VERTEX_WELD_DISTANCE)
        })
    }

    fn connect_off_mesh(&mut self, start: Vec3, end: Vec3) -> Result<()> {
        let extent = Vec3::new(50.0, 100.0, 50.0);
        let (from, _) = self
            .find_nearest_poly(start, extent)
            .ok_or_else(|| Error::InvalidMesh(format!("off-mesh link start {start} is off the mesh")))?;
        let (to, _) = self
            .find_nearest_poly(end, extent)
            .ok_or_else(|| Error::InvalidMesh(format!("off-mesh link end {end} is off the mesh")))?;
        if from == to {
            return Ok(());
        }
        let index = from.id() as usize - 1;
        self.polys[index].edges.push(PolyEdge {
            neighbor: Some(to),
            start,
            end,
            off_mesh: true,
        });
        Ok(())
    }

    /// Height of the polygon surface under `pos`, using a fan triangulation.
    fn height_at(poly: &MeshPoly, pos: Vec3) -> f32 {
        let v0 = poly.verts[0];
        for i in 1..poly.verts.len() - 1 {
            let v1 = poly.verts[i];
            let v2 = poly.verts[i + 1];
            let area = tri_area_2d(v0, v1, v2);
            if area.abs() < f32::EPSILON {
                continue;
            }
            let w0 = tri_area_2d(v1, v2, pos) / area;
            let w1 = tri_area_2d(v2, v0, pos) / area;
            let w2 = 1.0 - w0 - w1;
            if w0 >= -1e-4 && w1 >= -1e-4 && w2 >= -1e-4 {
                return w0 * v0.y + w1 * v1.y + w2 * v2.y;
            }
        }
        poly.center.y
    }
}

fn quantize(v: Vec3) -> (i64, i64) {
    // Edges are keyed on their XZ footprint, heights are checked separately
    ((v.x * 10.0).round() as i64, (v.z * 10.0).round() as i64)
}

impl NavQuery for SimplePolyMesh {
    fn find_nearest_poly(&self, center: Vec3, extent: Vec3) -> Option<(PolyRef, Vec3)> {
        let mut best: Option<(PolyRef, Vec3, f32)> = None;
        for poly in self.query_polygons(center, extent) {
            let Some(closest) = self.closest_point_on_poly(poly, center) else {
                continue;
            };
            let d = closest.distance_squared(center);
            if best.map_or(true, |(_, _, best_d)| d < best_d) {
                best = Some((poly, closest, d));
            }
        }
        best.map(|(poly, closest, _)| (poly, closest))
    }

    fn poly_center(&self, poly: PolyRef) -> Option<Vec3> {
        self.poly(poly).map(|p| p.center)
    }

    fn poly_verts(&self, poly: PolyRef) -> Vec<Vec3> {
        self.poly(poly).map(|p| p.verts.clone()).unwrap_or_default()
    }

    fn closest_point_on_poly(&self, poly: PolyRef, pos: Vec3) -> Option<Vec3> {
        let p = self.poly(poly)?;
        if point_in_convex_poly_2d(pos, &p.verts) {
            return Some(Vec3::new(pos.x, Self::height_at(p, pos), pos.z));
        }

        let n = p.verts.len();
        (0..n)
            .map(|i| closest_point_on_segment_2d(pos, p.verts[i], p.verts[(i + 1) % n]))
            .min_by(|a, b| dist_2d(*a, pos).total_cmp(&dist_2d(*b, pos)))
    }

    fn poly_edges(&self, poly: PolyRef) -> Vec<PolyEdge> {
        self.poly(poly).map(|p| p.edges.clone()).unwrap_or_default()
    }

    fn raycast(&self, start_poly: PolyRef, start: Vec3, end: Vec3) -> Option<RaycastHit> {
        let mut current = start_poly;
        let mut previous = PolyRef::NULL;

        for _ in 0..=self.polys.len() {
            let poly = self.poly(current)?;
            let Some(clip) = intersect_segment_poly_2d(start, end, &poly.verts) else {
                // Start point is outside the start polygon
                return Some(RaycastHit {
                    t: 0.0,
                    normal: Vec3::ZERO,
                    last_poly: current,
                });
            };

            let Some(edge_index) = clip.seg_max else {
                return Some(RaycastHit::no_hit(current));
            };

            let edge = poly.edges[edge_index];
            match edge.neighbor {
                Some(next) if next != previous => {
                    previous = current;
                    current = next;
                }
                _ => {
                    return Some(RaycastHit {
                        t: clip.tmax,
                        normal: edge_outward_normal_2d(edge.start, edge.end, poly.center),
                        last_poly: current,
                    });
                }
            }
        }

        log::debug!("raycast from {start} did not terminate");
        None
    }

    fn find_poly_path(
        &self,
        start_poly: PolyRef,
        end_poly: PolyRef,
        start: Vec3,
        end: Vec3,
    ) -> Option<Vec<PolyRef>> {
        self.poly(start_poly)?;
        self.poly(end_poly)?;
        if start_poly == end_poly {
            return Some(vec![start_poly]);
        }

        // A* over polygons, entry points fixed at the first edge midpoint used
        let mut cost: HashMap<PolyRef, f32> = HashMap::new();
        let mut position: HashMap<PolyRef, Vec3> = HashMap::new();
        let mut parent: HashMap<PolyRef, PolyRef> = HashMap::new();
        let mut open = BinaryHeap::new();

        cost.insert(start_poly, 0.0);
        position.insert(start_poly, start);
        open.push(Reverse((cost_key(start.distance(end)), start_poly)));

        while let Some(Reverse((_, current))) = open.pop() {
            if current == end_poly {
                let mut path = vec![end_poly];
                let mut node = end_poly;
                while let Some(prev) = parent.get(&node) {
                    path.push(*prev);
                    node = *prev;
                }
                path.reverse();
                return Some(path);
            }

            let current_cost = cost[&current];
            let current_pos = position[&current];
            for edge in self.poly_edges(current) {
                let Some(next) = edge.neighbor else {
                    continue;
                };
                let (entry, step) = if edge.off_mesh {
                    (
                        edge.end,
                        current_pos.distance(edge.start) + edge.start.distance(edge.end),
                    )
                } else {
                    let mid = edge.midpoint();
                    (mid, current_pos.distance(mid))
                };
                let next_pos = if next == end_poly { end } else { entry };
                let extra = if next == end_poly { entry.distance(end) } else { 0.0 };
                let next_cost = current_cost + step + extra;

                if cost.get(&next).is_some_and(|c| *c <= next_cost) {
                    continue;
                }
                cost.insert(next, next_cost);
                position.insert(next, next_pos);
                parent.insert(next, current);
                let heuristic = next_pos.distance(end);
                open.push(Reverse((cost_key(next_cost + heuristic), next)));
            }
        }

        None
    }

    fn query_polygons(&self, center: Vec3, extent: Vec3) -> Vec<PolyRef> {
        let qmin = center - extent;
        let qmax = center + extent;
        self.polys
            .iter()
            .enumerate()
            .filter(|(_, p)| overlap_bounds(qmin, qmax, p.bmin, p.bmax))
            .map(|(i, _)| Self::poly_ref(i))
            .collect()
    }

    fn all_polys(&self) -> Vec<PolyRef> {
        (0..self.polys.len()).map(Self::poly_ref).collect()
    }

    fn is_build_in_progress(&self) -> bool {
        self.build_in_progress
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

/// Integer ordering key for path costs
fn cost_key(cost: f32) -> u64 {
    (cost.max(0.0) * 100.0).round() as u64
}
