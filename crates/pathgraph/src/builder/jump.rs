//! Jump and swim link discovery
//!
//! Pass 1 scans the walls of every node for polygons of other nodes in
//! front of them and validates each candidate with a ballistic capsule
//! simulation, or a straight sweep when water is involved. Pass 2 revisits
//! the jump-down links found by pass 1 and tries to jump back up.

use std::collections::{BTreeMap, HashMap, HashSet};

use glam::Vec3;
use pathgraph_common::{closest_point_on_segment_2d, direction_2d, dist_2d, edge_outward_normal_2d};

use super::links::compute_node_distances;
use super::{NavContext, NetworkBuilder};
use crate::graph::NavGraph;
use crate::nav_query::PolyRef;
use crate::path_link::PathLink;
use crate::path_node::NodeId;
use crate::reach::ReachFlags;
use crate::reach_spec::ReachSpec;
use crate::size::CapsuleSize;

/// Outcome of a successful jump simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpResult {
    /// Smallest vertical launch speed that made the jump
    pub required_jump_z: f32,
    /// The jump needed dodge speed
    pub dodge_jump: bool,
    pub gravity: f32,
    /// Surface point the jump starts from
    pub jump_start: Vec3,
    /// Surface point the jump aims at
    pub jump_end: Vec3,
}

#[derive(Debug, Clone, Copy)]
enum Traversal {
    Swim,
    Jump(JumpResult),
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start_poly: PolyRef,
    end_poly: PolyRef,
    landing: Vec3,
    traversal: Traversal,
}

/// Candidates sharing a target node and a traversal kind become one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LinkKind {
    Swim,
    Jump,
    HighJump,
}

impl NetworkBuilder {
    /// Jump pass 1 for one node.
    pub(super) fn jump_pass1_node(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>, node_id: NodeId) {
        let Some(node) = graph.node(node_id) else {
            return;
        };
        if node.destination_only || node.physics_volume.kill {
            return;
        }
        let polys = node.polys.clone();
        let source_water = node.physics_volume.water;
        let scan = self.config.jump.scan_distance;
        let facing_cos = self.config.jump.wall_facing_cos;

        let mut reachable: HashMap<NodeId, bool> = HashMap::new();
        let mut tried: HashSet<(PolyRef, PolyRef)> = HashSet::new();
        let mut candidates: BTreeMap<(NodeId, LinkKind), Vec<Candidate>> = BTreeMap::new();

        for poly in polys {
            let Some(center) = ctx.nav.poly_center(poly) else {
                continue;
            };
            for (wa, wb) in ctx.nav.wall_segments(poly) {
                let mid = (wa + wb) * 0.5;
                let normal = edge_outward_normal_2d(wa, wb, center);

                for cand in ctx.nav.query_polygons(mid, Vec3::splat(scan)) {
                    if tried.contains(&(poly, cand)) {
                        continue;
                    }
                    let Some(target) = graph.node_for_poly(cand).filter(|t| *t != node_id) else {
                        continue;
                    };
                    let skip = *reachable.entry(target).or_insert_with(|| {
                        graph.node(node_id).is_some_and(|n| n.has_link_to(target))
                            || Self::nodes_touch(graph, ctx, node_id, target)
                    });
                    if skip {
                        continue;
                    }

                    let Some(land) = ctx.nav.closest_point_on_poly(cand, mid) else {
                        continue;
                    };
                    if dist_2d(mid, land) > scan || direction_2d(mid, land).dot(normal) < facing_cos {
                        continue;
                    }
                    tried.insert((poly, cand));

                    let departure = closest_point_on_segment_2d(land, wa, wb);
                    let landing = self.inset_point(ctx, cand, land);
                    let target_water = graph.node(target).is_some_and(|n| n.physics_volume.water);

                    let traversal = if (source_water || target_water) && self.can_swim(ctx, departure, landing) {
                        Some(Traversal::Swim)
                    } else {
                        self.find_jump(graph, ctx, departure, landing, target)
                            .map(Traversal::Jump)
                    };
                    let Some(traversal) = traversal else {
                        continue;
                    };

                    let kind = match traversal {
                        Traversal::Swim => LinkKind::Swim,
                        Traversal::Jump(jump) if self.needs_spec(&jump) => LinkKind::HighJump,
                        Traversal::Jump(_) => LinkKind::Jump,
                    };
                    candidates.entry((target, kind)).or_default().push(Candidate {
                        start_poly: poly,
                        end_poly: cand,
                        landing,
                        traversal,
                    });
                }
            }
        }

        if candidates.is_empty() {
            return;
        }
        let size = self.jump_size(graph);
        for ((target, kind), group) in candidates {
            let Some(link) = group_link(node_id, target, kind, size, &group) else {
                continue;
            };
            self.log.log_debug(format!(
                "{kind:?} link {} -> {} from {} candidates",
                node_id.index(),
                target.index(),
                group.len()
            ));
            graph.add_link(link);
        }
        compute_node_distances(graph, ctx, node_id);
    }

    /// Jump-down links of pass 1 without a way back up.
    pub(super) fn collect_jump_down_links(&self, graph: &NavGraph, ctx: &NavContext<'_>) -> Vec<(NodeId, usize)> {
        let mut links = Vec::new();
        for (id, node) in graph.nodes() {
            for (index, link) in node.links.iter().enumerate() {
                if link.spec.is_some() || link.reach_flags != ReachFlags::JUMP {
                    continue;
                }
                let (Some(top), Some(bottom)) = (
                    ctx.nav.poly_center(link.start_edge_poly),
                    ctx.nav.poly_center(link.end_poly),
                ) else {
                    continue;
                };
                let returns = graph.node(link.end).is_some_and(|n| n.has_link_to(id));
                if top.y > bottom.y && !returns {
                    links.push((id, index));
                }
            }
        }
        links
    }

    /// Jump pass 2 for one jump-down link: probes the landing polygons
    /// nearest first for a jump back to where the link started.
    pub(super) fn jump_pass2_link(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>, node_id: NodeId, index: usize) {
        let Some(link) = graph.node(node_id).and_then(|n| n.links.get(index)).cloned() else {
            return;
        };
        if graph.node(link.end).map_or(true, |n| n.has_link_to(node_id)) {
            return;
        }
        let Some(end_center) = ctx.nav.poly_center(link.end_poly) else {
            return;
        };
        let Some(departure) = ctx.nav.closest_point_on_poly(link.start_edge_poly, end_center) else {
            return;
        };
        let landing = self.inset_point(ctx, link.start_edge_poly, departure);

        let mut polys: Vec<(f32, PolyRef, Vec3)> = link
            .end_polys()
            .filter_map(|p| {
                let near = ctx.nav.closest_point_on_poly(p, departure)?;
                Some((near.distance_squared(departure), p, near))
            })
            .collect();
        polys.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let size = self.jump_size(graph);
        for (_, poly, near) in polys {
            let start = self.inset_point(ctx, poly, near);
            let Some(jump) = self.find_jump(graph, ctx, start, landing, node_id) else {
                continue;
            };

            let mut reverse = PathLink::new(link.end, node_id, poly, link.start_edge_poly, size, ReachFlags::JUMP);
            if self.needs_spec(&jump) {
                reverse = reverse.with_spec(high_jump(&jump));
            }
            if graph.add_link(reverse) {
                self.log.log_debug(format!(
                    "reciprocal jump {} -> {} needs jump z {:.0}",
                    link.end.index(),
                    node_id.index(),
                    jump.required_jump_z
                ));
                compute_node_distances(graph, ctx, link.end);
            }
            return;
        }
    }

    /// Searches the smallest launch speed that carries the generation agent
    /// from `start` to a landing inside `target`. Walking speed jumps are
    /// tried first, dodge jumps after.
    pub fn find_jump(
        &self,
        graph: &NavGraph,
        ctx: &NavContext<'_>,
        start: Vec3,
        end: Vec3,
        target: NodeId,
    ) -> Option<JumpResult> {
        let volume = self.volume_at(ctx, start);
        if volume.water || volume.gravity >= 0.0 {
            return None;
        }
        let gravity = volume.gravity;
        let jump = &self.config.jump;
        let rise = (end.y - start.y).max(0.0);
        let min_jump_z = (2.0 * -gravity * rise).sqrt();

        let attempts = [
            (self.config.agent.move_speed, jump.max_jump_z, false),
            (jump.dodge_speed, jump.dodge_jump_z, true),
        ];
        for (speed, max_jump_z, dodge_jump) in attempts {
            let mut jump_z = min_jump_z;
            while jump_z <= max_jump_z {
                if self.simulate_jump(graph, ctx, start, end, speed, jump_z, gravity, target) {
                    return Some(JumpResult {
                        required_jump_z: jump_z,
                        dodge_jump,
                        gravity,
                        jump_start: start,
                        jump_end: end,
                    });
                }
                if jump.jump_z_step <= 0.0 {
                    break;
                }
                jump_z += jump.jump_z_step;
            }
        }
        None
    }

    /// Fixed step ballistic capsule simulation. Horizontal speed is constant
    /// until the target is reached horizontally. A rising capsule blocked
    /// horizontally keeps rising in place, a falling capsule blocked
    /// vertically is supported and lands if it stands in `target`.
    #[allow(clippy::too_many_arguments)]
    fn simulate_jump(
        &self,
        graph: &NavGraph,
        ctx: &NavContext<'_>,
        start: Vec3,
        end: Vec3,
        speed: f32,
        jump_z: f32,
        gravity: f32,
        target: NodeId,
    ) -> bool {
        let agent = &self.config.agent;
        let (radius, half_height) = (agent.radius, agent.height);
        let lift = Vec3::Y * (half_height + self.config.surface_offset);
        let blocked = |p: Vec3| ctx.world.overlap_capsule(p, radius, half_height);

        let mut pos = start + lift;
        if blocked(pos) {
            return false;
        }

        let dt = self.config.jump.time_step;
        let steps = (self.config.jump.max_flight_time / dt).ceil() as usize;
        let dir = direction_2d(start, end);
        let mut remaining = dist_2d(start, end);
        let mut vz = jump_z;

        for _ in 0..steps {
            let travel = (speed * dt).min(remaining);
            let next_vz = vz + gravity * dt;
            let rise = Vec3::Y * ((vz + next_vz) * 0.5 * dt);
            let horizontal = dir * travel;

            let next = pos + horizontal + rise;
            if !blocked(next) {
                pos = next;
                remaining -= travel;
                vz = next_vz;
                continue;
            }

            if vz > 0.0 {
                // Mantle: keep rising along the obstacle
                if blocked(pos + rise) {
                    return false;
                }
                pos += rise;
                vz = next_vz;
                continue;
            }

            if self.lands_in(graph, ctx, pos - lift, target) {
                return true;
            }
            if travel <= 0.0 || blocked(pos + horizontal) {
                return false;
            }
            pos += horizontal;
            remaining -= travel;
            vz = 0.0;
        }
        false
    }

    fn lands_in(&self, graph: &NavGraph, ctx: &NavContext<'_>, surface: Vec3, target: NodeId) -> bool {
        let agent = &self.config.agent;
        let extent = Vec3::new(agent.radius, agent.height + self.config.surface_offset, agent.radius);
        let Some((poly, _)) = ctx.nav.find_nearest_poly(surface, extent) else {
            return false;
        };
        graph.node_for_poly(poly) == Some(target) && !self.volume_at(ctx, surface).kill
    }

    fn can_swim(&self, ctx: &NavContext<'_>, start: Vec3, end: Vec3) -> bool {
        let agent = &self.config.agent;
        let lift = Vec3::Y * (agent.height + self.config.surface_offset);
        ctx.world
            .sweep_capsule(start + lift, end + lift, agent.radius, agent.height)
            .is_none()
    }

    /// Moves `point` towards the center of `poly` by the agent radius plus the
    /// surface offset, so a capsule placed there clears the poly border.
    fn inset_point(&self, ctx: &NavContext<'_>, poly: PolyRef, point: Vec3) -> Vec3 {
        let Some(center) = ctx.nav.poly_center(poly) else {
            return point;
        };
        let inset = (self.config.agent.radius + self.config.surface_offset).min(dist_2d(point, center));
        let moved = point + direction_2d(point, center) * inset;
        ctx.nav.closest_point_on_poly(poly, moved).unwrap_or(moved)
    }

    /// Jumps beyond a regular jump, or needing dodge speed, are high jumps.
    fn needs_spec(&self, jump: &JumpResult) -> bool {
        jump.dodge_jump || jump.required_jump_z > self.config.agent.jump_z
    }

    /// Collision size of generated jump links.
    fn jump_size(&self, graph: &NavGraph) -> CapsuleSize {
        let agent = &self.config.agent;
        graph
            .size_steps()
            .step(CapsuleSize::from_extent(agent.radius, agent.height))
    }
}

fn high_jump(jump: &JumpResult) -> ReachSpec {
    ReachSpec::HighJump {
        required_jump_z: jump.required_jump_z,
        gravity: jump.gravity,
        jump_start: jump.jump_start,
        jump_end: jump.jump_end,
        dodge_jump: jump.dodge_jump,
    }
}

/// Builds the link of a candidate group around the candidate landing closest
/// to the group centroid. The other landing polys become additional end polys.
fn group_link(start: NodeId, end: NodeId, kind: LinkKind, size: CapsuleSize, group: &[Candidate]) -> Option<PathLink> {
    let centroid = group.iter().map(|c| c.landing).sum::<Vec3>() / group.len().max(1) as f32;
    let canonical = group.iter().min_by(|a, b| {
        a.landing
            .distance_squared(centroid)
            .total_cmp(&b.landing.distance_squared(centroid))
            .then(a.end_poly.cmp(&b.end_poly))
    })?;

    let mut additional: Vec<PolyRef> = group
        .iter()
        .map(|c| c.end_poly)
        .filter(|p| *p != canonical.end_poly)
        .collect();
    additional.sort();
    additional.dedup();

    let flags = match kind {
        LinkKind::Swim => ReachFlags::SWIM,
        LinkKind::Jump | LinkKind::HighJump => ReachFlags::JUMP,
    };
    let link = PathLink::new(start, end, canonical.start_poly, canonical.end_poly, size, flags)
        .with_additional_end_polys(additional);

    Some(match (kind, canonical.traversal) {
        (LinkKind::HighJump, Traversal::Jump(jump)) => link.with_spec(high_jump(&jump)),
        _ => link,
    })
}
