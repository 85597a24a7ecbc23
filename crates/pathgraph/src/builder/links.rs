//! Link distance tables and POI driven special paths

use glam::Vec3;
use pathgraph_common::distance_to_cost;

use super::{NavContext, NetworkBuilder};
use crate::build_log::BuildWarning;
use crate::graph::NavGraph;
use crate::nav_query::PolyRef;
use crate::path_link::PathLink;
use crate::path_node::NodeId;
use crate::poi::PoiKind;
use crate::reach::ReachFlags;
use crate::reach_spec::ReachSpec;

impl NetworkBuilder {
    /// Fills the distance table of every link that does not have one yet.
    pub(super) fn compute_missing_distances(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>) {
        let computed: usize = graph
            .node_ids()
            .into_iter()
            .map(|node| compute_node_distances(graph, ctx, node))
            .sum();

        if computed > 0 {
            self.log.log_debug(format!("computed distance tables for {computed} links"));
        }
    }

    /// Adds the links of jump pads, teleporters and lifts.
    pub(super) fn add_special_paths(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>) {
        let largest = graph.size_steps().largest();

        for node_id in graph.node_ids() {
            let Some(node) = graph.node(node_id) else {
                continue;
            };
            let pois = node.pois.clone();

            for key in pois {
                let Some(poi) = ctx.pois.get(key) else {
                    continue;
                };
                let (target, spec) = match &poi.kind {
                    PoiKind::JumpPad { jump_target } => (
                        *jump_target,
                        ReachSpec::JumpPad {
                            pad: key,
                            jump_target: *jump_target,
                        },
                    ),
                    PoiKind::Teleporter { exit } => (
                        *exit,
                        ReachSpec::Teleporter {
                            teleporter: key,
                            exit: *exit,
                        },
                    ),
                    PoiKind::Lift { exit } => (
                        *exit,
                        ReachSpec::Lift {
                            lift: key,
                            exit: *exit,
                        },
                    ),
                    PoiKind::Generic | PoiKind::Pickup { .. } => continue,
                };

                let start_poly = ctx
                    .nav
                    .find_nearest_poly(poi.location, poi.query_extent())
                    .map(|(p, _)| p)
                    .filter(|p| graph.node_for_poly(*p) == Some(node_id));
                let end = ctx
                    .nav
                    .find_nearest_poly(target, self.config.query_extent)
                    .and_then(|(p, _)| graph.node_for_poly(p).map(|n| (p, n)));

                let (Some(start_poly), Some((end_poly, end_node))) = (start_poly, end) else {
                    self.log.warn(BuildWarning::UnlinkablePoi {
                        name: poi.name.clone(),
                        location: target,
                    });
                    continue;
                };
                if end_node == node_id {
                    continue;
                }

                let kind = spec.kind_name();
                let link = PathLink::new(node_id, end_node, start_poly, end_poly, largest, ReachFlags::empty())
                    .with_spec(spec);
                if graph.add_link(link) {
                    self.log.log_debug(format!(
                        "{kind} link {} -> {} for {}",
                        node_id.index(),
                        end_node.index(),
                        poi.name
                    ));
                }
            }
        }
    }
}

/// Fills the missing distance tables of the links leaving `node_id`.
/// Returns the number of tables computed.
pub(super) fn compute_node_distances(graph: &mut NavGraph, ctx: &NavContext<'_>, node_id: NodeId) -> usize {
    let Some(node) = graph.node(node_id) else {
        return 0;
    };
    let pending: Vec<(usize, Vec<i32>)> = node
        .links
        .iter()
        .enumerate()
        .filter(|(_, l)| l.distances.is_empty())
        .map(|(i, l)| (i, link_distances(ctx, &node.polys, l)))
        .collect();

    let count = pending.len();
    if let Some(node) = graph.node_mut(node_id) {
        for (index, distances) in pending {
            node.links[index].distances = distances;
        }
    }
    count
}

/// Point in `link.start_edge_poly` the traversal departs from and the point
/// it arrives at. Standard links depart through the mesh and arrive at the
/// center of the end polygon.
fn link_endpoints(ctx: &NavContext<'_>, link: &PathLink) -> Option<(Vec3, Vec3)> {
    let end_center = ctx.nav.poly_center(link.end_poly)?;

    if let Some(points) = link.spec.as_ref().and_then(|s| s.move_points(ctx.pois)) {
        let first = *points.first()?;
        let last = *points.last()?;
        return Some((first, last));
    }
    if !link.reach_flags.contains(ReachFlags::JUMP) {
        return Some((end_center, end_center));
    }
    let departure = ctx.nav.closest_point_on_poly(link.start_edge_poly, end_center)?;
    let arrival = ctx
        .nav
        .closest_point_on_poly(link.end_poly, departure)
        .unwrap_or(end_center);
    Some((departure, arrival))
}

/// Cost from the center of each poly of the start node to the end of `link`.
fn link_distances(ctx: &NavContext<'_>, polys: &[PolyRef], link: &PathLink) -> Vec<i32> {
    let Some((departure, arrival)) = link_endpoints(ctx, link) else {
        return vec![distance_to_cost(0.0); polys.len()];
    };
    let hop = departure.distance(arrival);
    let standard = hop == 0.0;

    polys
        .iter()
        .map(|&poly| {
            let Some(from) = ctx.nav.poly_center(poly) else {
                return distance_to_cost(hop);
            };
            let distance = if standard {
                walk_distance(ctx, poly, from, link.end_poly, arrival, link.start_edge_poly)
            } else {
                walk_distance(ctx, poly, from, link.start_edge_poly, departure, link.start_edge_poly) + hop
            };
            distance_to_cost(distance)
        })
        .collect()
}

/// Distance walked from `from` in `poly` to `to` in `to_poly`: straight when
/// the mesh raycast reaches it, along the string pulled path otherwise, and
/// through `via_poly` as a last resort.
fn walk_distance(ctx: &NavContext<'_>, poly: PolyRef, from: Vec3, to_poly: PolyRef, to: Vec3, via_poly: PolyRef) -> f32 {
    if poly == to_poly {
        return from.distance(to);
    }
    if let Some(hit) = ctx.nav.raycast(poly, from, to) {
        if !hit.hit_wall() && hit.last_poly == to_poly {
            return from.distance(to);
        }
    }
    if let Some(distance) = ctx.nav.path_distance(poly, from, to_poly, to) {
        return distance;
    }
    let via = ctx.nav.poly_center(via_poly).unwrap_or(from);
    ctx.nav
        .path_distance(poly, from, via_poly, via)
        .map(|d| d + via.distance(to))
        .unwrap_or_else(|| from.distance(to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavGraphConfig;
    use crate::test_helpers::{flat_room, Scene};

    #[test]
    fn test_flat_room_link_cost_is_center_distance() {
        let Scene { mesh, world, pois, .. } = flat_room();
        let ctx = NavContext::new(&mesh, &world, &pois);
        let mut graph = NavGraph::default();
        NetworkBuilder::new(NavGraphConfig::default()).build(&mut graph, &ctx);

        let a = graph.node_for_poly(PolyRef::new(1)).unwrap();
        let b = graph.node_for_poly(PolyRef::new(2)).unwrap();
        let link = graph.node(a).unwrap().walk_link_to(b).unwrap();
        assert_eq!(link.distances, vec![2000]);
    }
}
