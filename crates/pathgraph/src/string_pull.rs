//! Move point generation along a route
//!
//! Turns the next route item into the waypoints an agent walks through in
//! straight lines. Points are raised from the mesh surface to the agent's
//! capsule center.

use glam::Vec3;
use pathgraph_common::dist_2d;

use crate::builder::NavContext;
use crate::config::NavGraphConfig;
use crate::graph::NavGraph;
use crate::nav_query::PolyRef;
use crate::path_link::{PathLink, BLOCKED_PATH_COST};
use crate::path_node::NodeId;
use crate::reach::ReachParams;
use crate::route::RouteCacheItem;

/// Waypoints from `origin` (capsule center) to the first item of `route`.
///
/// When the item lies in another node, the cheapest usable link into that
/// node decides first: a link with a reach spec provides its own points, a
/// jump or swim link is string pulled to its departure point followed by the
/// landing. Everything else is a funnel pulled polygon corridor.
pub fn get_move_points(
    graph: &NavGraph,
    ctx: &NavContext<'_>,
    config: &NavGraphConfig,
    origin: Vec3,
    agent: &ReachParams,
    route: &[RouteCacheItem],
) -> Vec<Vec3> {
    let Some(target) = route.first() else {
        return Vec::new();
    };
    let raise = |points: Vec<Vec3>| -> Vec<Vec3> {
        points.into_iter().map(|p| p + Vec3::Y * agent.height).collect()
    };

    let origin_anchor = ctx.nav.find_nearest_poly(origin, config.query_extent);
    let Some((origin_poly, origin_surface)) = origin_anchor.filter(|_| !target.direct_target) else {
        return raise(vec![target.location]);
    };

    let current = graph.node_for_poly(origin_poly);
    if let (Some(current), Some(next)) = (current, target.node) {
        if current != next {
            if let Some(link) = cheapest_link(graph, ctx, current, next, origin_poly, agent) {
                if let Some(points) = link.spec.as_ref().and_then(|s| s.move_points(ctx.pois)) {
                    if let Some((first, rest)) = points.split_first() {
                        let mut out = corridor(ctx, origin_poly, origin_surface, link.start_edge_poly, *first);
                        out.extend_from_slice(rest);
                        return raise(out);
                    }
                }
                if !link.is_walk() {
                    if let Some((departure, landing)) = jump_points(ctx, link) {
                        let mut out = corridor(ctx, origin_poly, origin_surface, link.start_edge_poly, departure);
                        out.push(landing);
                        return raise(out);
                    }
                }
            }
        }
    }

    let end_poly = if target.target_poly.is_valid() {
        Some(target.target_poly)
    } else {
        ctx.nav
            .find_nearest_poly(target.location, config.query_extent)
            .map(|(p, _)| p)
    };
    match end_poly {
        Some(end_poly) => raise(corridor(ctx, origin_poly, origin_surface, end_poly, target.location)),
        None => raise(vec![target.location]),
    }
}

/// True when an agent at `location` (capsule center) has reached `item`.
///
/// Node waypoints are reached by standing on their target polygon. POI,
/// goal and off-mesh items need the capsule to touch the target location.
pub fn has_reached_target(ctx: &NavContext<'_>, location: Vec3, agent: &ReachParams, item: &RouteCacheItem) -> bool {
    let feet = location.y - agent.height;
    let mesh_waypoint = item.node.is_some() && item.poi.is_none() && item.target_poly.is_valid() && !item.direct_target;

    if !mesh_waypoint {
        let (radius, height) = item
            .poi
            .and_then(|k| ctx.pois.get(k))
            .map_or((0.0, 0.0), |p| (p.radius, p.height));
        return dist_2d(location, item.location) <= agent.radius + radius
            && (feet - item.location.y).abs() <= agent.height + height;
    }

    match ctx.nav.closest_point_on_poly(item.target_poly, location) {
        Some(p) => dist_2d(p, location) < 1.0 && (feet - p.y).abs() <= agent.height,
        None => false,
    }
}

/// Cheapest link from `current` to `next` the agent can use when leaving
/// from `poly`.
fn cheapest_link<'g>(
    graph: &'g NavGraph,
    ctx: &NavContext<'_>,
    current: NodeId,
    next: NodeId,
    poly: PolyRef,
    agent: &ReachParams,
) -> Option<&'g PathLink> {
    let node = graph.node(current)?;
    let index = node.poly_index(poly).unwrap_or(0);
    node.links_to(next)
        .filter(|l| l.supports(agent))
        .map(|l| (l.cost_for(agent, index, ctx.pois), l))
        .filter(|(cost, _)| *cost < BLOCKED_PATH_COST)
        .min_by_key(|(cost, _)| *cost)
        .map(|(_, l)| l)
}

/// Departure point in the start edge poly and landing point in the end poly
/// of a link without a reach spec.
fn jump_points(ctx: &NavContext<'_>, link: &PathLink) -> Option<(Vec3, Vec3)> {
    let end_center = ctx.nav.poly_center(link.end_poly)?;
    let departure = ctx.nav.closest_point_on_poly(link.start_edge_poly, end_center)?;
    let landing = ctx.nav.closest_point_on_poly(link.end_poly, departure)?;
    Some((departure, landing))
}

/// String pulled corners from `start` to `end`, start point excluded. Falls
/// back to a straight line when the polygons are not connected.
fn corridor(ctx: &NavContext<'_>, start_poly: PolyRef, start: Vec3, end_poly: PolyRef, end: Vec3) -> Vec<Vec3> {
    let Some(polys) = ctx.nav.find_poly_path(start_poly, end_poly, start, end) else {
        return vec![end];
    };
    let points: Vec<Vec3> = ctx
        .nav
        .find_straight_path(start, end, &polys)
        .into_iter()
        .skip(1)
        .collect();
    if points.is_empty() {
        vec![end]
    } else {
        points
    }
}
