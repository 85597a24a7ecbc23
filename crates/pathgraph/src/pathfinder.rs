//! Best-first search over path nodes
//!
//! The search runs on nodes rather than polygons. Nodes are popped in order
//! of accumulated link cost and handed to a [`NodeEvaluator`]; the first
//! node weighing 1.0 or more ends the search, otherwise the best weighted
//! node seen becomes the destination. The node route is then turned into
//! [`RouteCacheItem`]s, optionally with a pickup detour, and items the agent
//! already stands on are pruned.

use glam::Vec3;
use pathgraph_common::direction_2d;

use crate::builder::NavContext;
use crate::config::NavGraphConfig;
use crate::evaluator::{EvalContext, NodeEvaluator, RouteGoal};
use crate::graph::NavGraph;
use crate::nav_query::PolyRef;
use crate::path_link::{PathLink, BLOCKED_PATH_COST};
use crate::path_node::NodeId;
use crate::poi::{PickupReservations, PoiKey, RequesterId};
use crate::reach::ReachParams;
use crate::reach_spec::ReachSpec;
use crate::route::RouteCacheItem;
use crate::search_pool::{OpenList, SearchFlags, SearchNode, SearchPool};
use crate::string_pull::has_reached_target;

/// Parameters of one path query.
#[derive(Debug, Clone)]
pub struct PathQuery<'a> {
    pub agent: ReachParams,
    /// Controller asking for the path, used for pickup reservations
    pub requester: Option<RequesterId>,
    pub team: Option<u8>,
    /// Agent location (capsule center)
    pub start: Vec3,
    /// Nodes must weigh more than this to be accepted as destination
    pub min_weight: f32,
    pub allow_detours: bool,
    pub reservations: Option<&'a PickupReservations>,
}

impl<'a> PathQuery<'a> {
    pub fn new(agent: ReachParams, start: Vec3) -> Self {
        Self {
            agent,
            requester: None,
            team: None,
            start,
            min_weight: 0.0,
            allow_detours: false,
            reservations: None,
        }
    }

    pub fn with_requester(mut self, requester: RequesterId, team: Option<u8>) -> Self {
        self.requester = Some(requester);
        self.team = team;
        self
    }

    pub fn with_min_weight(mut self, min_weight: f32) -> Self {
        self.min_weight = min_weight;
        self
    }

    pub fn with_detours(mut self, reservations: Option<&'a PickupReservations>) -> Self {
        self.allow_detours = true;
        self.reservations = reservations;
        self
    }
}

/// Successful search result.
#[derive(Debug, Clone, PartialEq)]
pub struct BestPath {
    /// Steps left to travel, leading steps already reached are pruned
    pub route: Vec<RouteCacheItem>,
    /// Nodes from the start node to the destination node
    pub node_route: Vec<NodeId>,
    /// Weight of the destination node
    pub weight: f32,
    /// Accumulated link cost to the destination node
    pub total_cost: i32,
}

/// Reusable search state.
#[derive(Debug, Default)]
pub struct Pathfinder {
    pool: SearchPool,
    open: OpenList,
}

impl Pathfinder {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: SearchPool::new(capacity),
            open: OpenList::new(capacity),
        }
    }

    /// Nodes touched by the last search
    pub fn visited_count(&self) -> usize {
        self.pool.visited_count()
    }

    /// Finds the best destination for `evaluator` reachable from
    /// `query.start`. Returns `None` when the start cannot be anchored or no
    /// node weighs more than `query.min_weight`.
    pub fn find_best_path(
        &mut self,
        graph: &NavGraph,
        ctx: &NavContext<'_>,
        config: &NavGraphConfig,
        query: &PathQuery<'_>,
        evaluator: &mut dyn NodeEvaluator,
    ) -> Option<BestPath> {
        let Some((start_node, start_poly, anchor)) = anchor_start(graph, ctx, config, query.start) else {
            log::debug!("path query start {} is not near any path node", query.start);
            return None;
        };

        let eval_ctx = EvalContext {
            graph,
            nav: ctx.nav,
            pois: ctx.pois,
            agent: &query.agent,
            start: anchor,
            query_extent: config.query_extent,
        };
        if !evaluator.init_for_search(&eval_ctx, start_node) {
            log::debug!("evaluator rejected search from node {}", start_node.index());
            return None;
        }

        let (goal, weight) = self.search(graph, ctx, &eval_ctx, query, evaluator, start_node, start_poly)?;

        let node_route = self.node_route(goal);
        let total_cost = self.pool.get(goal).map_or(0, |n| n.cost);
        let mut route = self.build_route(graph, ctx, &node_route, start_poly, anchor);
        if let Some(goal) = evaluator.route_goal(&eval_ctx) {
            route.push(goal_item(goal));
        }
        if query.allow_detours {
            let exclude = route.last().and_then(|item| item.poi);
            add_detour(graph, ctx, config, query, &mut route, exclude);
        }
        while route.len() > 1 && has_reached_target(ctx, query.start, &query.agent, &route[0]) {
            route.remove(0);
        }

        Some(BestPath {
            route,
            node_route,
            weight,
            total_cost,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &mut self,
        graph: &NavGraph,
        ctx: &NavContext<'_>,
        eval_ctx: &EvalContext<'_>,
        query: &PathQuery<'_>,
        evaluator: &mut dyn NodeEvaluator,
        start_node: NodeId,
        start_poly: PolyRef,
    ) -> Option<(NodeId, f32)> {
        self.pool.clear();
        self.open.clear();
        self.pool.insert(
            start_node,
            SearchNode {
                cost: 0,
                parent: None,
                parent_link: None,
                entry_poly: start_poly,
                flags: SearchFlags::OPEN,
            },
        );
        self.open.push(start_node, 0);

        let mut best: Option<(NodeId, f32)> = None;
        let mut best_weight = query.min_weight;

        while let Some((id, cost)) = self.open.pop() {
            let entry_poly = match self.pool.get_mut(id) {
                Some(state) => {
                    state.flags.remove(SearchFlags::OPEN);
                    state.flags.insert(SearchFlags::CLOSED);
                    state.entry_poly
                }
                None => continue,
            };

            let weight = evaluator.eval(eval_ctx, id, cost);
            // A full weight node is the goal even when min_weight asks for 1
            if weight > best_weight || (weight >= 1.0 && best.is_none()) {
                best_weight = weight;
                best = Some((id, weight));
            }
            if weight >= 1.0 {
                break;
            }

            let Some(node) = graph.node(id) else {
                continue;
            };
            let poly_index = node.poly_index(entry_poly).unwrap_or(0);

            for (link_index, link) in node.links.iter().enumerate() {
                if !link.supports(&query.agent) {
                    continue;
                }
                let link_cost = link.cost_for(&query.agent, poly_index, ctx.pois);
                if link_cost >= BLOCKED_PATH_COST {
                    continue;
                }
                let mut edge_cost = link_cost.saturating_add(evaluator.transient_cost(eval_ctx, link, cost));
                if edge_cost <= 0 {
                    log::warn!(
                        "link {} -> {} has non-positive cost {edge_cost}, clamping to 1",
                        link.start.index(),
                        link.end.index()
                    );
                    edge_cost = 1;
                }
                let total = cost.saturating_add(edge_cost);

                if let Some(existing) = self.pool.get(link.end) {
                    if existing.flags.contains(SearchFlags::CLOSED) || total >= existing.cost {
                        continue;
                    }
                }
                self.pool.insert(
                    link.end,
                    SearchNode {
                        cost: total,
                        parent: Some(id),
                        parent_link: Some(link_index),
                        entry_poly: link.end_poly,
                        flags: SearchFlags::OPEN,
                    },
                );
                self.open.push(link.end, total);
            }
        }

        if best.is_none() {
            log::debug!("no node reached the minimum weight {}", query.min_weight);
        }
        best
    }

    fn node_route(&self, goal: NodeId) -> Vec<NodeId> {
        let mut route = vec![goal];
        let mut current = goal;
        while let Some(parent) = self.pool.get(current).and_then(|n| n.parent) {
            route.push(parent);
            current = parent;
        }
        route.reverse();
        route
    }

    fn build_route(
        &self,
        graph: &NavGraph,
        ctx: &NavContext<'_>,
        node_route: &[NodeId],
        start_poly: PolyRef,
        anchor: Vec3,
    ) -> Vec<RouteCacheItem> {
        let mut route = Vec::with_capacity(node_route.len() + 2);
        let Some(&start) = node_route.first() else {
            return route;
        };
        route.push(RouteCacheItem::node(start, start_poly, anchor));

        let mut previous = anchor;
        for pair in node_route.windows(2) {
            let link = self
                .pool
                .get(pair[1])
                .and_then(|n| n.parent_link)
                .and_then(|i| graph.node(pair[0]).and_then(|n| n.links.get(i)));
            let Some(link) = link else {
                continue;
            };
            let location = arrival_point(ctx, link, previous);
            route.push(RouteCacheItem::node(pair[1], link.end_poly, location));
            previous = location;
        }
        route
    }
}

/// Surface point a traversal of `link` arrives at when coming from `previous`.
fn arrival_point(ctx: &NavContext<'_>, link: &PathLink, previous: Vec3) -> Vec3 {
    match &link.spec {
        Some(ReachSpec::HighJump { jump_end, .. }) => *jump_end,
        Some(ReachSpec::JumpPad { jump_target, .. }) => *jump_target,
        Some(ReachSpec::Lift { exit, .. }) | Some(ReachSpec::Teleporter { exit, .. }) => *exit,
        None => ctx
            .nav
            .closest_point_on_poly(link.end_poly, previous)
            .or_else(|| ctx.nav.poly_center(link.end_poly))
            .unwrap_or(previous),
    }
}

/// Final step of the route. It is not part of the node route, so it carries
/// no node and is reached by proximity.
fn goal_item(goal: RouteGoal) -> RouteCacheItem {
    if goal.target_poly.is_valid() {
        RouteCacheItem {
            node: None,
            poi: goal.poi,
            location: goal.location,
            target_poly: goal.target_poly,
            direct_target: false,
        }
    } else {
        RouteCacheItem::direct(goal.location).with_poi(goal.poi)
    }
}

/// Anchors the query start to a node: nearest poly in the query extent, then
/// in an expanded extent, then around radial samples in line of sight.
fn anchor_start(
    graph: &NavGraph,
    ctx: &NavContext<'_>,
    config: &NavGraphConfig,
    start: Vec3,
) -> Option<(NodeId, PolyRef, Vec3)> {
    let lookup = |center: Vec3, extent: Vec3| {
        let (poly, point) = ctx.nav.find_nearest_poly(center, extent)?;
        graph.node_for_poly(poly).map(|node| (node, poly, point))
    };

    let extent = config.query_extent;
    if let Some(found) = lookup(start, extent) {
        return Some(found);
    }
    if let Some(found) = lookup(start, extent * config.expanded_extent_scale) {
        return Some(found);
    }

    let count = config.anchor_sample_count.max(1);
    (0..count).find_map(|i| {
        let angle = std::f32::consts::TAU * i as f32 / count as f32;
        let sample = start + Vec3::new(angle.cos(), 0.0, angle.sin()) * config.anchor_sample_radius;
        if !ctx.world.line_of_sight(start, sample) {
            return None;
        }
        lookup(sample, extent)
    })
}

/// Inserts the most attractive pickup near the first leg of the route. Only
/// pickups anchored to the first two route nodes are considered.
fn add_detour(
    graph: &NavGraph,
    ctx: &NavContext<'_>,
    config: &NavGraphConfig,
    query: &PathQuery<'_>,
    route: &mut Vec<RouteCacheItem>,
    exclude: Option<PoiKey>,
) {
    if route.len() < 2 {
        return;
    }
    let detour = &config.detour;
    let from = route[0].location;
    let to = route[1].location;
    let direct = from.distance(to);
    let heading = direction_2d(from, to);
    let max_extra = query.agent.move_speed * detour.max_detour_time;

    let mut nodes: Vec<NodeId> = route[..2].iter().filter_map(|item| item.node).collect();
    nodes.dedup();

    let mut best: Option<(f32, PoiKey, NodeId)> = None;
    for node in nodes {
        let Some(pois) = graph.node(node).map(|n| &n.pois) else {
            continue;
        };
        for &key in pois {
            if Some(key) == exclude {
                continue;
            }
            let Some(poi) = ctx.pois.get(key).filter(|p| p.enabled) else {
                continue;
            };
            let Some(desirability) = poi.desirability().filter(|d| *d > 0.0) else {
                continue;
            };
            let reserved = query.reservations.is_some_and(|r| {
                r.is_reserved_against(key, query.requester.unwrap_or(RequesterId::MAX), query.team)
            });
            if reserved {
                continue;
            }

            let cos = if heading == Vec3::ZERO {
                1.0
            } else {
                direction_2d(from, poi.location).dot(heading)
            };
            if cos < detour.min_direction_cos {
                continue;
            }
            let extra = from.distance(poi.location) + poi.location.distance(to) - direct;
            if extra > max_extra * 0.5 * (1.0 + cos) {
                continue;
            }
            let weight = desirability / extra.max(1.0);
            if weight <= detour.min_weight || best.is_some_and(|(w, _, _)| w >= weight) {
                continue;
            }
            best = Some((weight, key, node));
        }
    }

    let Some((weight, key, node)) = best else {
        return;
    };
    let Some(poi) = ctx.pois.get(key) else {
        return;
    };
    let poly = ctx
        .nav
        .find_nearest_poly(poi.location, poi.query_extent())
        .map_or(PolyRef::NULL, |(p, _)| p);
    log::debug!("detour to {} with weight {weight:.3}", poi.name);
    route.insert(1, RouteCacheItem::poi(key, Some(node), poly, poi.location));
}
