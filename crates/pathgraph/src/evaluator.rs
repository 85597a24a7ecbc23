//! Node evaluation strategies for the pathfinder
//!
//! The search itself only orders nodes by cost. Deciding which node is the
//! destination, and how good it is, is delegated to a [`NodeEvaluator`].

use std::collections::{BTreeSet, HashMap};

use glam::Vec3;

use crate::graph::NavGraph;
use crate::nav_query::{NavQuery, PolyRef};
use crate::path_link::PathLink;
use crate::path_node::NodeId;
use crate::poi::{PoiKey, PoiRegistry};
use crate::reach::ReachParams;

/// Read-only state shared with evaluators during a search.
pub struct EvalContext<'a> {
    pub graph: &'a NavGraph,
    pub nav: &'a dyn NavQuery,
    pub pois: &'a PoiRegistry,
    pub agent: &'a ReachParams,
    /// Surface point the search starts from
    pub start: Vec3,
    /// Half-size of the box used to find the polygon under a point
    pub query_extent: Vec3,
}

/// Final off-node step appended after the node route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGoal {
    pub poi: Option<PoiKey>,
    pub location: Vec3,
    /// Polygon under the goal, null when the goal is off the mesh
    pub target_poly: PolyRef,
}

/// Scores nodes visited by the pathfinder.
pub trait NodeEvaluator {
    /// Prepares for a search starting in `start_node`. Returning false aborts
    /// the search.
    fn init_for_search(&mut self, _ctx: &EvalContext<'_>, _start_node: NodeId) -> bool {
        true
    }

    /// Weight of `node`. A weight of 1.0 or more ends the search.
    fn eval(&mut self, ctx: &EvalContext<'_>, node: NodeId, total_cost: i32) -> f32;

    /// Extra cost added when traversing `link`.
    fn transient_cost(&self, _ctx: &EvalContext<'_>, _link: &PathLink, _total_cost: i32) -> i32 {
        0
    }

    /// Step to append after the node route.
    fn route_goal(&self, _ctx: &EvalContext<'_>) -> Option<RouteGoal> {
        None
    }
}

/// Searches for the node containing a fixed point.
#[derive(Debug, Clone)]
pub struct SingleEndpointEval {
    goal: Vec3,
    goal_poi: Option<PoiKey>,
    goal_node: Option<NodeId>,
    goal_poly: PolyRef,
}

impl SingleEndpointEval {
    pub fn new(goal: Vec3) -> Self {
        Self {
            goal,
            goal_poi: None,
            goal_node: None,
            goal_poly: PolyRef::NULL,
        }
    }

    /// Targets a registered POI. Returns `None` for a dead key.
    pub fn for_poi(pois: &PoiRegistry, key: PoiKey) -> Option<Self> {
        let poi = pois.get(key)?;
        Some(Self {
            goal_poi: Some(key),
            ..Self::new(poi.location)
        })
    }

    pub fn goal(&self) -> Vec3 {
        self.goal
    }

    pub fn goal_node(&self) -> Option<NodeId> {
        self.goal_node
    }
}

impl NodeEvaluator for SingleEndpointEval {
    fn init_for_search(&mut self, ctx: &EvalContext<'_>, _start_node: NodeId) -> bool {
        if let Some(node) = self.goal_poi.and_then(|k| ctx.graph.node_for_poi(k)) {
            self.goal_node = Some(node);
            self.goal_poly = ctx
                .nav
                .find_nearest_poly(self.goal, ctx.query_extent)
                .map(|(poly, _)| poly)
                .filter(|poly| ctx.graph.node_for_poly(*poly) == Some(node))
                .unwrap_or(PolyRef::NULL);
            return true;
        }

        match ctx.nav.find_nearest_poly(self.goal, ctx.query_extent) {
            Some((poly, _)) => {
                self.goal_poly = poly;
                self.goal_node = ctx.graph.node_for_poly(poly);
                self.goal_node.is_some()
            }
            None => false,
        }
    }

    fn eval(&mut self, _ctx: &EvalContext<'_>, node: NodeId, _total_cost: i32) -> f32 {
        if Some(node) == self.goal_node {
            1.0
        } else {
            0.0
        }
    }

    fn route_goal(&self, _ctx: &EvalContext<'_>) -> Option<RouteGoal> {
        Some(RouteGoal {
            poi: self.goal_poi,
            location: self.goal,
            target_poly: self.goal_poly,
        })
    }
}

/// Fixed point goal with an extra cost for entering particular nodes.
#[derive(Debug, Clone)]
pub struct WeightedEndpointEval {
    inner: SingleEndpointEval,
    extra_costs: HashMap<NodeId, i32>,
}

impl WeightedEndpointEval {
    pub fn new(goal: Vec3) -> Self {
        Self {
            inner: SingleEndpointEval::new(goal),
            extra_costs: HashMap::new(),
        }
    }

    /// Adds `cost` to every traversal into `node`.
    pub fn with_extra_cost(mut self, node: NodeId, cost: i32) -> Self {
        *self.extra_costs.entry(node).or_insert(0) += cost;
        self
    }
}

impl NodeEvaluator for WeightedEndpointEval {
    fn init_for_search(&mut self, ctx: &EvalContext<'_>, start_node: NodeId) -> bool {
        self.inner.init_for_search(ctx, start_node)
    }

    fn eval(&mut self, ctx: &EvalContext<'_>, node: NodeId, total_cost: i32) -> f32 {
        self.inner.eval(ctx, node, total_cost)
    }

    fn transient_cost(&self, _ctx: &EvalContext<'_>, link: &PathLink, _total_cost: i32) -> i32 {
        self.extra_costs.get(&link.end).copied().unwrap_or(0)
    }

    fn route_goal(&self, ctx: &EvalContext<'_>) -> Option<RouteGoal> {
        self.inner.route_goal(ctx)
    }
}

/// Stops at the first node reached from a set of goal nodes.
#[derive(Debug, Clone, Default)]
pub struct MultiEndpointEval {
    goals: BTreeSet<NodeId>,
    reached: Option<NodeId>,
}

impl MultiEndpointEval {
    pub fn new(goals: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            goals: goals.into_iter().collect(),
            reached: None,
        }
    }

    /// Goal set made of the nodes the given POIs are anchored to.
    pub fn for_pois(graph: &NavGraph, pois: impl IntoIterator<Item = PoiKey>) -> Self {
        Self::new(pois.into_iter().filter_map(|k| graph.node_for_poi(k)))
    }

    /// Goal node the last search stopped at.
    pub fn reached(&self) -> Option<NodeId> {
        self.reached
    }
}

impl NodeEvaluator for MultiEndpointEval {
    fn init_for_search(&mut self, _ctx: &EvalContext<'_>, _start_node: NodeId) -> bool {
        self.reached = None;
        !self.goals.is_empty()
    }

    fn eval(&mut self, _ctx: &EvalContext<'_>, node: NodeId, _total_cost: i32) -> f32 {
        if self.goals.contains(&node) {
            self.reached = Some(node);
            1.0
        } else {
            0.0
        }
    }
}
