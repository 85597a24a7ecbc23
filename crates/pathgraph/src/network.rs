//! Path network orchestration
//!
//! [`PathNetwork`] owns the graph and its builder. The host calls
//! [`PathNetwork::tick`] every frame; the network tears the graph down as
//! soon as the navigation mesh starts regenerating and rebuilds it when a
//! new mesh generation appears.

use glam::Vec3;
use pathgraph_common::Result;

use crate::build_log::BuildLog;
use crate::builder::{BuildPhase, NavContext, NetworkBuilder};
use crate::config::NavGraphConfig;
use crate::evaluator::NodeEvaluator;
use crate::graph::{GraphSummary, NavGraph};
use crate::nav_query::PolyRef;
use crate::path_node::NodeId;
use crate::pathfinder::{BestPath, PathQuery, Pathfinder};
use crate::reach::ReachParams;
use crate::route::RouteCacheItem;
use crate::string_pull;

/// Path node network over one navigation mesh.
#[derive(Debug)]
pub struct PathNetwork {
    config: NavGraphConfig,
    graph: NavGraph,
    builder: NetworkBuilder,
    pathfinder: Pathfinder,
    /// Mesh generation the graph was built from
    built_generation: Option<u64>,
}

impl PathNetwork {
    pub fn new(config: NavGraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            graph: NavGraph::new(config.steps()),
            builder: NetworkBuilder::new(config.clone()),
            pathfinder: Pathfinder::default(),
            built_generation: None,
            config,
        })
    }

    pub fn config(&self) -> &NavGraphConfig {
        &self.config
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn build_log(&self) -> &BuildLog {
        self.builder.log()
    }

    pub fn build_phase(&self) -> BuildPhase {
        self.builder.phase()
    }

    /// True once a build has completed and no newer one is running.
    pub fn is_ready(&self) -> bool {
        self.builder.is_done() && !self.graph.is_empty()
    }

    /// Polls the navigation mesh and advances any running build.
    pub fn tick(&mut self, ctx: &NavContext<'_>) -> BuildPhase {
        if ctx.nav.is_build_in_progress() {
            if !self.graph.is_empty() || self.builder.is_building() {
                log::debug!("navigation mesh is regenerating, deleting paths");
                self.graph.delete_paths();
                self.builder.reset();
            }
            self.built_generation = None;
            return self.builder.phase();
        }

        let generation = ctx.nav.generation();
        if self.built_generation != Some(generation) {
            log::info!("building path network for mesh generation {generation}");
            self.built_generation = Some(generation);
            self.builder.start(&mut self.graph);
        }

        if self.builder.is_building() {
            self.builder
                .advance(&mut self.graph, ctx, self.config.nodes_per_tick);
        }
        self.builder.phase()
    }

    /// Rebuilds the network. A user requested rebuild runs to completion
    /// immediately, otherwise the jump passes continue over later ticks.
    pub fn rebuild(&mut self, ctx: &NavContext<'_>, user_requested: bool) {
        self.built_generation = Some(ctx.nav.generation());
        self.builder.start(&mut self.graph);
        let budget = if user_requested {
            usize::MAX
        } else {
            self.config.nodes_per_tick
        };
        while self.builder.is_building() {
            self.builder.advance(&mut self.graph, ctx, budget);
            if !user_requested {
                break;
            }
        }
    }

    /// See [`Pathfinder::find_best_path`]. Returns `None` until the running
    /// build has finished.
    pub fn find_best_path(
        &mut self,
        ctx: &NavContext<'_>,
        query: &PathQuery<'_>,
        evaluator: &mut dyn NodeEvaluator,
    ) -> Option<BestPath> {
        if !self.is_ready() {
            log::debug!("path query during {:?}, network is not ready", self.builder.phase());
            return None;
        }
        self.pathfinder
            .find_best_path(&self.graph, ctx, &self.config, query, evaluator)
    }

    /// See [`string_pull::get_move_points`].
    pub fn get_move_points(
        &self,
        ctx: &NavContext<'_>,
        origin: Vec3,
        agent: &ReachParams,
        route: &[RouteCacheItem],
    ) -> Vec<Vec3> {
        string_pull::get_move_points(&self.graph, ctx, &self.config, origin, agent, route)
    }

    /// See [`string_pull::has_reached_target`].
    pub fn has_reached_target(
        &self,
        ctx: &NavContext<'_>,
        location: Vec3,
        agent: &ReachParams,
        item: &RouteCacheItem,
    ) -> bool {
        string_pull::has_reached_target(ctx, location, agent, item)
    }

    pub fn node_for_poly(&self, poly: PolyRef) -> Option<NodeId> {
        self.graph.node_for_poly(poly)
    }

    pub fn summary(&self) -> GraphSummary {
        self.graph.summary()
    }
}
