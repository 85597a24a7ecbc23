//! Node network builder
//!
//! Builds the path node graph over a navigation mesh as a resumable state
//! machine. A host drives it by calling [`NetworkBuilder::advance`] once per
//! tick; seeding, expansion, distance tables and special paths complete in
//! the first call while the two jump passes are spread over as many calls as
//! the item budget requires.
//!
//! # Phases
//!
//! 1. **SeedPois**: bind points of interest to polygons
//! 2. **Expand**: grow nodes over compatible polygons, link neighbouring
//!    nodes and seed islands
//! 3. **Distances**: per-poly cost tables of the standard links
//! 4. **SpecialPaths**: jump pad, teleporter and lift links
//! 5. **JumpPass1**: wall based jump and swim link discovery
//! 6. **JumpPass2**: reciprocal jumps back up from jump-down links

mod expand;
mod jump;
mod links;

use std::collections::HashMap;

use glam::Vec3;

use crate::build_log::{BuildLog, BuildTimer};
use crate::collision::{CollisionWorld, PhysicsVolume};
use crate::config::NavGraphConfig;
use crate::graph::NavGraph;
use crate::nav_query::{NavQuery, PolyRef};
use crate::path_node::NodeId;
use crate::poi::PoiRegistry;
use crate::size::CapsuleSize;

pub use jump::JumpResult;

/// External collaborators used while building and querying the network.
#[derive(Clone, Copy)]
pub struct NavContext<'a> {
    pub nav: &'a dyn NavQuery,
    pub world: &'a dyn CollisionWorld,
    pub pois: &'a PoiRegistry,
}

impl<'a> NavContext<'a> {
    pub fn new(nav: &'a dyn NavQuery, world: &'a dyn CollisionWorld, pois: &'a PoiRegistry) -> Self {
        Self { nav, world, pois }
    }
}

/// Current phase of a network build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhase {
    Idle,
    SeedPois,
    Expand,
    Distances,
    SpecialPaths,
    JumpPass1,
    JumpPass2,
    Done,
}

/// Resumable builder of a [`NavGraph`].
#[derive(Debug)]
pub struct NetworkBuilder {
    config: NavGraphConfig,
    phase: BuildPhase,
    cursor: usize,
    jump_nodes: Vec<NodeId>,
    jump_down_links: Vec<(NodeId, usize)>,
    /// Raw size measured at a polygon center, `None` when nothing fits
    poly_sizes: HashMap<PolyRef, Option<CapsuleSize>>,
    log: BuildLog,
}

impl NetworkBuilder {
    pub fn new(config: NavGraphConfig) -> Self {
        Self {
            config,
            phase: BuildPhase::Idle,
            cursor: 0,
            jump_nodes: Vec::new(),
            jump_down_links: Vec::new(),
            poly_sizes: HashMap::new(),
            log: BuildLog::new(),
        }
    }

    pub fn config(&self) -> &NavGraphConfig {
        &self.config
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// True while a build has started and not finished yet.
    pub fn is_building(&self) -> bool {
        !matches!(self.phase, BuildPhase::Idle | BuildPhase::Done)
    }

    pub fn is_done(&self) -> bool {
        self.phase == BuildPhase::Done
    }

    pub fn log(&self) -> &BuildLog {
        &self.log
    }

    /// Discards the graph and prepares a new build.
    pub fn start(&mut self, graph: &mut NavGraph) {
        graph.delete_paths();
        graph.set_size_steps(self.config.steps());
        self.phase = BuildPhase::SeedPois;
        self.cursor = 0;
        self.jump_nodes.clear();
        self.jump_down_links.clear();
        self.poly_sizes.clear();
        self.log.clear();
        self.log.start_timer(BuildTimer::Total);
    }

    /// Abandons the current build.
    pub fn reset(&mut self) {
        self.phase = BuildPhase::Idle;
        self.cursor = 0;
        self.jump_nodes.clear();
        self.jump_down_links.clear();
        self.poly_sizes.clear();
    }

    /// Starts a build and runs it to completion.
    pub fn build(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>) {
        self.start(graph);
        while self.is_building() {
            self.advance(graph, ctx, usize::MAX);
        }
    }

    /// Advances the build. `max_items` bounds the nodes of jump pass 1 and
    /// the links of jump pass 2 processed by this call.
    pub fn advance(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>, max_items: usize) -> BuildPhase {
        let mut budget = max_items.max(1);

        loop {
            match self.phase {
                BuildPhase::Idle | BuildPhase::Done => return self.phase,
                BuildPhase::SeedPois => {
                    self.log.start_timer(BuildTimer::SeedPois);
                    self.seed_pois(graph, ctx);
                    self.log.stop_timer(BuildTimer::SeedPois);
                    self.phase = BuildPhase::Expand;
                }
                BuildPhase::Expand => {
                    self.log.start_timer(BuildTimer::Expand);
                    self.expand(graph, ctx);
                    self.log.stop_timer(BuildTimer::Expand);
                    self.log.log_debug(format!(
                        "expansion produced {} nodes and {} links",
                        graph.node_count(),
                        graph.link_count()
                    ));
                    self.phase = BuildPhase::Distances;
                }
                BuildPhase::Distances => {
                    self.log.start_timer(BuildTimer::Distances);
                    self.compute_missing_distances(graph, ctx);
                    self.log.stop_timer(BuildTimer::Distances);
                    self.phase = BuildPhase::SpecialPaths;
                }
                BuildPhase::SpecialPaths => {
                    self.log.start_timer(BuildTimer::SpecialPaths);
                    self.add_special_paths(graph, ctx);
                    self.compute_missing_distances(graph, ctx);
                    self.log.stop_timer(BuildTimer::SpecialPaths);
                    self.jump_nodes = graph.node_ids();
                    self.cursor = 0;
                    self.phase = BuildPhase::JumpPass1;
                }
                BuildPhase::JumpPass1 => {
                    self.log.start_timer(BuildTimer::JumpPass1);
                    while self.cursor < self.jump_nodes.len() && budget > 0 {
                        let node = self.jump_nodes[self.cursor];
                        self.cursor += 1;
                        budget -= 1;
                        self.jump_pass1_node(graph, ctx, node);
                    }
                    self.log.stop_timer(BuildTimer::JumpPass1);
                    if self.cursor < self.jump_nodes.len() {
                        return self.phase;
                    }
                    self.compute_missing_distances(graph, ctx);
                    self.jump_down_links = self.collect_jump_down_links(graph, ctx);
                    self.cursor = 0;
                    self.phase = BuildPhase::JumpPass2;
                    if budget == 0 {
                        return self.phase;
                    }
                }
                BuildPhase::JumpPass2 => {
                    self.log.start_timer(BuildTimer::JumpPass2);
                    while self.cursor < self.jump_down_links.len() && budget > 0 {
                        let (node, link) = self.jump_down_links[self.cursor];
                        self.cursor += 1;
                        budget -= 1;
                        self.jump_pass2_link(graph, ctx, node, link);
                    }
                    self.log.stop_timer(BuildTimer::JumpPass2);
                    if self.cursor < self.jump_down_links.len() {
                        return self.phase;
                    }
                    self.compute_missing_distances(graph, ctx);
                    self.finish(graph);
                }
            }
        }
    }

    fn finish(&mut self, graph: &NavGraph) {
        self.log.stop_timer(BuildTimer::Total);
        self.phase = BuildPhase::Done;
        self.jump_nodes.clear();
        self.jump_down_links.clear();
        self.log.log_info(format!(
            "path network built: {} nodes, {} links, {} blocked polys, {} warnings",
            graph.node_count(),
            graph.link_count(),
            graph.blocked_polys().count(),
            self.log.warnings().len()
        ));
    }

    /// Raw clearance at a surface point: the largest registered radius (at
    /// the smallest height) and the largest registered height (at the
    /// smallest radius) that fit. `None` if not even the smallest size fits.
    fn measure_size(&self, graph: &NavGraph, ctx: &NavContext<'_>, surface: Vec3) -> Option<CapsuleSize> {
        let steps = graph.size_steps();
        let smallest = steps.smallest();
        let offset = self.config.surface_offset;
        let fits = |radius: i32, height: i32| {
            let center = surface + Vec3::Y * (offset + height as f32);
            !ctx.world.overlap_capsule(center, radius as f32, height as f32)
        };

        if !fits(smallest.radius, smallest.height) {
            return None;
        }
        let radius = steps
            .radii()
            .iter()
            .rev()
            .copied()
            .find(|r| fits(*r, smallest.height))
            .unwrap_or(smallest.radius);
        let height = steps
            .heights()
            .iter()
            .rev()
            .copied()
            .find(|h| fits(smallest.radius, *h))
            .unwrap_or(smallest.height);
        Some(CapsuleSize::new(radius, height))
    }

    /// Cached raw size at the center of a polygon.
    fn poly_size(&mut self, graph: &NavGraph, ctx: &NavContext<'_>, poly: PolyRef) -> Option<CapsuleSize> {
        if let Some(size) = self.poly_sizes.get(&poly) {
            return *size;
        }
        let size = ctx
            .nav
            .poly_center(poly)
            .and_then(|center| self.measure_size(graph, ctx, center));
        self.poly_sizes.insert(poly, size);
        size
    }

    /// Stepped size of the crossing between two adjacent polygons.
    fn edge_size(
        &mut self,
        graph: &NavGraph,
        ctx: &NavContext<'_>,
        from: PolyRef,
        to: PolyRef,
        crossing: Vec3,
    ) -> CapsuleSize {
        let steps = graph.size_steps();
        let smallest = steps.smallest();
        let a = self.poly_size(graph, ctx, from).unwrap_or(smallest);
        let b = self.poly_size(graph, ctx, to).unwrap_or(smallest);
        let mid = self.measure_size(graph, ctx, crossing).unwrap_or(smallest);
        graph.size_steps().step(a.min(mid).min(b))
    }

    fn volume_at(&self, ctx: &NavContext<'_>, surface: Vec3) -> PhysicsVolume {
        ctx.world
            .physics_volume(surface + Vec3::Y * self.config.surface_offset)
    }

    fn poly_volume(&self, ctx: &NavContext<'_>, poly: PolyRef) -> PhysicsVolume {
        match ctx.nav.poly_center(poly) {
            Some(center) => self.volume_at(ctx, center),
            None => PhysicsVolume::default(),
        }
    }

    /// Creates a singleton node for an unclaimed polygon.
    fn create_node(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>, poly: PolyRef) -> NodeId {
        let smallest = graph.size_steps().smallest();
        let size = self
            .poly_size(graph, ctx, poly)
            .map(|s| graph.size_steps().step(s))
            .unwrap_or(smallest);
        let volume = self.poly_volume(ctx, poly);
        let node = graph.add_node(size, volume);
        graph.claim_poly(node, poly);
        node
    }

    /// True when a polygon of `a` shares a mesh edge with a polygon of `b`.
    fn nodes_touch(graph: &NavGraph, ctx: &NavContext<'_>, a: NodeId, b: NodeId) -> bool {
        let Some(node) = graph.node(a) else {
            return false;
        };
        node.polys.iter().any(|poly| {
            ctx.nav.poly_edges(*poly).iter().any(|e| {
                !e.off_mesh && e.neighbor.is_some_and(|n| graph.node_for_poly(n) == Some(b))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{flat_room, Scene};

    #[test]
    fn test_advance_walks_through_phases() {
        let Scene { mesh, world, pois, .. } = flat_room();
        let ctx = NavContext::new(&mesh, &world, &pois);
        let mut graph = NavGraph::default();
        let mut builder = NetworkBuilder::new(NavGraphConfig::default());

        assert_eq!(builder.advance(&mut graph, &ctx, 1), BuildPhase::Idle);
        builder.start(&mut graph);
        assert!(builder.is_building());

        let mut calls = 0;
        while builder.is_building() {
            builder.advance(&mut graph, &ctx, 1);
            calls += 1;
            assert!(calls < 100);
        }
        assert!(builder.is_done());
        // One node per call in the first jump pass
        assert!(calls >= graph.node_count());
        assert!(builder.log().timer(BuildTimer::Total).is_some());
    }

    #[test]
    fn test_measure_size_under_low_ceiling() {
        let Scene { mesh, mut world, pois, .. } = flat_room();
        world.add_solid(Vec3::new(-100.0, 230.0, -100.0), Vec3::new(500.0, 300.0, 500.0));
        let ctx = NavContext::new(&mesh, &world, &pois);
        let mut graph = NavGraph::default();
        let mut builder = NetworkBuilder::new(NavGraphConfig::default());
        builder.start(&mut graph);

        let open = builder.measure_size(&graph, &ctx, Vec3::new(1500.0, 0.0, 1500.0));
        assert_eq!(open, Some(CapsuleSize::new(80, 150)));
        let low = builder.measure_size(&graph, &ctx, Vec3::new(200.0, 0.0, 200.0));
        assert_eq!(low, Some(CapsuleSize::new(80, 90)));
    }
}
