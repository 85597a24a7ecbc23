//! POI seeding and node expansion

use glam::Vec3;
use pathgraph_common::{direction_2d, dist_2d};

use super::{NavContext, NetworkBuilder};
use crate::build_log::BuildWarning;
use crate::graph::NavGraph;
use crate::nav_query::{PolyEdge, PolyRef};
use crate::path_link::PathLink;
use crate::path_node::NodeId;
use crate::poi::{Poi, PoiKey};
use crate::reach::ReachFlags;
use crate::size::CapsuleSize;

impl NetworkBuilder {
    /// Binds every POI to a node. Regular POIs get (or share) the node of the
    /// polygon under them, destination-only POIs get a node covering their
    /// whole footprint.
    pub(super) fn seed_pois(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>) {
        let pois: Vec<(PoiKey, &Poi)> = ctx.pois.iter().collect();

        for (key, poi) in pois.iter().filter(|(_, p)| !p.destination_only) {
            let Some((poly, _)) = ctx.nav.find_nearest_poly(poi.location, poi.query_extent()) else {
                self.log.warn(BuildWarning::UnlinkablePoi {
                    name: poi.name.clone(),
                    location: poi.location,
                });
                continue;
            };
            let node = match graph.node_for_poly(poly) {
                Some(node) => node,
                None => self.create_node(graph, ctx, poly),
            };
            graph.anchor_poi(*key, node);
        }

        for (key, poi) in pois.iter().filter(|(_, p)| p.destination_only) {
            self.seed_destination(graph, ctx, *key, poi);
        }

        self.log.log_debug(format!(
            "seeded {} nodes from {} points of interest",
            graph.node_count(),
            pois.len()
        ));
    }

    fn seed_destination(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>, key: PoiKey, poi: &Poi) {
        let shrink = self.config.destination_shrink;
        let radius = poi.radius * shrink;
        let height = poi.height * shrink;

        let mut polys: Vec<PolyRef> = ctx
            .nav
            .query_polygons(poi.location, poi.query_extent())
            .into_iter()
            .filter(|p| !graph.is_blocked(*p))
            .filter(|p| {
                ctx.nav.poly_center(*p).is_some_and(|c| {
                    dist_2d(c, poi.location) <= radius && (c.y - poi.location.y).abs() <= height
                })
            })
            .collect();
        polys.sort();

        if polys.is_empty() {
            self.log.warn(BuildWarning::EmptyDestination {
                name: poi.name.clone(),
            });
            return;
        }

        let mut owners: Vec<NodeId> = polys.iter().filter_map(|p| graph.node_for_poly(*p)).collect();
        owners.sort();
        owners.dedup();

        let node = match owners.first() {
            Some(keep) => {
                for other in &owners[1..] {
                    graph.merge_nodes(*keep, *other);
                }
                *keep
            }
            None => {
                let volume = self.poly_volume(ctx, polys[0]);
                graph.add_node(graph.size_steps().smallest(), volume)
            }
        };
        for poly in &polys {
            graph.claim_poly(node, *poly);
        }
        if let Some(n) = graph.node_mut(node) {
            n.destination_only = true;
            n.min_poly_edge_size = CapsuleSize::from_extent(poi.radius, poi.height);
        }
        graph.anchor_poi(key, node);
    }

    /// Grows nodes until nothing changes, seeding a new node in every
    /// unclaimed region that expansion could not reach.
    pub(super) fn expand(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>) {
        let all_polys = ctx.nav.all_polys();
        let mut rounds = 0;

        loop {
            rounds += 1;
            loop {
                let mut grew = false;
                for node in graph.node_ids() {
                    grew |= self.expand_node(graph, ctx, node);
                }
                if !grew {
                    break;
                }
            }
            if !self.seed_unclaimed(graph, ctx, &all_polys) {
                break;
            }
        }

        self.log.log_debug(format!("expansion finished after {rounds} rounds"));
    }

    /// Breadth first growth of one node over its neighbouring polygons.
    /// Returns true if the node claimed a polygon or a new node was seeded.
    fn expand_node(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>, node_id: NodeId) -> bool {
        let mut grew = false;
        let mut cursor = 0;

        loop {
            let Some(node) = graph.node(node_id) else {
                return grew;
            };
            let Some(&poly) = node.polys.get(cursor) else {
                return grew;
            };
            let size = node.min_poly_edge_size;
            let volume_id = node.physics_volume.id;
            let destination_only = node.destination_only;
            cursor += 1;

            for edge in ctx.nav.poly_edges(poly) {
                let Some(neighbor) = edge.neighbor else {
                    continue;
                };
                if graph.is_blocked(neighbor) {
                    continue;
                }

                match graph.node_for_poly(neighbor) {
                    Some(other) if other == node_id => {}
                    Some(other) => {
                        self.link_nodes(graph, ctx, node_id, poly, other, neighbor, &edge);
                    }
                    None if edge.off_mesh || destination_only => {}
                    None => {
                        if self.poly_size(graph, ctx, neighbor).is_none() {
                            graph.mark_blocked(neighbor);
                            self.log.log_debug(BuildWarning::BlockedPoly { poly: neighbor }.to_string());
                            continue;
                        }
                        let edge_size = self.edge_size(graph, ctx, poly, neighbor, edge.midpoint());
                        let volume = self.poly_volume(ctx, neighbor);
                        if edge_size != size || volume.id != volume_id {
                            continue;
                        }

                        if self.would_duplicate_connection(graph, ctx, node_id, neighbor) {
                            let seeded = self.create_node(graph, ctx, neighbor);
                            self.link_nodes(graph, ctx, node_id, poly, seeded, neighbor, &edge);
                        } else {
                            graph.claim_poly(node_id, neighbor);
                        }
                        grew = true;
                    }
                }
            }
        }
    }

    /// True when claiming `candidate` would give `node` a second walking
    /// connection to a node it already reaches.
    fn would_duplicate_connection(
        &self,
        graph: &NavGraph,
        ctx: &NavContext<'_>,
        node: NodeId,
        candidate: PolyRef,
    ) -> bool {
        ctx.nav
            .poly_edges(candidate)
            .iter()
            .filter(|e| !e.off_mesh)
            .filter_map(|e| e.neighbor)
            .filter_map(|n| graph.node_for_poly(n))
            .filter(|other| *other != node)
            .any(|other| {
                graph.node(node).is_some_and(|n| n.has_link_to(other))
                    || Self::nodes_touch(graph, ctx, node, other)
            })
    }

    /// Seeds nodes in unclaimed polygons. Buried polygons are blocked and a
    /// polygon connected to a node seeded earlier in the same scan is left
    /// for that node to claim. Returns true if a node was seeded.
    fn seed_unclaimed(&mut self, graph: &mut NavGraph, ctx: &NavContext<'_>, all_polys: &[PolyRef]) -> bool {
        let mut seeded: Vec<(PolyRef, Vec3)> = Vec::new();

        for &poly in all_polys {
            if graph.node_for_poly(poly).is_some() || graph.is_blocked(poly) {
                continue;
            }
            let Some(center) = ctx.nav.poly_center(poly) else {
                continue;
            };
            if self.poly_size(graph, ctx, poly).is_none() {
                graph.mark_blocked(poly);
                self.log.log_debug(BuildWarning::BlockedPoly { poly }.to_string());
                continue;
            }
            let connected = seeded
                .iter()
                .any(|(p, c)| ctx.nav.find_poly_path(poly, *p, center, *c).is_some());
            if connected {
                continue;
            }
            self.create_node(graph, ctx, poly);
            seeded.push((poly, center));
        }

        !seeded.is_empty()
    }

    /// Adds the standard link `from -> to` across a mesh edge.
    #[allow(clippy::too_many_arguments)]
    fn link_nodes(
        &mut self,
        graph: &mut NavGraph,
        ctx: &NavContext<'_>,
        from: NodeId,
        from_poly: PolyRef,
        to: NodeId,
        to_poly: PolyRef,
        edge: &PolyEdge,
    ) {
        let Some(from_node) = graph.node(from) else {
            return;
        };
        let already_linked = from_node
            .links_to(to)
            .any(|l| l.spec.is_none() && !l.reach_flags.contains(ReachFlags::JUMP));
        if already_linked {
            return;
        }

        let from_volume = from_node.physics_volume;
        let to_volume = match graph.node(to) {
            Some(n) => n.physics_volume,
            None => return,
        };

        if from_volume.has_current() {
            let (Some(a), Some(b)) = (ctx.nav.poly_center(from_poly), ctx.nav.poly_center(to_poly)) else {
                return;
            };
            let current = direction_2d(Vec3::ZERO, from_volume.current);
            if direction_2d(a, b).dot(current) < -self.config.current_block_threshold {
                self.log.log_debug(format!(
                    "poly {} -> {} runs against the water current",
                    from_poly.id(),
                    to_poly.id()
                ));
                return;
            }
        }

        let flags = if from_volume.water || to_volume.water {
            ReachFlags::SWIM
        } else {
            ReachFlags::empty()
        };
        let size = if edge.off_mesh {
            let smallest = graph.size_steps().smallest();
            let a = self.poly_size(graph, ctx, from_poly).unwrap_or(smallest);
            let b = self.poly_size(graph, ctx, to_poly).unwrap_or(smallest);
            graph.size_steps().step(a.min(b))
        } else {
            self.edge_size(graph, ctx, from_poly, to_poly, edge.midpoint())
        };

        graph.add_link(PathLink::new(from, to, from_poly, to_poly, size, flags));
    }
}
