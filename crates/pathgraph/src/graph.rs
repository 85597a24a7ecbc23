//! Node arena
//!
//! Nodes are addressed by [`NodeId`] and never move. Merging moves the
//! members of one node into another and tombstones the absorbed node, so ids
//! held while iterating stay valid.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::collision::PhysicsVolume;
use crate::nav_query::PolyRef;
use crate::path_link::PathLink;
use crate::path_node::{NodeId, PathNode};
use crate::poi::PoiKey;
use crate::size::{CapsuleSize, SizeSteps};

/// The path node network built over a navigation mesh.
#[derive(Debug, Clone, Default)]
pub struct NavGraph {
    nodes: Vec<PathNode>,
    poly_to_node: HashMap<PolyRef, NodeId>,
    blocked: BTreeSet<PolyRef>,
    poi_to_node: HashMap<PoiKey, NodeId>,
    size_steps: SizeSteps,
}

impl NavGraph {
    pub fn new(size_steps: SizeSteps) -> Self {
        Self {
            size_steps,
            ..Default::default()
        }
    }

    pub fn size_steps(&self) -> &SizeSteps {
        &self.size_steps
    }

    pub fn set_size_steps(&mut self, size_steps: SizeSteps) {
        self.size_steps = size_steps;
    }

    /// Discards every node, link and blocked poly.
    pub fn delete_paths(&mut self) {
        self.nodes.clear();
        self.poly_to_node.clear();
        self.blocked.clear();
        self.poi_to_node.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    pub fn add_node(&mut self, size: CapsuleSize, volume: PhysicsVolume) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(PathNode::new(size, volume));
        id
    }

    /// Returns the node, or `None` for an unknown or merged id.
    pub fn node(&self, id: NodeId) -> Option<&PathNode> {
        self.nodes.get(id.index()).filter(|n| n.alive)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut PathNode> {
        self.nodes.get_mut(id.index()).filter(|n| n.alive)
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PathNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, n)| (NodeId::new(i), n))
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|(id, _)| id).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.alive).count()
    }

    pub fn link_count(&self) -> usize {
        self.nodes().map(|(_, n)| n.links.len()).sum()
    }

    pub fn node_for_poly(&self, poly: PolyRef) -> Option<NodeId> {
        self.poly_to_node.get(&poly).copied()
    }

    /// Adds an unclaimed polygon to a node. Returns false if the poly already
    /// belongs to a node or is blocked.
    pub fn claim_poly(&mut self, node: NodeId, poly: PolyRef) -> bool {
        if self.poly_to_node.contains_key(&poly) || self.blocked.contains(&poly) {
            return false;
        }
        match self.node_mut(node) {
            Some(n) => {
                n.polys.push(poly);
                self.poly_to_node.insert(poly, node);
                true
            }
            None => false,
        }
    }

    pub fn is_blocked(&self, poly: PolyRef) -> bool {
        self.blocked.contains(&poly)
    }

    pub fn mark_blocked(&mut self, poly: PolyRef) {
        self.blocked.insert(poly);
    }

    pub fn blocked_polys(&self) -> impl Iterator<Item = PolyRef> + '_ {
        self.blocked.iter().copied()
    }

    pub fn anchor_poi(&mut self, poi: PoiKey, node: NodeId) {
        if let Some(n) = self.node_mut(node) {
            if !n.pois.contains(&poi) {
                n.pois.push(poi);
            }
            self.poi_to_node.insert(poi, node);
        }
    }

    pub fn node_for_poi(&self, poi: PoiKey) -> Option<NodeId> {
        self.poi_to_node.get(&poi).copied()
    }

    /// Adds a link to its start node. A second walk link between the same
    /// pair of nodes is rejected.
    pub fn add_link(&mut self, link: PathLink) -> bool {
        if link.start == link.end || self.node(link.end).is_none() {
            return false;
        }
        let Some(node) = self.node_mut(link.start) else {
            return false;
        };
        if link.is_walk() && node.walk_link_to(link.end).is_some() {
            return false;
        }
        node.links.push(link);
        true
    }

    /// Moves every poly, link and POI of `absorb` into `keep` and tombstones
    /// `absorb`. Links are retargeted; links that become self-links and
    /// duplicate walk links are dropped.
    pub fn merge_nodes(&mut self, keep: NodeId, absorb: NodeId) -> bool {
        if keep == absorb || self.node(keep).is_none() || self.node(absorb).is_none() {
            return false;
        }

        let absorbed = {
            let node = &mut self.nodes[absorb.index()];
            node.alive = false;
            let mut taken = PathNode::new(node.min_poly_edge_size, node.physics_volume);
            taken.polys = std::mem::take(&mut node.polys);
            taken.links = std::mem::take(&mut node.links);
            taken.pois = std::mem::take(&mut node.pois);
            taken.destination_only = node.destination_only;
            taken
        };

        for poly in &absorbed.polys {
            self.poly_to_node.insert(*poly, keep);
        }
        for poi in &absorbed.pois {
            self.poi_to_node.insert(*poi, keep);
        }

        {
            let target = &mut self.nodes[keep.index()];
            target.polys.extend(absorbed.polys);
            target.pois.extend(absorbed.pois);
            target.destination_only |= absorbed.destination_only;
            target.min_poly_edge_size = target.min_poly_edge_size.min(absorbed.min_poly_edge_size);
            target.links.extend(absorbed.links.into_iter().map(|mut l| {
                l.start = keep;
                l
            }));
        }

        for node in self.nodes.iter_mut().filter(|n| n.alive) {
            for link in node.links.iter_mut() {
                if link.end == absorb {
                    link.end = keep;
                }
                if link.start == absorb {
                    link.start = keep;
                }
            }
            let mut seen_walk = BTreeSet::new();
            node.links.retain(|l| {
                if l.start == l.end {
                    return false;
                }
                !l.is_walk() || seen_walk.insert(l.end)
            });
        }

        true
    }

    /// Snapshot of the graph used for reports and determinism checks.
    pub fn summary(&self) -> GraphSummary {
        let nodes = self
            .nodes()
            .map(|(id, n)| {
                let mut polys: Vec<u32> = n.polys.iter().map(|p| p.id()).collect();
                polys.sort_unstable();
                NodeSummary {
                    id: id.index() as u32,
                    polys,
                    destination_only: n.destination_only,
                    min_radius: n.min_poly_edge_size.radius,
                    min_height: n.min_poly_edge_size.height,
                    volume: n.physics_volume.id,
                    pois: n.pois.len(),
                }
            })
            .collect();

        let mut links: Vec<LinkSummary> = self
            .nodes()
            .flat_map(|(_, n)| n.links.iter())
            .map(|l| LinkSummary {
                start: l.start.index() as u32,
                end: l.end.index() as u32,
                start_edge_poly: l.start_edge_poly.id(),
                end_poly: l.end_poly.id(),
                flags: l.reach_flags.bits(),
                kind: link_kind(l).to_string(),
            })
            .collect();
        links.sort();

        GraphSummary {
            node_count: self.node_count(),
            link_count: self.link_count(),
            blocked_polys: self.blocked.iter().map(|p| p.id()).collect(),
            nodes,
            links,
        }
    }
}

fn link_kind(link: &PathLink) -> &'static str {
    use crate::reach::ReachFlags;
    match &link.spec {
        Some(spec) => spec.kind_name(),
        None if link.reach_flags.contains(ReachFlags::SWIM) => "swim",
        None if link.reach_flags.contains(ReachFlags::JUMP) => "jump",
        None => "walk",
    }
}

/// Serializable snapshot of a node network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub link_count: usize,
    pub blocked_polys: Vec<u32>,
    pub nodes: Vec<NodeSummary>,
    pub links: Vec<LinkSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: u32,
    pub polys: Vec<u32>,
    pub destination_only: bool,
    pub min_radius: i32,
    pub min_height: i32,
    pub volume: u32,
    pub pois: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkSummary {
    pub start: u32,
    pub end: u32,
    pub start_edge_poly: u32,
    pub end_poly: u32,
    pub flags: u8,
    pub kind: String,
}
