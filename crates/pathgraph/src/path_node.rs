//! Path nodes: groups of polygons with uniform traversal capability

use serde::{Deserialize, Serialize};

use crate::collision::PhysicsVolume;
use crate::nav_query::PolyRef;
use crate::path_link::PathLink;
use crate::poi::PoiKey;
use crate::size::CapsuleSize;

/// Stable index of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A set of polygons searched as one unit by the pathfinder.
#[derive(Debug, Clone)]
pub struct PathNode {
    pub polys: Vec<PolyRef>,
    /// Smallest stepped size that fits across every internal poly boundary
    pub min_poly_edge_size: CapsuleSize,
    pub physics_volume: PhysicsVolume,
    pub links: Vec<PathLink>,
    pub pois: Vec<PoiKey>,
    /// Node only hosts a POI footprint and never grows by expansion
    pub destination_only: bool,
    pub(crate) alive: bool,
}

impl PathNode {
    pub fn new(min_poly_edge_size: CapsuleSize, physics_volume: PhysicsVolume) -> Self {
        Self {
            polys: Vec::new(),
            min_poly_edge_size,
            physics_volume,
            links: Vec::new(),
            pois: Vec::new(),
            destination_only: false,
            alive: true,
        }
    }

    /// False once the node has been merged into another one.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Position of `poly` in the node's poly list, the index used by
    /// [`PathLink::distances`].
    pub fn poly_index(&self, poly: PolyRef) -> Option<usize> {
        self.polys.iter().position(|p| *p == poly)
    }

    pub fn contains_poly(&self, poly: PolyRef) -> bool {
        self.polys.contains(&poly)
    }

    pub fn has_link_to(&self, end: NodeId) -> bool {
        self.links.iter().any(|l| l.end == end)
    }

    pub fn walk_link_to(&self, end: NodeId) -> Option<&PathLink> {
        self.links.iter().find(|l| l.end == end && l.is_walk())
    }

    pub fn links_to(&self, end: NodeId) -> impl Iterator<Item = &PathLink> + '_ {
        self.links.iter().filter(move |l| l.end == end)
    }
}
