//! Route cache items produced by the pathfinder

use glam::Vec3;
use serde::Serialize;

use crate::nav_query::PolyRef;
use crate::path_node::NodeId;
use crate::poi::PoiKey;

/// One step of a computed route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCacheItem {
    /// Node the step ends in, if it is part of the node route
    pub node: Option<NodeId>,
    /// POI the step targets
    #[serde(skip)]
    pub poi: Option<PoiKey>,
    /// Surface location of the step
    pub location: Vec3,
    /// Polygon the location lies in, null for off-mesh targets
    pub target_poly: PolyRef,
    /// The step is reached by straight line movement rather than the mesh
    pub direct_target: bool,
}

impl RouteCacheItem {
    pub fn node(node: NodeId, target_poly: PolyRef, location: Vec3) -> Self {
        Self {
            node: Some(node),
            poi: None,
            location,
            target_poly,
            direct_target: false,
        }
    }

    pub fn poi(poi: PoiKey, node: Option<NodeId>, target_poly: PolyRef, location: Vec3) -> Self {
        Self {
            node,
            poi: Some(poi),
            location,
            target_poly,
            direct_target: false,
        }
    }

    /// Off-mesh location reached in a straight line.
    pub fn direct(location: Vec3) -> Self {
        Self {
            node: None,
            poi: None,
            location,
            target_poly: PolyRef::NULL,
            direct_target: true,
        }
    }

    pub fn with_poi(mut self, poi: Option<PoiKey>) -> Self {
        self.poi = poi;
        self
    }
}
