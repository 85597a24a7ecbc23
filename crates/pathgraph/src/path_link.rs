//! Directed links between path nodes

use crate::nav_query::PolyRef;
use crate::path_node::NodeId;
use crate::poi::PoiRegistry;
use crate::reach::{ReachFlags, ReachParams};
use crate::reach_spec::ReachSpec;
use crate::size::CapsuleSize;

/// Cost returned for a traversal that is currently impossible.
pub const BLOCKED_PATH_COST: i32 = 10_000_000;

/// A directed edge `start -> end` between two path nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLink {
    pub start: NodeId,
    pub end: NodeId,
    /// Polygon of `start` the traversal leaves from
    pub start_edge_poly: PolyRef,
    /// Canonical polygon of `end` the traversal arrives at
    pub end_poly: PolyRef,
    /// Other polygons of `end` the same traversal can land in
    pub additional_end_polys: Vec<PolyRef>,
    pub collision_radius: i32,
    pub collision_height: i32,
    pub reach_flags: ReachFlags,
    /// Cost from each polygon of `start` (same order as its poly list) to
    /// the end point of this link
    pub distances: Vec<i32>,
    pub spec: Option<ReachSpec>,
}

impl PathLink {
    pub fn new(
        start: NodeId,
        end: NodeId,
        start_edge_poly: PolyRef,
        end_poly: PolyRef,
        size: CapsuleSize,
        reach_flags: ReachFlags,
    ) -> Self {
        Self {
            start,
            end,
            start_edge_poly,
            end_poly,
            additional_end_polys: Vec::new(),
            collision_radius: size.radius,
            collision_height: size.height,
            reach_flags,
            distances: Vec::new(),
            spec: None,
        }
    }

    pub fn with_spec(mut self, spec: ReachSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn with_additional_end_polys(mut self, polys: Vec<PolyRef>) -> Self {
        self.additional_end_polys = polys;
        self
    }

    /// Plain walking link with no special requirements.
    pub fn is_walk(&self) -> bool {
        self.reach_flags.is_empty() && self.spec.is_none()
    }

    pub fn size(&self) -> CapsuleSize {
        CapsuleSize::new(self.collision_radius, self.collision_height)
    }

    /// Canonical end polygon followed by the additional ones.
    pub fn end_polys(&self) -> impl Iterator<Item = PolyRef> + '_ {
        std::iter::once(self.end_poly).chain(self.additional_end_polys.iter().copied())
    }

    /// Returns true if the agent has the size and capabilities this link needs.
    pub fn supports(&self, agent: &ReachParams) -> bool {
        agent.flags().contains(self.reach_flags) && self.size().contains(agent.capsule())
    }

    /// Cost of using the link when entering `start` through the polygon at
    /// `start_poly_index`.
    pub fn cost_for(&self, agent: &ReachParams, start_poly_index: usize, pois: &PoiRegistry) -> i32 {
        let default_cost = match self.distances.get(start_poly_index) {
            Some(cost) => *cost,
            None => match self.distances.iter().min() {
                Some(cost) => *cost,
                None => return BLOCKED_PATH_COST,
            },
        };

        match &self.spec {
            Some(spec) => spec.cost_for(default_cost, agent, pois),
            None => default_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(flags: ReachFlags) -> PathLink {
        PathLink::new(
            NodeId::new(0),
            NodeId::new(1),
            PolyRef::new(1),
            PolyRef::new(2),
            CapsuleSize::new(40, 90),
            flags,
        )
    }

    #[test]
    fn test_supports_checks_size_and_flags() {
        let agent = ReachParams::default();
        assert!(link(ReachFlags::empty()).supports(&agent));
        assert!(link(ReachFlags::JUMP).supports(&agent));

        let big = ReachParams {
            radius: 60.0,
            ..agent
        };
        assert!(!link(ReachFlags::empty()).supports(&big));

        let landlubber = ReachParams {
            can_swim: false,
            ..agent
        };
        assert!(!link(ReachFlags::SWIM).supports(&landlubber));
    }

    #[test]
    fn test_cost_uses_entry_poly_distance() {
        let pois = PoiRegistry::new();
        let agent = ReachParams::default();
        let mut l = link(ReachFlags::empty());
        assert_eq!(l.cost_for(&agent, 0, &pois), BLOCKED_PATH_COST);

        l.distances = vec![300, 120];
        assert_eq!(l.cost_for(&agent, 1, &pois), 120);
        assert_eq!(l.cost_for(&agent, 0, &pois), 300);
        // Unknown entry poly uses the cheapest distance
        assert_eq!(l.cost_for(&agent, 7, &pois), 120);
    }
}
