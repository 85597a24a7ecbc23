//! Configuration for building and querying the path network

use glam::Vec3;
use pathgraph_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::reach::ReachParams;
use crate::size::{CapsuleSize, SizeSteps};

/// Tuning of the jump link discovery passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Maximum 2D distance between a wall and a jump candidate polygon
    pub scan_distance: f32,
    /// Minimum cosine between the wall normal and the direction to a candidate
    pub wall_facing_cos: f32,
    /// Simulation step of the ballistic test, in seconds
    pub time_step: f32,
    /// Longest simulated flight, in seconds
    pub max_flight_time: f32,
    /// Increment used when searching the minimum launch speed
    pub jump_z_step: f32,
    /// Highest launch speed probed for regular and high jumps
    pub max_jump_z: f32,
    /// Launch speed probed for dodge assisted jumps
    pub dodge_jump_z: f32,
    /// Horizontal speed of a dodge jump
    pub dodge_speed: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            scan_distance: 1500.0,
            wall_facing_cos: 0.64,
            time_step: 1.0 / 30.0,
            max_flight_time: 3.0,
            jump_z_step: 25.0,
            max_jump_z: 1000.0,
            dodge_jump_z: 1000.0,
            dodge_speed: 900.0,
        }
    }
}

/// Tuning of opportunistic pickup detours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetourConfig {
    /// Seconds of extra travel an agent accepts for a detour straight ahead
    pub max_detour_time: f32,
    /// Smallest cosine between the travel direction and a pickup
    pub min_direction_cos: f32,
    /// Detours scoring below this weight are ignored
    pub min_weight: f32,
}

impl Default for DetourConfig {
    fn default() -> Self {
        Self {
            max_detour_time: 1.5,
            min_direction_cos: 0.0,
            min_weight: 0.0,
        }
    }
}

/// Configuration of a path network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavGraphConfig {
    /// Agent the network is generated for. Its size is always a size step
    pub agent: ReachParams,
    /// Standard capsule sizes poly edges are stepped to
    pub size_steps: Vec<CapsuleSize>,
    /// Height above the surface at which capsules are overlap tested
    pub surface_offset: f32,
    /// Scale applied to destination-only POI footprints
    pub destination_shrink: f32,
    /// Water links against the current are dropped when the cosine between
    /// link direction and current is below the negated threshold
    pub current_block_threshold: f32,
    /// Nodes handled per tick by the jump passes of a background build
    pub nodes_per_tick: usize,
    /// Half-size of the box used to anchor a query start point
    pub query_extent: Vec3,
    /// Multiplier applied to `query_extent` for the second anchor attempt
    pub expanded_extent_scale: f32,
    /// Radius of the radial samples used as the last anchor attempt. The
    /// samples must reach past the expanded extent box
    pub anchor_sample_radius: f32,
    pub anchor_sample_count: usize,
    pub jump: JumpConfig,
    pub detour: DetourConfig,
}

impl Default for NavGraphConfig {
    fn default() -> Self {
        Self {
            agent: ReachParams::default(),
            size_steps: vec![
                CapsuleSize::new(40, 90),
                CapsuleSize::new(80, 90),
                CapsuleSize::new(80, 150),
            ],
            surface_offset: 2.0,
            destination_shrink: 0.9,
            current_block_threshold: 0.1,
            nodes_per_tick: 10,
            query_extent: Vec3::new(100.0, 150.0, 100.0),
            expanded_extent_scale: 4.0,
            anchor_sample_radius: 600.0,
            anchor_sample_count: 8,
            jump: JumpConfig::default(),
            detour: DetourConfig::default(),
        }
    }
}

impl NavGraphConfig {
    pub fn with_agent(mut self, agent: ReachParams) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_size_steps(mut self, size_steps: Vec<CapsuleSize>) -> Self {
        self.size_steps = size_steps;
        self
    }

    pub fn with_nodes_per_tick(mut self, nodes_per_tick: usize) -> Self {
        self.nodes_per_tick = nodes_per_tick;
        self
    }

    pub fn with_jump(mut self, jump: JumpConfig) -> Self {
        self.jump = jump;
        self
    }

    pub fn with_detour(mut self, detour: DetourConfig) -> Self {
        self.detour = detour;
        self
    }

    /// Step table for this configuration, including the generation agent.
    pub fn steps(&self) -> SizeSteps {
        SizeSteps::new(
            &self.size_steps,
            CapsuleSize::from_extent(self.agent.radius, self.agent.height),
        )
    }

    /// Validates the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.agent.radius <= 0.0 || self.agent.height <= 0.0 {
            return Err(Error::InvalidConfig(
                "agent radius and height must be positive".to_string(),
            ));
        }
        if self
            .size_steps
            .iter()
            .any(|s| s.radius <= 0 || s.height <= 0)
        {
            return Err(Error::InvalidConfig(
                "size steps must have positive radius and height".to_string(),
            ));
        }
        if self.nodes_per_tick == 0 {
            return Err(Error::InvalidConfig(
                "nodes_per_tick must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.destination_shrink) {
            return Err(Error::InvalidConfig(
                "destination_shrink must be within [0, 1]".to_string(),
            ));
        }
        if self.jump.time_step <= 0.0 || self.jump.jump_z_step <= 0.0 {
            return Err(Error::InvalidConfig(
                "jump time step and launch speed step must be positive".to_string(),
            ));
        }
        if self.jump.max_jump_z < self.agent.jump_z {
            return Err(Error::InvalidConfig(
                "jump.max_jump_z must not be below the agent jump_z".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.jump.wall_facing_cos) {
            return Err(Error::InvalidConfig(
                "jump.wall_facing_cos must be a cosine".to_string(),
            ));
        }
        if self.query_extent.min_element() <= 0.0 || self.expanded_extent_scale < 1.0 {
            return Err(Error::InvalidConfig(
                "query extent must be positive and only grow when expanded".to_string(),
            ));
        }
        let horizontal = self.query_extent.x.max(self.query_extent.z);
        if self.anchor_sample_radius + horizontal <= horizontal * self.expanded_extent_scale {
            return Err(Error::InvalidConfig(
                "anchor samples must reach beyond the expanded query extent".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(NavGraphConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_nodes_per_tick() {
        let config = NavGraphConfig::default().with_nodes_per_tick(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_anchor_samples_inside_expanded_extent() {
        let mut config = NavGraphConfig::default();
        config.anchor_sample_radius = 200.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.anchor_sample_radius = 300.0;
        assert!(config.validate().is_err());

        config.anchor_sample_radius = 301.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_steps_include_agent() {
        let config = NavGraphConfig::default().with_agent(ReachParams {
            radius: 34.0,
            height: 88.0,
            ..Default::default()
        });
        let steps = config.steps();
        assert_eq!(steps.radii(), &[34, 40, 80]);
        assert_eq!(steps.heights(), &[88, 90, 150]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NavGraphConfig =
            serde_json::from_str(r#"{"nodes_per_tick": 3, "jump": {"scan_distance": 800.0}}"#)
                .unwrap();
        assert_eq!(config.nodes_per_tick, 3);
        assert_eq!(config.jump.scan_distance, 800.0);
        assert_eq!(config.jump.wall_facing_cos, 0.64);
        assert_eq!(config.size_steps.len(), 3);
    }
}
