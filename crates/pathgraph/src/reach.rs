//! Movement capabilities of the querying agent

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::size::CapsuleSize;

bitflags! {
    /// Movement capabilities a link requires. Empty means plain walking.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ReachFlags: u8 {
        const JUMP = 1 << 0;
        const SWIM = 1 << 1;
    }
}

/// Size and movement capabilities of an agent asking for a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachParams {
    pub radius: f32,
    /// Capsule half-height
    pub height: f32,
    pub crouched_height: f32,
    pub can_jump: bool,
    pub can_swim: bool,
    pub can_crouch: bool,
    pub can_dodge: bool,
    /// Vertical launch speed of a regular jump
    pub jump_z: f32,
    /// Highest vertical launch speed the agent can reach with assistance
    pub max_jump_z: f32,
    /// Vertical launch speed of a dodge jump
    pub dodge_jump_z: f32,
    pub move_speed: f32,
}

impl Default for ReachParams {
    fn default() -> Self {
        Self {
            radius: 40.0,
            height: 90.0,
            crouched_height: 60.0,
            can_jump: true,
            can_swim: true,
            can_crouch: true,
            can_dodge: false,
            jump_z: 420.0,
            max_jump_z: 420.0,
            dodge_jump_z: 420.0,
            move_speed: 600.0,
        }
    }
}

impl ReachParams {
    /// Capability flags the agent provides.
    pub fn flags(&self) -> ReachFlags {
        let mut flags = ReachFlags::empty();
        if self.can_jump {
            flags |= ReachFlags::JUMP;
        }
        if self.can_swim {
            flags |= ReachFlags::SWIM;
        }
        flags
    }

    /// Capsule size used when checking link clearance. Crouching agents are
    /// checked against their crouched height.
    pub fn capsule(&self) -> CapsuleSize {
        let height = if self.can_crouch {
            self.crouched_height.min(self.height)
        } else {
            self.height
        };
        CapsuleSize::from_extent(self.radius, height)
    }
}
