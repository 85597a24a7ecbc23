//! Specialized traversal strategies attached to path links

use glam::Vec3;

use crate::path_link::BLOCKED_PATH_COST;
use crate::poi::{PoiKey, PoiRegistry};
use crate::reach::ReachParams;

/// Extra semantics for links that are not plain walking, jumping or swimming.
#[derive(Debug, Clone, PartialEq)]
pub enum ReachSpec {
    /// Step onto a jump pad and get launched at its target
    JumpPad { pad: PoiKey, jump_target: Vec3 },
    /// Jump requiring more vertical launch speed than a regular jump
    HighJump {
        required_jump_z: f32,
        gravity: f32,
        jump_start: Vec3,
        jump_end: Vec3,
        /// A dodge jump provides the launch speed
        dodge_jump: bool,
    },
    /// Ride a lift to its exit
    Lift { lift: PoiKey, exit: Vec3 },
    Teleporter { teleporter: PoiKey, exit: Vec3 },
}

impl ReachSpec {
    /// The POI this traversal depends on, if any.
    pub fn poi(&self) -> Option<PoiKey> {
        match self {
            ReachSpec::JumpPad { pad, .. } => Some(*pad),
            ReachSpec::Lift { lift, .. } => Some(*lift),
            ReachSpec::Teleporter { teleporter, .. } => Some(*teleporter),
            ReachSpec::HighJump { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ReachSpec::JumpPad { .. } => "jump_pad",
            ReachSpec::HighJump { .. } => "high_jump",
            ReachSpec::Lift { .. } => "lift",
            ReachSpec::Teleporter { .. } => "teleporter",
        }
    }

    /// Cost of the traversal for `agent`, or [`BLOCKED_PATH_COST`].
    ///
    /// `default_cost` is the precomputed distance cost of the link.
    pub fn cost_for(&self, default_cost: i32, agent: &ReachParams, pois: &PoiRegistry) -> i32 {
        match self {
            ReachSpec::HighJump {
                required_jump_z,
                dodge_jump,
                ..
            } => {
                if !agent.can_jump {
                    return BLOCKED_PATH_COST;
                }
                // Dodge jumps cover more distance, launch speed alone is not enough
                let reachable = if *dodge_jump {
                    agent.can_dodge && *required_jump_z <= agent.dodge_jump_z
                } else {
                    *required_jump_z <= agent.jump_z.max(agent.max_jump_z)
                };
                if reachable {
                    default_cost
                } else {
                    BLOCKED_PATH_COST
                }
            }
            _ => match self.poi() {
                Some(key) if pois.is_usable(key) => default_cost,
                _ => BLOCKED_PATH_COST,
            },
        }
    }

    /// Surface waypoints needed to execute the traversal, in order.
    ///
    /// Returns `None` when the POI the traversal depends on no longer exists.
    pub fn move_points(&self, pois: &PoiRegistry) -> Option<Vec<Vec3>> {
        match self {
            ReachSpec::JumpPad { pad, jump_target } => {
                let pad = pois.get(*pad)?;
                Some(vec![pad.location, *jump_target])
            }
            ReachSpec::HighJump {
                jump_start,
                jump_end,
                ..
            } => Some(vec![*jump_start, *jump_end]),
            ReachSpec::Lift { lift, exit } => {
                let lift = pois.get(*lift)?;
                Some(vec![lift.location, *exit])
            }
            ReachSpec::Teleporter { teleporter, exit } => {
                let teleporter = pois.get(*teleporter)?;
                Some(vec![teleporter.location, *exit])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::{Poi, PoiKind};

    fn high_jump(required_jump_z: f32, dodge_jump: bool) -> ReachSpec {
        ReachSpec::HighJump {
            required_jump_z,
            gravity: -980.0,
            jump_start: Vec3::ZERO,
            jump_end: Vec3::new(100.0, 200.0, 0.0),
            dodge_jump,
        }
    }

    #[test]
    fn test_disabled_jump_pad_blocks() {
        let mut pois = PoiRegistry::new();
        let target = Vec3::new(500.0, 0.0, 0.0);
        let pad = pois.insert(Poi::new(
            "pad",
            Vec3::ZERO,
            50.0,
            20.0,
            PoiKind::JumpPad { jump_target: target },
        ));
        let spec = ReachSpec::JumpPad {
            pad,
            jump_target: target,
        };
        let agent = ReachParams::default();

        assert_eq!(spec.cost_for(700, &agent, &pois), 700);
        pois.set_enabled(pad, false);
        assert_eq!(spec.cost_for(700, &agent, &pois), BLOCKED_PATH_COST);
        pois.remove(pad);
        assert_eq!(spec.cost_for(700, &agent, &pois), BLOCKED_PATH_COST);
        assert!(spec.move_points(&pois).is_none());
    }

    #[test]
    fn test_high_jump_needs_launch_speed() {
        let pois = PoiRegistry::new();
        let agent = ReachParams {
            jump_z: 420.0,
            max_jump_z: 700.0,
            ..Default::default()
        };
        assert_eq!(high_jump(650.0, false).cost_for(300, &agent, &pois), 300);
        assert_eq!(
            high_jump(800.0, false).cost_for(300, &agent, &pois),
            BLOCKED_PATH_COST
        );

        let dodger = ReachParams {
            can_dodge: true,
            dodge_jump_z: 900.0,
            ..agent
        };
        assert_eq!(high_jump(800.0, true).cost_for(300, &dodger, &pois), 300);
        assert_eq!(
            high_jump(800.0, false).cost_for(300, &dodger, &pois),
            BLOCKED_PATH_COST
        );

        // A low dodge jump still needs the dodge
        assert_eq!(
            high_jump(300.0, true).cost_for(300, &agent, &pois),
            BLOCKED_PATH_COST
        );
        assert_eq!(high_jump(300.0, true).cost_for(300, &dodger, &pois), 300);
    }

    #[test]
    fn test_jump_pad_move_points_step_on_trigger_first() {
        let mut pois = PoiRegistry::new();
        let target = Vec3::new(500.0, 0.0, 0.0);
        let location = Vec3::new(10.0, 0.0, 10.0);
        let pad = pois.insert(Poi::new(
            "pad",
            location,
            50.0,
            20.0,
            PoiKind::JumpPad { jump_target: target },
        ));
        let spec = ReachSpec::JumpPad {
            pad,
            jump_target: target,
        };
        assert_eq!(spec.move_points(&pois), Some(vec![location, target]));
    }
}
