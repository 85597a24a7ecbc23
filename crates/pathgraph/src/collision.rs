//! Collision world seam
//!
//! Capsule overlaps and sweeps are used to measure walkable sizes, detect
//! polygons buried inside solid geometry and simulate jump arcs.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Default gravity acceleration along Y.
pub const DEFAULT_GRAVITY: f32 = -980.0;

/// Gravity and liquid properties of a region of the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsVolume {
    /// Identifier used to compare volume membership. Zero is the default volume.
    pub id: u32,
    pub gravity: f32,
    pub water: bool,
    /// Flow velocity of a water volume
    pub current: Vec3,
    /// Entering the volume kills the agent
    pub kill: bool,
}

impl Default for PhysicsVolume {
    fn default() -> Self {
        Self {
            id: 0,
            gravity: DEFAULT_GRAVITY,
            water: false,
            current: Vec3::ZERO,
            kill: false,
        }
    }
}

impl PhysicsVolume {
    pub fn has_current(&self) -> bool {
        self.water && self.current.length_squared() > 0.0
    }
}

/// Blocking hit reported by a capsule sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction of the sweep travelled before the hit
    pub time: f32,
    /// Capsule center at the time of the hit
    pub location: Vec3,
    pub normal: Vec3,
}

/// Physics queries against the static world.
///
/// Capsules are vertical; `center` is the capsule center and `half_height`
/// includes the hemispherical caps.
pub trait CollisionWorld {
    fn overlap_capsule(&self, center: Vec3, radius: f32, half_height: f32) -> bool;

    fn sweep_capsule(&self, start: Vec3, end: Vec3, radius: f32, half_height: f32)
        -> Option<SweepHit>;

    fn physics_volume(&self, point: Vec3) -> PhysicsVolume;

    fn line_of_sight(&self, start: Vec3, end: Vec3) -> bool {
        self.sweep_capsule(start, end, 0.0, 0.0).is_none()
    }
}
