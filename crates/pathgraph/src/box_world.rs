//! A collision world made of axis-aligned boxes
//!
//! Solids block capsules; volume regions assign gravity, water and kill
//! properties to the space they enclose.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionWorld, PhysicsVolume, SweepHit};

/// Refinement steps of the sampled capsule sweep
const SWEEP_REFINE_STEPS: usize = 8;

/// An axis-aligned solid box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl SolidBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Squared distance between a vertical capsule's core segment and the box.
    fn capsule_distance_sq(&self, center: Vec3, radius: f32, half_height: f32) -> f32 {
        let segment_half = (half_height - radius).max(0.0);
        let low = center.y - segment_half;
        let high = center.y + segment_half;

        let dx = (self.min.x - center.x).max(center.x - self.max.x).max(0.0);
        let dz = (self.min.z - center.z).max(center.z - self.max.z).max(0.0);
        let dy = if high < self.min.y {
            self.min.y - high
        } else if low > self.max.y {
            low - self.max.y
        } else {
            0.0
        };
        dx * dx + dy * dy + dz * dz
    }

    fn contains_strictly(&self, p: Vec3) -> bool {
        p.x > self.min.x
            && p.x < self.max.x
            && p.y > self.min.y
            && p.y < self.max.y
            && p.z > self.min.z
            && p.z < self.max.z
    }

    fn overlaps_capsule(&self, center: Vec3, radius: f32, half_height: f32) -> bool {
        if radius > 0.0 {
            self.capsule_distance_sq(center, radius, half_height) < radius * radius
        } else {
            self.contains_strictly(center)
        }
    }

    /// Slab test of a segment against the box interior.
    fn blocks_segment(&self, start: Vec3, end: Vec3) -> bool {
        let dir = end - start;
        let mut tmin = 0.0f32;
        let mut tmax = 1.0f32;
        for axis in 0..3 {
            let (s, d, lo, hi) = (start[axis], dir[axis], self.min[axis], self.max[axis]);
            if d.abs() < f32::EPSILON {
                if s <= lo || s >= hi {
                    return false;
                }
                continue;
            }
            let t1 = (lo - s) / d;
            let t2 = (hi - s) / d;
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
            if tmax - tmin <= 1e-6 {
                return false;
            }
        }
        true
    }

    fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }
}

/// A region of space with its own physics properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRegion {
    pub min: Vec3,
    pub max: Vec3,
    pub volume: PhysicsVolume,
}

impl VolumeRegion {
    fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Static collision world of boxes.
#[derive(Debug, Clone, Default)]
pub struct BoxWorld {
    solids: Vec<SolidBox>,
    volumes: Vec<VolumeRegion>,
    default_volume: PhysicsVolume,
}

impl BoxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solid(mut self, min: Vec3, max: Vec3) -> Self {
        self.add_solid(min, max);
        self
    }

    pub fn with_volume(mut self, min: Vec3, max: Vec3, volume: PhysicsVolume) -> Self {
        self.add_volume(min, max, volume);
        self
    }

    pub fn add_solid(&mut self, min: Vec3, max: Vec3) {
        self.solids.push(SolidBox::new(min, max));
    }

    /// Adds a volume region. Later regions win where regions overlap.
    pub fn add_volume(&mut self, min: Vec3, max: Vec3, volume: PhysicsVolume) {
        self.volumes.push(VolumeRegion {
            min: min.min(max),
            max: min.max(max),
            volume,
        });
    }

    pub fn set_default_volume(&mut self, volume: PhysicsVolume) {
        self.default_volume = volume;
    }

    pub fn solids(&self) -> &[SolidBox] {
        &self.solids
    }
}

impl CollisionWorld for BoxWorld {
    fn overlap_capsule(&self, center: Vec3, radius: f32, half_height: f32) -> bool {
        self.solids
            .iter()
            .any(|s| s.overlaps_capsule(center, radius, half_height))
    }

    fn sweep_capsule(
        &self,
        start: Vec3,
        end: Vec3,
        radius: f32,
        half_height: f32,
    ) -> Option<SweepHit> {
        if self.overlap_capsule(start, radius, half_height) {
            return Some(SweepHit {
                time: 0.0,
                location: start,
                normal: Vec3::ZERO,
            });
        }

        let length = start.distance(end);
        let step = (radius * 0.5).max(4.0);
        let steps = ((length / step).ceil() as usize).clamp(1, 512);

        let mut safe = 0.0f32;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            if !self.overlap_capsule(start.lerp(end, t), radius, half_height) {
                safe = t;
                continue;
            }

            // Narrow down the first blocking time
            let mut blocked = t;
            for _ in 0..SWEEP_REFINE_STEPS {
                let mid = (safe + blocked) * 0.5;
                if self.overlap_capsule(start.lerp(end, mid), radius, half_height) {
                    blocked = mid;
                } else {
                    safe = mid;
                }
            }

            let location = start.lerp(end, safe);
            let hit_point = start.lerp(end, blocked);
            let normal = self
                .solids
                .iter()
                .filter(|s| s.overlaps_capsule(hit_point, radius, half_height))
                .map(|s| (location - s.closest_point(location)).normalize_or_zero())
                .find(|n| *n != Vec3::ZERO)
                .unwrap_or_else(|| (start - end).normalize_or_zero());
            return Some(SweepHit {
                time: safe,
                location,
                normal,
            });
        }
        None
    }

    fn physics_volume(&self, point: Vec3) -> PhysicsVolume {
        self.volumes
            .iter()
            .rev()
            .find(|v| v.contains(point))
            .map(|v| v.volume)
            .unwrap_or(self.default_volume)
    }

    fn line_of_sight(&self, start: Vec3, end: Vec3) -> bool {
        !self.solids.iter().any(|s| s.blocks_segment(start, end))
    }
}
