//! Capsule size classification
//!
//! Poly edge sizes and agent sizes are quantized to a small set of standard
//! tiers so that adjacent polygons with nearly identical clearance end up in
//! the same path node.

use serde::{Deserialize, Serialize};

/// Integer capsule footprint. `height` is the capsule half-height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapsuleSize {
    pub radius: i32,
    pub height: i32,
}

impl CapsuleSize {
    pub const fn new(radius: i32, height: i32) -> Self {
        Self { radius, height }
    }

    /// Truncates a floating point extent to whole units.
    pub fn from_extent(radius: f32, height: f32) -> Self {
        Self {
            radius: radius.max(0.0) as i32,
            height: height.max(0.0) as i32,
        }
    }

    /// Returns true if a capsule of `other` size fits inside this one.
    pub fn contains(&self, other: CapsuleSize) -> bool {
        self.radius >= other.radius && self.height >= other.height
    }

    /// Per-axis minimum of two sizes.
    pub fn min(self, other: CapsuleSize) -> CapsuleSize {
        CapsuleSize {
            radius: self.radius.min(other.radius),
            height: self.height.min(other.height),
        }
    }
}

/// Ordered list of standard sizes used to step actual sizes down.
///
/// Radii and heights are kept as independent sorted axes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeSteps {
    radii: Vec<i32>,
    heights: Vec<i32>,
}

impl SizeSteps {
    /// Creates the step table from the configured sizes plus the size of the
    /// agent the network is generated for.
    pub fn new(sizes: &[CapsuleSize], agent: CapsuleSize) -> Self {
        let mut radii: Vec<i32> = sizes.iter().map(|s| s.radius).collect();
        let mut heights: Vec<i32> = sizes.iter().map(|s| s.height).collect();
        radii.push(agent.radius);
        heights.push(agent.height);
        radii.sort_unstable();
        radii.dedup();
        heights.sort_unstable();
        heights.dedup();
        Self { radii, heights }
    }

    /// Registered radii in ascending order.
    pub fn radii(&self) -> &[i32] {
        &self.radii
    }

    /// Registered half-heights in ascending order.
    pub fn heights(&self) -> &[i32] {
        &self.heights
    }

    /// Smallest registered size on both axes.
    pub fn smallest(&self) -> CapsuleSize {
        CapsuleSize {
            radius: self.radii.first().copied().unwrap_or(0),
            height: self.heights.first().copied().unwrap_or(0),
        }
    }

    /// Largest registered size on both axes.
    pub fn largest(&self) -> CapsuleSize {
        CapsuleSize {
            radius: self.radii.last().copied().unwrap_or(0),
            height: self.heights.last().copied().unwrap_or(0),
        }
    }

    /// Steps an actual size down to the largest registered value on each axis.
    ///
    /// An axis with no registered value small enough falls back to the
    /// smallest registered value.
    pub fn step(&self, actual: CapsuleSize) -> CapsuleSize {
        CapsuleSize {
            radius: step_axis(&self.radii, actual.radius),
            height: step_axis(&self.heights, actual.height),
        }
    }
}

fn step_axis(values: &[i32], actual: i32) -> i32 {
    match values.iter().rev().find(|v| **v <= actual) {
        Some(v) => *v,
        None => values.first().copied().unwrap_or(actual),
    }
}
