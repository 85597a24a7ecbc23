//! Math utilities

/// Rounds a distance to the integer cost units used by path links.
///
/// Costs are never allowed to reach zero so an edge always makes progress
/// in the search ordering.
#[inline]
pub fn distance_to_cost(distance: f32) -> i32 {
    (distance.round() as i32).max(1)
}
