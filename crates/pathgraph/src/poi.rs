//! Points of interest
//!
//! POIs are world objects the graph must route to or through: pickups, jump
//! pads, teleporters, lifts. They live in a [`PoiRegistry`] and are referenced
//! everywhere else by [`PoiKey`]. Removing a POI invalidates its key, and
//! every lookup goes through the registry so dead handles are detected.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a registered point of interest.
    pub struct PoiKey;
}

/// Identifies the agent issuing a path query.
pub type RequesterId = u32;

/// Behaviour specific to a kind of point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PoiKind {
    Generic,
    /// Collectable item agents may detour for
    Pickup { desirability: f32 },
    /// Launches agents towards `jump_target`
    JumpPad { jump_target: Vec3 },
    Teleporter { exit: Vec3 },
    Lift { exit: Vec3 },
}

/// A registered point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    pub location: Vec3,
    /// Radius of the POI footprint
    pub radius: f32,
    /// Half-height of the POI footprint
    pub height: f32,
    /// The POI owns a dedicated node covering its whole footprint
    #[serde(default)]
    pub destination_only: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub kind: PoiKind,
}

fn default_enabled() -> bool {
    true
}

impl Poi {
    pub fn new(name: impl Into<String>, location: Vec3, radius: f32, height: f32, kind: PoiKind) -> Self {
        Self {
            name: name.into(),
            location,
            radius,
            height,
            destination_only: false,
            enabled: true,
            kind,
        }
    }

    pub fn with_destination_only(mut self, destination_only: bool) -> Self {
        self.destination_only = destination_only;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Half-size of the box used to look up polygons under the POI.
    pub fn query_extent(&self) -> Vec3 {
        Vec3::new(self.radius, self.height, self.radius)
    }

    /// Pickup desirability, `None` for POIs that are not pickups.
    pub fn desirability(&self) -> Option<f32> {
        match self.kind {
            PoiKind::Pickup { desirability } => Some(desirability),
            _ => None,
        }
    }
}

/// Arena of the points of interest known to the path network.
#[derive(Debug, Default, Clone)]
pub struct PoiRegistry {
    pois: SlotMap<PoiKey, Poi>,
}

impl PoiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, poi: Poi) -> PoiKey {
        self.pois.insert(poi)
    }

    pub fn remove(&mut self, key: PoiKey) -> Option<Poi> {
        self.pois.remove(key)
    }

    pub fn get(&self, key: PoiKey) -> Option<&Poi> {
        self.pois.get(key)
    }

    pub fn get_mut(&mut self, key: PoiKey) -> Option<&mut Poi> {
        self.pois.get_mut(key)
    }

    pub fn contains(&self, key: PoiKey) -> bool {
        self.pois.contains_key(key)
    }

    /// Enables or disables a POI. Returns false for a dead key.
    pub fn set_enabled(&mut self, key: PoiKey, enabled: bool) -> bool {
        match self.pois.get_mut(key) {
            Some(poi) => {
                poi.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns true if the key is alive and the POI is enabled.
    pub fn is_usable(&self, key: PoiKey) -> bool {
        self.pois.get(key).is_some_and(|poi| poi.enabled)
    }

    /// Finds a POI by name.
    pub fn find(&self, name: &str) -> Option<PoiKey> {
        self.pois
            .iter()
            .find(|(_, poi)| poi.name == name)
            .map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoiKey, &Poi)> {
        self.pois.iter()
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reservation {
    requester: RequesterId,
    team: Option<u8>,
}

/// Pickup claims used to keep teammates from converging on the same item.
#[derive(Debug, Default, Clone)]
pub struct PickupReservations {
    claims: HashMap<PoiKey, Reservation>,
}

impl PickupReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a pickup, replacing any previous claim on it.
    pub fn reserve(&mut self, poi: PoiKey, requester: RequesterId, team: Option<u8>) {
        self.claims.insert(poi, Reservation { requester, team });
    }

    pub fn release(&mut self, poi: PoiKey) {
        self.claims.remove(&poi);
    }

    /// Drops every claim held by `requester`.
    pub fn release_all(&mut self, requester: RequesterId) {
        self.claims.retain(|_, r| r.requester != requester);
    }

    /// True when a teammate other than `requester` has claimed the pickup.
    pub fn is_reserved_against(&self, poi: PoiKey, requester: RequesterId, team: Option<u8>) -> bool {
        match self.claims.get(&poi) {
            Some(claim) => claim.requester != requester && team.is_some() && claim.team == team,
            None => false,
        }
    }
}
