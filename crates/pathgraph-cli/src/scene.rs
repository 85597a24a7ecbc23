//! JSON scene files
//!
//! A scene holds everything a path network is built from: the polygons of a
//! navigation mesh, off-mesh connections, the collision boxes and physics
//! volumes of the level, points of interest and the network configuration.

use std::fs;
use std::path::Path;

use glam::Vec3;
use pathgraph::{
    BoxWorld, NavContext, NavGraphConfig, OffMeshLink, Poi, PoiRegistry, SimplePolyMesh,
    SolidBox, VolumeRegion,
};
use pathgraph_common::Result;
use serde::{Deserialize, Serialize};

/// On-disk description of a scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    /// Convex polygons, one vertex list each. Poly references are assigned
    /// in order starting at 1.
    pub polys: Vec<Vec<Vec3>>,
    #[serde(default)]
    pub off_mesh_links: Vec<OffMeshLink>,
    #[serde(default)]
    pub solids: Vec<SolidBox>,
    #[serde(default)]
    pub volumes: Vec<VolumeRegion>,
    #[serde(default)]
    pub pois: Vec<Poi>,
    #[serde(default)]
    pub config: NavGraphConfig,
}

impl SceneFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// A scene ready to be queried.
pub struct Scene {
    pub mesh: SimplePolyMesh,
    pub world: BoxWorld,
    pub pois: PoiRegistry,
    pub config: NavGraphConfig,
}

impl Scene {
    pub fn new(file: SceneFile) -> Result<Self> {
        file.config.validate()?;
        let mesh = SimplePolyMesh::new(file.polys, &file.off_mesh_links)?;

        let mut world = BoxWorld::new();
        for solid in &file.solids {
            world.add_solid(solid.min, solid.max);
        }
        for region in file.volumes {
            world.add_volume(region.min, region.max, region.volume);
        }

        let mut pois = PoiRegistry::new();
        for poi in file.pois {
            if pois.find(&poi.name).is_some() {
                log::warn!("duplicate point of interest name {:?}", poi.name);
            }
            pois.insert(poi);
        }

        log::debug!(
            "scene loaded: {} polys, {} solids, {} pois",
            mesh.poly_count(),
            world.solids().len(),
            pois.len()
        );

        Ok(Self {
            mesh,
            world,
            pois,
            config: file.config,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::new(SceneFile::load(path)?)
    }

    pub fn ctx(&self) -> NavContext<'_> {
        NavContext::new(&self.mesh, &self.world, &self.pois)
    }
}
