//! Small hand made scenes shared by the unit and scenario tests
//!
//! All floors are axis aligned rectangles in the XZ plane. Unless stated
//! otherwise a scene is 1000 units deep on z and sits on a solid floor box
//! whose top is at y = 0.

use glam::Vec3;

use crate::box_world::BoxWorld;
use crate::builder::{NavContext, NetworkBuilder};
use crate::collision::PhysicsVolume;
use crate::config::NavGraphConfig;
use crate::graph::NavGraph;
use crate::poi::{Poi, PoiKind, PoiRegistry};
use crate::simple_mesh::{OffMeshLink, SimplePolyMesh};

/// Mesh, world and POIs of one test scene.
pub struct Scene {
    pub mesh: SimplePolyMesh,
    pub world: BoxWorld,
    pub pois: PoiRegistry,
    pub config: NavGraphConfig,
}

impl Scene {
    fn new(polys: Vec<Vec<Vec3>>, off_mesh_links: &[OffMeshLink], world: BoxWorld) -> Self {
        Self {
            mesh: SimplePolyMesh::new(polys, off_mesh_links).unwrap(),
            world,
            pois: PoiRegistry::new(),
            config: NavGraphConfig::default(),
        }
    }

    pub fn ctx(&self) -> NavContext<'_> {
        NavContext::new(&self.mesh, &self.world, &self.pois)
    }
}

/// Builds the scene's graph to completion.
pub fn build_graph(scene: &Scene) -> NavGraph {
    let mut graph = NavGraph::default();
    NetworkBuilder::new(scene.config.clone()).build(&mut graph, &scene.ctx());
    graph
}

/// Counter-clockwise rectangle at height `y`.
pub fn rect(x0: f32, z0: f32, x1: f32, z1: f32, y: f32) -> Vec<Vec3> {
    vec![
        Vec3::new(x0, y, z0),
        Vec3::new(x1, y, z0),
        Vec3::new(x1, y, z1),
        Vec3::new(x0, y, z1),
    ]
}

fn floor(x0: f32, x1: f32) -> BoxWorld {
    BoxWorld::new().with_solid(Vec3::new(x0, -100.0, -100.0), Vec3::new(x1, 0.0, 1100.0))
}

/// Two 2000 x 2000 polygons side by side, each holding a POI at its center.
///
/// Poly 1 spans x 0..2000, poly 2 spans x 2000..4000, both on z 0..2000.
pub fn flat_room() -> Scene {
    let mut scene = Scene::new(
        vec![
            rect(0.0, 0.0, 2000.0, 2000.0, 0.0),
            rect(2000.0, 0.0, 4000.0, 2000.0, 0.0),
        ],
        &[],
        BoxWorld::new().with_solid(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(4100.0, 0.0, 2100.0)),
    );
    scene.pois.insert(Poi::new("west", Vec3::new(1000.0, 0.0, 1000.0), 40.0, 40.0, PoiKind::Generic));
    scene.pois.insert(Poi::new("east", Vec3::new(3000.0, 0.0, 1000.0), 40.0, 40.0, PoiKind::Generic));
    scene
}

/// Two polygons sharing an edge, the second under a ceiling at y = 230 that
/// only lets the shorter capsule size through.
pub fn low_ceiling_room() -> Scene {
    Scene::new(
        vec![rect(0.0, 0.0, 1000.0, 1000.0, 0.0), rect(1000.0, 0.0, 2000.0, 1000.0, 0.0)],
        &[],
        floor(-100.0, 2100.0).with_solid(Vec3::new(1000.0, 230.0, -100.0), Vec3::new(2100.0, 300.0, 1100.0)),
    )
}

/// A floor (poly 1, x 0..1000) next to a 200 unit high plateau (solid from
/// x 1000). The plateau top polygon (poly 2) starts 40 units in from its
/// edge, so a capsule standing at the foot of the plateau touches the wall.
pub fn ledge() -> Scene {
    Scene::new(
        vec![rect(0.0, 0.0, 1000.0, 1000.0, 0.0), rect(1040.0, 0.0, 2000.0, 1000.0, 200.0)],
        &[],
        floor(-100.0, 1000.0).with_solid(Vec3::new(1000.0, -100.0, -100.0), Vec3::new(2000.0, 200.0, 1100.0)),
    )
}

/// Three polygons in a row; the middle one (poly 2) is water flowing
/// towards +x.
pub fn water_channel() -> Scene {
    let water = PhysicsVolume {
        id: 1,
        water: true,
        current: Vec3::new(400.0, 0.0, 0.0),
        ..Default::default()
    };
    Scene::new(
        vec![
            rect(0.0, 0.0, 1000.0, 1000.0, 0.0),
            rect(1000.0, 0.0, 2000.0, 1000.0, 0.0),
            rect(2000.0, 0.0, 3000.0, 1000.0, 0.0),
        ],
        &[],
        floor(-100.0, 3100.0).with_volume(Vec3::new(1000.0, -100.0, -100.0), Vec3::new(2000.0, 500.0, 1100.0), water),
    )
}

/// Two floors 3000 units apart connected by a jump pad named "pad" on the
/// first one. With `walkway` an off-mesh connection also links them.
pub fn jump_pad(walkway: bool) -> Scene {
    let links = if walkway {
        vec![OffMeshLink {
            start: Vec3::new(900.0, 0.0, 500.0),
            end: Vec3::new(4100.0, 0.0, 500.0),
            bidirectional: false,
        }]
    } else {
        Vec::new()
    };
    let mut scene = Scene::new(
        vec![rect(0.0, 0.0, 1000.0, 1000.0, 0.0), rect(4000.0, 0.0, 5000.0, 1000.0, 0.0)],
        &links,
        floor(-100.0, 5100.0),
    );
    scene.pois.insert(Poi::new(
        "pad",
        Vec3::new(500.0, 0.0, 500.0),
        50.0,
        50.0,
        PoiKind::JumpPad {
            jump_target: Vec3::new(4500.0, 0.0, 500.0),
        },
    ));
    scene
}

/// A corridor whose middle polygon (poly 2) is buried in a solid block.
pub fn buried_corridor() -> Scene {
    Scene::new(
        vec![
            rect(0.0, 0.0, 1000.0, 1000.0, 0.0),
            rect(1000.0, 0.0, 2000.0, 1000.0, 0.0),
            rect(2000.0, 0.0, 3000.0, 1000.0, 0.0),
        ],
        &[],
        floor(-100.0, 3100.0).with_solid(Vec3::new(1000.0, -100.0, -100.0), Vec3::new(2000.0, 300.0, 1100.0)),
    )
}

/// Four polygons in a row; the two narrow middle ones are the footprint of
/// the destination-only POI "goal".
pub fn destination_strip() -> Scene {
    let mut scene = Scene::new(
        vec![
            rect(0.0, 0.0, 1000.0, 1000.0, 0.0),
            rect(1000.0, 0.0, 1100.0, 1000.0, 0.0),
            rect(1100.0, 0.0, 1200.0, 1000.0, 0.0),
            rect(1200.0, 0.0, 2200.0, 1000.0, 0.0),
        ],
        &[],
        floor(-100.0, 2300.0),
    );
    scene.pois.insert(
        Poi::new("goal", Vec3::new(1100.0, 0.0, 500.0), 100.0, 50.0, PoiKind::Generic).with_destination_only(true),
    );
    scene
}

/// Two 2000 unit long polygons with a pickup named "health" just off the
/// straight line through the first one.
pub fn pickup_hall() -> Scene {
    let mut scene = Scene::new(
        vec![rect(0.0, 0.0, 2000.0, 1000.0, 0.0), rect(2000.0, 0.0, 4000.0, 1000.0, 0.0)],
        &[],
        floor(-100.0, 4100.0),
    );
    scene.pois.insert(Poi::new(
        "health",
        Vec3::new(1000.0, 0.0, 600.0),
        30.0,
        30.0,
        PoiKind::Pickup { desirability: 1.0 },
    ));
    scene
}

/// A 2 x 2 grid of 1000 unit squares with POIs in two opposite corners.
///
/// Poly 1 is the south west square (x 0..1000, z 0..1000), poly 2 is east of
/// it, poly 3 north of it and poly 4 the north east square.
pub fn grid_room() -> Scene {
    let mut scene = Scene::new(
        vec![
            rect(0.0, 0.0, 1000.0, 1000.0, 0.0),
            rect(1000.0, 0.0, 2000.0, 1000.0, 0.0),
            rect(0.0, 1000.0, 1000.0, 2000.0, 0.0),
            rect(1000.0, 1000.0, 2000.0, 2000.0, 0.0),
        ],
        &[],
        BoxWorld::new().with_solid(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(2100.0, 0.0, 2100.0)),
    );
    scene.pois.insert(Poi::new("sw", Vec3::new(500.0, 0.0, 500.0), 40.0, 40.0, PoiKind::Generic));
    scene.pois.insert(Poi::new("ne", Vec3::new(1500.0, 0.0, 1500.0), 40.0, 40.0, PoiKind::Generic));
    scene
}

/// The two floors of [`jump_pad`] joined by a teleporter named "teleporter"
/// on the first floor and a lift named "lift" on the second one taking
/// agents back.
pub fn teleporters() -> Scene {
    let mut scene = Scene::new(
        vec![rect(0.0, 0.0, 1000.0, 1000.0, 0.0), rect(4000.0, 0.0, 5000.0, 1000.0, 0.0)],
        &[],
        floor(-100.0, 5100.0),
    );
    scene.pois.insert(Poi::new(
        "teleporter",
        Vec3::new(500.0, 0.0, 500.0),
        50.0,
        50.0,
        PoiKind::Teleporter {
            exit: Vec3::new(4300.0, 0.0, 500.0),
        },
    ));
    scene.pois.insert(Poi::new(
        "lift",
        Vec3::new(4700.0, 0.0, 500.0),
        50.0,
        50.0,
        PoiKind::Lift {
            exit: Vec3::new(800.0, 0.0, 500.0),
        },
    ));
    scene
}

/// Two floors separated by a 700 unit wide bottomless pit (x 1000..1700).
/// Walking speed jumps fall short, dodge jumps clear it.
pub fn pit() -> Scene {
    let mut scene = Scene::new(
        vec![rect(0.0, 0.0, 1000.0, 1000.0, 0.0), rect(1700.0, 0.0, 2700.0, 1000.0, 0.0)],
        &[],
        floor(-100.0, 1000.0).with_solid(Vec3::new(1700.0, -100.0, -100.0), Vec3::new(2800.0, 0.0, 1100.0)),
    );
    scene.config.jump.max_jump_z = scene.config.agent.jump_z;
    scene
}

/// Two flooded polygons (poly 1 x 0..1000, poly 2 x 1200..2200) with a 200
/// unit strip of flooded floor between them that is not part of the mesh.
pub fn flooded_gap() -> Scene {
    let water = PhysicsVolume {
        id: 1,
        water: true,
        ..Default::default()
    };
    Scene::new(
        vec![rect(0.0, 0.0, 1000.0, 1000.0, 0.0), rect(1200.0, 0.0, 2200.0, 1000.0, 0.0)],
        &[],
        floor(-100.0, 2300.0).with_volume(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(2300.0, 500.0, 1100.0), water),
    )
}

/// Every fixture, for invariants that must hold on any graph.
pub fn all_scenes() -> Vec<(&'static str, Scene)> {
    vec![
        ("flat_room", flat_room()),
        ("low_ceiling_room", low_ceiling_room()),
        ("ledge", ledge()),
        ("water_channel", water_channel()),
        ("jump_pad", jump_pad(false)),
        ("jump_pad_walkway", jump_pad(true)),
        ("buried_corridor", buried_corridor()),
        ("destination_strip", destination_strip()),
        ("pickup_hall", pickup_hall()),
        ("grid_room", grid_room()),
        ("teleporters", teleporters()),
        ("pit", pit()),
        ("flooded_gap", flooded_gap()),
    ]
}
