//! Network build scenarios over the hand made test scenes
//!
//! Covers node membership, link bookkeeping, size stepping, jump and swim
//! discovery and special paths.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use glam::Vec3;

    use crate::builder::{BuildPhase, NavContext, NetworkBuilder};
    use crate::build_log::BuildWarning;
    use crate::collision::PhysicsVolume;
    use crate::config::NavGraphConfig;
    use crate::graph::NavGraph;
    use crate::nav_query::{NavQuery, PolyRef};
    use crate::poi::{Poi, PoiKind};
    use crate::path_node::NodeId;
    use crate::reach::ReachFlags;
    use crate::reach_spec::ReachSpec;
    use crate::size::CapsuleSize;
    use crate::test_helpers::*;

    fn node_of(graph: &NavGraph, poly: u32) -> NodeId {
        graph.node_for_poly(PolyRef::new(poly)).unwrap()
    }

    #[test]
    fn test_polys_belong_to_one_node() {
        for (name, scene) in all_scenes() {
            let graph = build_graph(&scene);
            let mut seen = HashSet::new();
            for (id, node) in graph.nodes() {
                assert!(node.is_alive(), "{name}");
                for poly in &node.polys {
                    assert!(seen.insert(*poly), "{name}: poly {} in two nodes", poly.id());
                    assert_eq!(graph.node_for_poly(*poly), Some(id), "{name}");
                    assert!(!graph.is_blocked(*poly), "{name}");
                }
            }
            for poly in scene.mesh.all_polys() {
                assert!(
                    seen.contains(&poly) || graph.is_blocked(poly),
                    "{name}: poly {} was never claimed",
                    poly.id()
                );
            }
        }
    }

    #[test]
    fn test_links_reference_their_nodes() {
        for (name, scene) in all_scenes() {
            let graph = build_graph(&scene);
            for (id, node) in graph.nodes() {
                for link in &node.links {
                    assert_eq!(link.start, id, "{name}");
                    assert_ne!(link.end, id, "{name}");
                    assert!(node.contains_poly(link.start_edge_poly), "{name}");
                    let end = graph.node(link.end).unwrap();
                    assert!(link.end_polys().all(|p| end.contains_poly(p)), "{name}");
                    assert_eq!(link.distances.len(), node.polys.len(), "{name}");
                    assert!(link.distances.iter().all(|d| *d > 0), "{name}");
                }
                let walk_ends: Vec<NodeId> = node.links.iter().filter(|l| l.is_walk()).map(|l| l.end).collect();
                let unique: HashSet<NodeId> = walk_ends.iter().copied().collect();
                assert_eq!(walk_ends.len(), unique.len(), "{name}: duplicate walk link");
            }
        }
    }

    #[test]
    fn test_sizes_are_steps() {
        for (name, scene) in all_scenes() {
            let graph = build_graph(&scene);
            let steps = graph.size_steps();
            for (_, node) in graph.nodes() {
                if !node.destination_only {
                    assert_eq!(steps.step(node.min_poly_edge_size), node.min_poly_edge_size, "{name}");
                }
                for link in &node.links {
                    assert_eq!(steps.step(link.size()), link.size(), "{name}");
                }
            }
        }
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        for (name, scene) in all_scenes() {
            let first = build_graph(&scene).summary();
            let second = build_graph(&scene).summary();
            assert_eq!(first, second, "{name}");
        }
    }

    #[test]
    fn test_budgeted_build_matches_full_build() {
        let scene = ledge();
        let full = build_graph(&scene).summary();

        let mut graph = NavGraph::default();
        let mut builder = NetworkBuilder::new(scene.config.clone());
        builder.start(&mut graph);
        let mut phases = Vec::new();
        while builder.is_building() {
            phases.push(builder.advance(&mut graph, &scene.ctx(), 1));
        }
        assert!(phases.contains(&BuildPhase::JumpPass1));
        assert_eq!(graph.summary(), full);
    }

    #[test]
    fn test_flat_room_nodes_follow_pois() {
        let scene = flat_room();
        let graph = build_graph(&scene);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 2);

        let west = scene.pois.find("west").unwrap();
        let east = scene.pois.find("east").unwrap();
        assert_eq!(graph.node_for_poi(west), Some(node_of(&graph, 1)));
        assert_eq!(graph.node_for_poi(east), Some(node_of(&graph, 2)));
        assert_eq!(graph.node(node_of(&graph, 1)).unwrap().min_poly_edge_size, CapsuleSize::new(80, 150));
    }

    #[test]
    fn test_grid_corners_split_into_linked_nodes() {
        let scene = grid_room();
        let graph = build_graph(&scene);
        assert_eq!(graph.node_count(), 3);

        let sw = graph.node_for_poi(scene.pois.find("sw").unwrap()).unwrap();
        let ne = graph.node_for_poi(scene.pois.find("ne").unwrap()).unwrap();
        assert_ne!(sw, ne);
        assert_eq!(sw, node_of(&graph, 1));
        assert_eq!(ne, node_of(&graph, 4));

        // Every mesh edge between two nodes carries a walk link each way
        let ctx = scene.ctx();
        for poly in scene.mesh.all_polys() {
            let from = graph.node_for_poly(poly).unwrap();
            for edge in ctx.nav.poly_edges(poly) {
                let Some(to) = edge.neighbor.and_then(|n| graph.node_for_poly(n)) else {
                    continue;
                };
                if to != from {
                    assert!(graph.node(from).unwrap().walk_link_to(to).is_some());
                    assert!(graph.node(to).unwrap().walk_link_to(from).is_some());
                }
            }
        }
    }

    #[test]
    fn test_same_size_polys_merge_into_one_node() {
        let mut scene = flat_room();
        scene.pois = Default::default();
        let graph = build_graph(&scene);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_low_ceiling_splits_nodes() {
        let scene = low_ceiling_room();
        let graph = build_graph(&scene);
        assert_eq!(graph.node_count(), 2);

        let open = node_of(&graph, 1);
        let low = node_of(&graph, 2);
        assert_eq!(graph.node(open).unwrap().min_poly_edge_size, CapsuleSize::new(80, 150));
        assert_eq!(graph.node(low).unwrap().min_poly_edge_size, CapsuleSize::new(80, 90));

        let link = graph.node(open).unwrap().walk_link_to(low).unwrap();
        assert_eq!(link.size(), CapsuleSize::new(80, 90));
        assert!(graph.node(low).unwrap().walk_link_to(open).is_some());
    }

    #[test]
    fn test_buried_poly_is_blocked() {
        let scene = buried_corridor();
        let graph = build_graph(&scene);
        assert_eq!(graph.blocked_polys().collect::<Vec<_>>(), vec![PolyRef::new(2)]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 0);
        assert!(graph.node_for_poly(PolyRef::new(2)).is_none());
    }

    #[test]
    fn test_destination_covers_footprint() {
        let scene = destination_strip();
        let graph = build_graph(&scene);
        let goal = scene.pois.find("goal").unwrap();
        let node_id = graph.node_for_poi(goal).unwrap();
        let node = graph.node(node_id).unwrap();

        assert!(node.destination_only);
        let mut polys: Vec<u32> = node.polys.iter().map(|p| p.id()).collect();
        polys.sort_unstable();
        assert_eq!(polys, vec![2, 3]);

        // The floors on both sides are separate nodes linked to the destination
        let west = node_of(&graph, 1);
        let east = node_of(&graph, 4);
        assert_ne!(west, east);
        assert!(graph.node(west).unwrap().has_link_to(node_id));
        assert!(graph.node(node_id).unwrap().has_link_to(east));
    }

    #[test]
    fn test_empty_destination_is_reported() {
        let mut scene = destination_strip();
        let goal = scene.pois.find("goal").unwrap();
        scene.pois.get_mut(goal).unwrap().location = Vec3::new(9000.0, 0.0, 500.0);

        let mut graph = NavGraph::default();
        let mut builder = NetworkBuilder::new(NavGraphConfig::default());
        builder.build(&mut graph, &scene.ctx());
        assert!(builder
            .log()
            .warnings()
            .iter()
            .any(|w| matches!(w, BuildWarning::EmptyDestination { name } if name == "goal")));
        assert!(graph.node_for_poi(goal).is_none());
    }

    #[test]
    fn test_unlinkable_poi_is_reported() {
        let mut scene = flat_room();
        let lost = scene
            .pois
            .insert(Poi::new("lost", Vec3::new(9000.0, 0.0, 1000.0), 40.0, 40.0, PoiKind::Generic));

        let mut graph = NavGraph::default();
        let mut builder = NetworkBuilder::new(scene.config.clone());
        builder.build(&mut graph, &scene.ctx());
        assert!(builder
            .log()
            .warnings()
            .iter()
            .any(|w| matches!(w, BuildWarning::UnlinkablePoi { name, .. } if name == "lost")));
        assert!(graph.node_for_poi(lost).is_none());
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_ledge_fall_and_high_jump_back() {
        let scene = ledge();
        let graph = build_graph(&scene);
        let bottom = node_of(&graph, 1);
        let top = node_of(&graph, 2);

        let fall: Vec<_> = graph.node(top).unwrap().links_to(bottom).collect();
        assert_eq!(fall.len(), 1);
        assert_eq!(fall[0].reach_flags, ReachFlags::JUMP);
        assert!(fall[0].spec.is_none());

        let up: Vec<_> = graph.node(bottom).unwrap().links_to(top).collect();
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].reach_flags, ReachFlags::JUMP);
        match &up[0].spec {
            Some(ReachSpec::HighJump {
                required_jump_z,
                dodge_jump,
                jump_end,
                ..
            }) => {
                assert!(*required_jump_z > 420.0);
                assert!(*required_jump_z <= 1000.0);
                assert!(!dodge_jump);
                assert!((jump_end.y - 200.0).abs() < 1e-3);
            }
            other => panic!("expected a high jump, got {other:?}"),
        }
    }

    #[test]
    fn test_no_jumps_into_kill_volume() {
        let mut scene = ledge();
        let lava = PhysicsVolume {
            id: 2,
            kill: true,
            ..Default::default()
        };
        scene
            .world
            .add_volume(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(1000.0, 150.0, 1100.0), lava);
        let graph = build_graph(&scene);
        let bottom = node_of(&graph, 1);
        let top = node_of(&graph, 2);

        assert!(graph.node(bottom).unwrap().physics_volume.kill);
        assert!(!graph.node(top).unwrap().has_link_to(bottom));
        assert!(!graph.node(bottom).unwrap().has_link_to(top));
    }

    #[test]
    fn test_dodge_jump_clears_pit() {
        let scene = pit();
        let graph = build_graph(&scene);
        let west = node_of(&graph, 1);
        let east = node_of(&graph, 2);
        assert_ne!(west, east);

        for (from, to) in [(west, east), (east, west)] {
            let links: Vec<_> = graph.node(from).unwrap().links_to(to).collect();
            assert_eq!(links.len(), 1);
            assert_eq!(links[0].reach_flags, ReachFlags::JUMP);
            match &links[0].spec {
                Some(ReachSpec::HighJump {
                    required_jump_z,
                    dodge_jump,
                    ..
                }) => {
                    assert!(*dodge_jump);
                    assert!(*required_jump_z <= scene.config.jump.dodge_jump_z);
                }
                other => panic!("expected a dodge jump, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_find_jump_needs_enough_rise() {
        let scene = ledge();
        let graph = build_graph(&scene);
        let top = node_of(&graph, 2);
        let builder = NetworkBuilder::new(scene.config.clone());
        let ctx = scene.ctx();

        let start = Vec3::new(958.0, 0.0, 500.0);
        let end = Vec3::new(1082.0, 200.0, 500.0);
        let jump = builder.find_jump(&graph, &ctx, start, end, top).unwrap();
        let min_jump_z = (2.0f32 * 980.0 * 200.0).sqrt();
        assert!(jump.required_jump_z >= min_jump_z - 1e-3);
        assert_eq!(jump.jump_start, start);

        // Flush against the plateau wall the capsule cannot even start
        let blocked_start = Vec3::new(1000.0, 0.0, 500.0);
        assert!(builder.find_jump(&graph, &ctx, blocked_start, end, top).is_none());
    }

    #[test]
    fn test_water_current_blocks_upstream_links() {
        let scene = water_channel();
        let graph = build_graph(&scene);
        let west = node_of(&graph, 1);
        let water = node_of(&graph, 2);
        let east = node_of(&graph, 3);
        assert_eq!(graph.node_count(), 3);
        assert!(graph.node(water).unwrap().physics_volume.water);

        let swim = |from: NodeId, to: NodeId| {
            graph
                .node(from)
                .unwrap()
                .links_to(to)
                .any(|l| l.reach_flags == ReachFlags::SWIM)
        };
        assert!(swim(west, water));
        assert!(swim(water, east));
        assert!(swim(east, water));
        assert!(!graph.node(water).unwrap().has_link_to(west));
    }

    #[test]
    fn test_swim_link_across_gap() {
        let scene = flooded_gap();
        let graph = build_graph(&scene);
        let west = node_of(&graph, 1);
        let east = node_of(&graph, 2);
        assert_ne!(west, east);

        for (from, to) in [(west, east), (east, west)] {
            let node = graph.node(from).unwrap();
            assert!(node.physics_volume.water);
            assert!(node.walk_link_to(to).is_none());
            let links: Vec<_> = node.links_to(to).collect();
            assert_eq!(links.len(), 1);
            assert_eq!(links[0].reach_flags, ReachFlags::SWIM);
            assert!(links[0].spec.is_none());
        }
    }

    #[test]
    fn test_jump_pad_link() {
        let scene = jump_pad(false);
        let graph = build_graph(&scene);
        let pad = scene.pois.find("pad").unwrap();
        let start = node_of(&graph, 1);
        let end = node_of(&graph, 2);
        assert_eq!(graph.node_for_poi(pad), Some(start));

        let links: Vec<_> = graph.node(start).unwrap().links_to(end).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].reach_flags, ReachFlags::empty());
        assert_eq!(links[0].size(), graph.size_steps().largest());
        assert!(matches!(links[0].spec, Some(ReachSpec::JumpPad { pad: p, .. }) if p == pad));
        // Walk to the pad plus the flight to the target
        assert_eq!(links[0].distances, vec![4000]);
        assert!(!graph.node(end).unwrap().has_link_to(start));
    }

    #[test]
    fn test_teleporter_and_lift_links() {
        let scene = teleporters();
        let graph = build_graph(&scene);
        let teleporter = scene.pois.find("teleporter").unwrap();
        let lift = scene.pois.find("lift").unwrap();
        let west = node_of(&graph, 1);
        let east = node_of(&graph, 2);
        assert_eq!(graph.node_for_poi(teleporter), Some(west));
        assert_eq!(graph.node_for_poi(lift), Some(east));

        let out: Vec<_> = graph.node(west).unwrap().links_to(east).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].reach_flags, ReachFlags::empty());
        assert_eq!(out[0].size(), graph.size_steps().largest());
        assert!(matches!(
            out[0].spec,
            Some(ReachSpec::Teleporter { teleporter: t, exit }) if t == teleporter && exit == Vec3::new(4300.0, 0.0, 500.0)
        ));

        let back: Vec<_> = graph.node(east).unwrap().links_to(west).collect();
        assert_eq!(back.len(), 1);
        assert!(matches!(back[0].spec, Some(ReachSpec::Lift { lift: l, .. }) if l == lift));
    }

    #[test]
    fn test_walkway_adds_off_mesh_walk_link() {
        let scene = jump_pad(true);
        let graph = build_graph(&scene);
        let start = node_of(&graph, 1);
        let end = node_of(&graph, 2);
        let node = graph.node(start).unwrap();
        assert!(node.walk_link_to(end).is_some());
        assert!(node.links_to(end).any(|l| l.spec.is_some()));
    }

    #[test]
    fn test_tick_build_with_context() {
        let scene = flat_room();
        let ctx = NavContext::new(&scene.mesh, &scene.world, &scene.pois);
        let mut graph = NavGraph::default();
        let mut builder = NetworkBuilder::new(scene.config.clone());
        builder.start(&mut graph);
        let phase = builder.advance(&mut graph, &ctx, 1);
        // Everything up to the jump passes completes in the first call
        assert!(matches!(phase, BuildPhase::JumpPass1 | BuildPhase::JumpPass2 | BuildPhase::Done));
        assert_eq!(graph.node_count(), 2);
    }
}
