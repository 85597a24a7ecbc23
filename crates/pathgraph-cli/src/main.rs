//! CLI utility for building path node networks and finding routes through them

mod scene;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use pathgraph::{
    BestPath, BuildPhase, NodeEvaluator, PathNetwork, PathQuery, ReachParams, SingleEndpointEval,
};
use scene::Scene;

/// A CLI utility for path node network generation and pathfinding
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the path network of a scene and report its nodes and links
    Build {
        /// Input scene file (JSON)
        #[clap(long, value_parser)]
        scene: PathBuf,

        /// Output file for the network summary (JSON)
        #[clap(long, value_parser)]
        report: Option<PathBuf>,

        /// Run the jump passes over ticks of this many nodes instead of at once
        #[clap(long)]
        nodes_per_tick: Option<usize>,
    },

    /// Find a route through the path network of a scene
    FindPath {
        /// Input scene file (JSON)
        #[clap(long, value_parser)]
        scene: PathBuf,

        /// Start position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        start: Vec3,

        /// Goal position (x,y,z)
        #[clap(long, value_parser = parse_vector, conflicts_with = "poi")]
        goal: Option<Vec3>,

        /// Name of a point of interest to use as the goal
        #[clap(long)]
        poi: Option<String>,

        /// Allow detours to nearby pickups
        #[clap(long)]
        detours: bool,

        /// Agent capabilities (JSON), defaults to the scene's agent
        #[clap(long, value_parser)]
        agent: Option<PathBuf>,

        /// Output move points file
        #[clap(long, value_parser)]
        output: Option<PathBuf>,
    },
}

/// Parse a comma-separated vector
fn parse_vector(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').collect();

    if parts.len() != 3 {
        return Err(format!(
            "Vector must have 3 components, got {}",
            parts.len()
        ));
    }

    let x = parts[0].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = parts[1].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let z = parts[2].trim().parse::<f32>().map_err(|e| e.to_string())?;

    Ok(Vec3::new(x, y, z))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Build {
            scene,
            report,
            nodes_per_tick,
        } => build_network(&scene, report.as_deref(), nodes_per_tick),
        Commands::FindPath {
            scene,
            start,
            goal,
            poi,
            detours,
            agent,
            output,
        } => find_path(
            &scene,
            start,
            goal,
            poi.as_deref(),
            detours,
            agent.as_deref(),
            output.as_deref(),
        ),
    }
}

fn load_scene(path: &Path) -> Result<Scene> {
    println!("Loading scene from {}...", path.display());
    let scene = Scene::load(path)
        .with_context(|| format!("Failed to load scene: {}", path.display()))?;
    println!(
        "Scene loaded: {} polygons, {} points of interest",
        scene.mesh.poly_count(),
        scene.pois.len()
    );
    Ok(scene)
}

/// Build the path network of a scene
fn build_network(
    scene_path: &Path,
    report: Option<&Path>,
    nodes_per_tick: Option<usize>,
) -> Result<()> {
    let mut scene = load_scene(scene_path)?;
    if let Some(n) = nodes_per_tick {
        scene.config.nodes_per_tick = n;
    }

    let ctx = scene.ctx();
    let mut network = PathNetwork::new(scene.config.clone())
        .map_err(|e| anyhow!("Invalid network configuration: {}", e))?;

    println!("Building path network...");
    if nodes_per_tick.is_some() {
        let mut ticks = 0;
        loop {
            let phase = network.tick(&ctx);
            ticks += 1;
            log::debug!("tick {ticks}: {phase:?}");
            if phase == BuildPhase::Done {
                break;
            }
        }
        println!("Network built over {} ticks", ticks);
    } else {
        network.rebuild(&ctx, true);
    }

    let summary = network.summary();
    println!(
        "Path network built: {} nodes, {} links, {} blocked polygons",
        summary.node_count,
        summary.link_count,
        summary.blocked_polys.len()
    );

    for warning in network.build_log().warnings() {
        println!("Warning: {}", warning);
    }
    for (timer, duration) in network.build_log().timings() {
        println!("{:?}: {:.3} ms", timer, duration.as_secs_f64() * 1000.0);
    }

    if let Some(report_path) = report {
        println!("Saving network summary to {}...", report_path.display());
        let file = File::create(report_path)
            .with_context(|| format!("Failed to create report file: {}", report_path.display()))?;
        serde_json::to_writer_pretty(file, &summary)
            .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
    }

    Ok(())
}

/// Find a route through the path network of a scene
fn find_path(
    scene_path: &Path,
    start: Vec3,
    goal: Option<Vec3>,
    poi: Option<&str>,
    detours: bool,
    agent_path: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let scene = load_scene(scene_path)?;
    let ctx = scene.ctx();

    let agent = match agent_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read agent file: {}", path.display()))?;
            serde_json::from_str::<ReachParams>(&json)
                .with_context(|| format!("Failed to parse agent file: {}", path.display()))?
        }
        None => scene.config.agent,
    };

    let mut evaluator: Box<dyn NodeEvaluator> = match (goal, poi) {
        (Some(goal), _) => Box::new(SingleEndpointEval::new(goal)),
        (None, Some(name)) => {
            let key = scene
                .pois
                .find(name)
                .ok_or_else(|| anyhow!("Unknown point of interest: {}", name))?;
            let evaluator = SingleEndpointEval::for_poi(&scene.pois, key)
                .ok_or_else(|| anyhow!("Point of interest {} is not usable", name))?;
            Box::new(evaluator)
        }
        (None, None) => return Err(anyhow!("Either --goal or --poi is required")),
    };

    let mut network = PathNetwork::new(scene.config.clone())
        .map_err(|e| anyhow!("Invalid network configuration: {}", e))?;
    network.rebuild(&ctx, true);
    println!(
        "Path network built: {} nodes, {} links",
        network.graph().node_count(),
        network.graph().link_count()
    );

    let mut query = PathQuery::new(agent, start);
    if detours {
        query = query.with_detours(None);
    }

    println!("Finding path from {:?}...", start);
    let path = network
        .find_best_path(&ctx, &query, evaluator.as_mut())
        .ok_or_else(|| anyhow!("No path found"))?;
    print_route(&scene, &path);

    let move_points = network.get_move_points(&ctx, start, &agent, &path.route);
    println!("Generated {} move points", move_points.len());

    if let Some(output_path) = output {
        println!("Saving move points to {}...", output_path.display());

        let mut file = File::create(output_path)
            .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;

        writeln!(file, "# Route from {:?}", start)?;
        writeln!(file, "# {} move points", move_points.len())?;
        for point in &move_points {
            writeln!(file, "{},{},{}", point.x, point.y, point.z)?;
        }
    } else {
        println!("Move points:");
        for (i, point) in move_points.iter().enumerate() {
            println!("{}: {},{},{}", i, point.x, point.y, point.z);
        }
    }

    Ok(())
}

fn print_route(scene: &Scene, path: &BestPath) {
    println!(
        "Found path through {} nodes, cost {}, weight {:.2}",
        path.node_route.len(),
        path.total_cost,
        path.weight
    );
    for (i, item) in path.route.iter().enumerate() {
        let poi = item
            .poi
            .and_then(|key| scene.pois.get(key))
            .map(|p| format!(" ({})", p.name))
            .unwrap_or_default();
        let node = item
            .node
            .map(|n| n.index().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}: node {} poly {} at {},{},{}{}",
            i,
            node,
            item.target_poly.id(),
            item.location.x,
            item.location.y,
            item.location.z,
            poi
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("1,2.5,-3").unwrap(), Vec3::new(1.0, 2.5, -3.0));
        assert_eq!(parse_vector(" 4, 5 ,6").unwrap(), Vec3::new(4.0, 5.0, 6.0));
        assert!(parse_vector("1,2").is_err());
        assert!(parse_vector("a,b,c").is_err());
    }

    #[test]
    fn test_args_parse_find_path() {
        let args = Args::try_parse_from([
            "pathgraph",
            "find-path",
            "--scene",
            "scene.json",
            "--start",
            "0,92,0",
            "--poi",
            "flag",
        ])
        .unwrap();
        match args.command {
            Commands::FindPath { goal, poi, detours, .. } => {
                assert!(goal.is_none());
                assert_eq!(poi.as_deref(), Some("flag"));
                assert!(!detours);
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Args::try_parse_from([
            "pathgraph",
            "find-path",
            "--scene",
            "scene.json",
            "--start",
            "0,0,0",
            "--goal",
            "1,0,1",
            "--poi",
            "flag",
        ])
        .is_err());
    }
}
