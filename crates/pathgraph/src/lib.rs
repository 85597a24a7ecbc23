//! Path node graph and pathfinding over navigation meshes
//!
//! Navigation mesh polygons are grouped into path nodes that share a stepped
//! capsule size and a physics volume. Nodes are connected by directed links
//! for walking, swimming and jumping, plus special links provided by points
//! of interest such as jump pads, teleporters and lifts. Searches run over
//! nodes instead of polygons, which keeps queries proportional to the size
//! of the node graph.
//!
//! # Example
//!
//! ```rust,ignore
//! use pathgraph::{NavContext, NavGraphConfig, PathNetwork, PathQuery, SingleEndpointEval};
//!
//! let ctx = NavContext::new(&mesh, &world, &pois);
//! let mut network = PathNetwork::new(NavGraphConfig::default())?;
//! network.rebuild(&ctx, true);
//!
//! let query = PathQuery::new(agent, start);
//! let mut evaluator = SingleEndpointEval::new(goal);
//! if let Some(path) = network.find_best_path(&ctx, &query, &mut evaluator) {
//!     let points = network.get_move_points(&ctx, start, &agent, &path.route);
//! }
//! ```
//!
//! # Architecture
//!
//! - [`NetworkBuilder`]: resumable build of the node graph
//! - [`NavGraph`]: node arena with poly membership and links
//! - [`Pathfinder`]: best-first node search driven by a [`NodeEvaluator`]
//! - [`get_move_points`]: waypoints for the next route item
//! - [`PathNetwork`]: owns the above and follows mesh regenerations
//!
//! The navigation mesh and the collision world are reached through the
//! [`NavQuery`] and [`CollisionWorld`] traits. [`SimplePolyMesh`] and
//! [`BoxWorld`] implement them for small hand made scenes.

pub mod box_world;
pub mod build_log;
pub mod builder;
pub mod collision;
pub mod config;
pub mod evaluator;
pub mod graph;
pub mod nav_query;
pub mod network;
pub mod path_link;
pub mod path_node;
pub mod pathfinder;
pub mod poi;
pub mod reach;
pub mod reach_spec;
pub mod route;
pub mod search_pool;
pub mod simple_mesh;
pub mod size;
pub mod string_pull;

pub use box_world::*;
pub use build_log::*;
pub use builder::*;
pub use collision::*;
pub use config::*;
pub use evaluator::*;
pub use graph::*;
pub use nav_query::*;
pub use network::*;
pub use path_link::*;
pub use path_node::*;
pub use pathfinder::*;
pub use poi::*;
pub use reach::*;
pub use reach_spec::*;
pub use route::*;
pub use simple_mesh::*;
pub use size::*;
pub use string_pull::*;

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod builder_scenario_tests;
