//! Common utilities and data structures shared by the path graph crates
//!
//! Everything here works in a Y-up coordinate system. Most 2D helpers operate
//! on the XZ plane, matching the layout of the navigation meshes the graph is
//! built over.

mod geometry;
mod math;
mod vector;

pub use geometry::*;
pub use math::*;
pub use vector::*;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for path graph operations
pub type Result<T> = std::result::Result<T, Error>;
