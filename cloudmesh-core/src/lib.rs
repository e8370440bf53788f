//! Core data structures for cloudmesh
//!
//! This crate provides the fundamental types shared by the cloudmesh
//! processing stages: points, point clouds, triangle meshes, the global
//! normalization transform, and per-file provenance records.

pub mod error;
pub mod mesh;
pub mod point;
pub mod point_cloud;
pub mod provenance;
pub mod transform;

pub use error::*;
pub use mesh::*;
pub use point::*;
pub use point_cloud::*;
pub use provenance::*;
pub use transform::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// Common result type for cloudmesh operations
pub type Result<T> = std::result::Result<T, Error>;
