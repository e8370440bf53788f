//! # cloudmesh-io
//!
//! File I/O for cloudmesh: streaming coordinate text ingestion with
//! skipped-line accounting, and an STL triangle-mesh codec (ASCII and
//! binary read, ASCII write).

pub mod stl;
pub mod xyz;

pub use stl::{StlReader, StlWriter};
pub use xyz::{load_points, parse_line, LoadedFile};

use cloudmesh_core::{Result, TriangleMesh};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}
