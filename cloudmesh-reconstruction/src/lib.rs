//! # cloudmesh-reconstruction
//!
//! Surface reconstruction from scattered points. The scattered set is
//! resampled onto a regular 2D grid by nearest-neighbor lookup over the
//! planar (x, y) bounding box, the grid is triangulated with a fixed
//! diagonal split, and per-vertex normals are accumulated from triangle
//! normals.

pub mod grid;

pub use grid::*;
