//! # cloudmesh-algorithms
//!
//! Point reduction and normalization algorithms for cloudmesh: voxel-grid
//! downsampling with per-level retention tables and provenance
//! carry-through, and the one-time global center/scale normalization.

pub mod downsample;
pub mod normalize;

pub use downsample::*;
pub use normalize::*;
