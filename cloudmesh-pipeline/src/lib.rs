//! # cloudmesh-pipeline
//!
//! Orchestrates one load-and-render cycle: accumulate coordinate files
//! with per-file provenance, normalize and downsample a snapshot off the
//! coordinating thread, and deliver the reduced points as an initial
//! renderable batch followed by incremental batches, with cooperative
//! cancellation at batch boundaries.

pub mod session;
pub mod stream;

pub use session::*;
pub use stream::*;
