//! Load/render session state
//!
//! Owns the accumulated full point set, its provenance tags and file
//! records, and the global transform for the current load. Loads append,
//! `clear` truncates, and each render cycle reads a snapshot, so the
//! accumulated state is never mutated concurrently with an in-flight run.
//! Callers must drive (or cancel and join) an in-flight run before loading
//! more files.

use crate::stream::{self, PipelineRun};
use cloudmesh_algorithms::compute_transform;
use cloudmesh_core::{
    Error, FileTable, GlobalTransform, Point3f, PointCloud, Result, TriangleMesh,
};
use cloudmesh_io::{load_points, MeshWriter, StlWriter};
use std::path::{Path, PathBuf};

/// A failed file in a multi-file load.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Per-file outcome of one multi-file load. Failures never abort the
/// remaining files in the batch.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<cloudmesh_io::LoadedFile>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// Total points added across the batch
    pub fn total_points(&self) -> usize {
        self.loaded.iter().map(|f| f.point_count).sum()
    }

    /// Aggregate count of skipped lines across the batch
    pub fn total_skipped(&self) -> usize {
        self.loaded.iter().map(|f| f.skipped_lines).sum()
    }

    /// Whether every file in the batch loaded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One accumulated point set with provenance and its render pipeline.
#[derive(Debug, Default)]
pub struct CloudSession {
    cloud: PointCloud<Point3f>,
    tags: Vec<u32>,
    files: FileTable,
    transform: GlobalTransform,
}

impl CloudSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accumulated points
    pub fn len(&self) -> usize {
        self.cloud.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cloud.is_empty()
    }

    /// Records of the files behind the accumulated set, in load order
    pub fn files(&self) -> &FileTable {
        &self.files
    }

    /// Bounding box of the accumulated set, for camera fitting
    pub fn bounding_box(&self) -> (Point3f, Point3f) {
        self.cloud.bounding_box()
    }

    /// Append every readable file in `paths` to the accumulated set.
    ///
    /// Each file gets a provenance record; failures are collected per file
    /// and do not abort the rest of the batch. Any successful append marks
    /// the global transform stale so the next render recomputes it from
    /// the full accumulated set.
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> LoadReport {
        let mut report = LoadReport::default();

        for path in paths {
            let path = path.as_ref();
            let before = self.cloud.len();
            match load_points(path, &mut self.cloud) {
                Ok(loaded) => {
                    let index = self.files.push(
                        loaded.path.clone(),
                        loaded.display_name.clone(),
                        loaded.point_count,
                    );
                    self.tags
                        .extend(std::iter::repeat(index as u32).take(loaded.point_count));
                    report.loaded.push(loaded);
                }
                Err(error) => {
                    // Roll back a partially appended file so records stay
                    // contiguous with the point sequence.
                    self.cloud.truncate(before);
                    report.failures.push(LoadFailure {
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }

        if !report.loaded.is_empty() {
            self.transform.reset();
        }
        report
    }

    /// Drop the accumulated set, its records, and the global transform.
    pub fn clear(&mut self) {
        self.cloud.clear();
        self.tags.clear();
        self.files.clear();
        self.transform.reset();
    }

    /// The current global transform (identity until first render).
    pub fn transform(&self) -> &GlobalTransform {
        &self.transform
    }

    /// Start a render cycle at the given downsample level (1-10).
    ///
    /// Computes the global transform once per full load, snapshots the
    /// accumulated set, and spawns the streaming worker. The returned run
    /// delivers batches in order; consume it to completion or cancel it
    /// before the next load.
    pub fn render(&mut self, level: u8) -> Result<PipelineRun> {
        if self.cloud.is_empty() {
            return Err(Error::InsufficientData(
                "no points loaded to render".to_string(),
            ));
        }

        if !self.transform.computed {
            self.transform = compute_transform(self.cloud.as_slice());
        }

        // Snapshot with fallible allocation: on exhaustion the accumulated
        // set stays intact and only this render cycle is abandoned.
        let mut snapshot: Vec<Point3f> = Vec::new();
        snapshot
            .try_reserve_exact(self.cloud.len())
            .map_err(|e| Error::ResourceExhaustion(e.to_string()))?;
        snapshot.extend_from_slice(self.cloud.as_slice());

        let mut tags: Vec<u32> = Vec::new();
        tags.try_reserve_exact(self.tags.len())
            .map_err(|e| Error::ResourceExhaustion(e.to_string()))?;
        tags.extend_from_slice(&self.tags);

        Ok(stream::start(snapshot, tags, self.transform, level))
    }
}

/// Reconstruct a surface from a reduced point set and write it as ASCII
/// STL under `output_dir`, creating the directory if needed. Returns the
/// mesh and the path written.
pub fn export_mesh(
    points: &[Point3f],
    output_dir: &Path,
    file_name: &str,
) -> Result<(TriangleMesh, PathBuf)> {
    let mesh = cloudmesh_reconstruction::reconstruct(points)?;

    std::fs::create_dir_all(output_dir).map_err(|source| Error::FileAccess {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let path = output_dir.join(file_name);
    StlWriter::write_mesh(&mesh, &path)?;

    Ok((mesh, path))
}
