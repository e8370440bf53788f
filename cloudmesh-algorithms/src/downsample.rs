//! Voxel-grid downsampling
//!
//! Reduces a point cloud to a renderable subset by hashing points into an
//! axis-aligned voxel grid and keeping the first-inserted point of every
//! occupied voxel. The voxel edge length is derived from a per-level target
//! point count, so one slider level (1 = finest, 10 = coarsest) controls
//! both how many points survive and how coarse the spatial bucketing is.
//!
//! First-point-wins selection and input-order output make the reduction
//! deterministic for a fixed input and level; the presentation layer
//! re-runs it whenever the level changes and depends on reproducible
//! output.

use cloudmesh_core::Point3f;
use rayon::prelude::*;
use std::collections::HashSet;

/// Downsampling never targets fewer points than this.
pub const MIN_TARGET_POINTS: usize = 1000;

/// Fraction of points to keep per level (level 1 at index 0). Hand-tuned;
/// downstream consumers pin the boundary values, keep verbatim.
const RETENTION: [f32; 10] = [0.95, 0.85, 0.75, 0.65, 0.55, 0.45, 0.35, 0.25, 0.17, 0.10];

/// Voxel edge scale per level (level 1 at index 0). Independent of the
/// retention table; both are indexed by the same slider level.
const VOXEL_SCALE: [f32; 10] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Target number of points to retain for `original` input points at the
/// given level: `max(1000, round(original * retention(level)))`.
pub fn target_point_count(original: usize, level: u8) -> usize {
    let idx = (level.clamp(1, 10) - 1) as usize;
    let target = (original as f64 * RETENTION[idx] as f64).round() as usize;
    target.max(MIN_TARGET_POINTS)
}

/// Reduce `points` to roughly the per-level target count.
///
/// When `tags` is provided it must be in lock-step with `points`; the
/// returned tag vector is in lock-step with the returned points, carrying
/// each surviving point's source-file index through the reduction.
///
/// The input is returned unchanged when it has two or fewer points, when
/// `level` is below 1, when the input is already at or below the target
/// count, or when the bounding box is degenerate (zero extent).
pub fn downsample(
    points: &[Point3f],
    tags: Option<&[u32]>,
    level: u8,
) -> (Vec<Point3f>, Option<Vec<u32>>) {
    debug_assert!(tags.map_or(true, |t| t.len() == points.len()));

    if points.len() <= 2 || level < 1 {
        return (points.to_vec(), tags.map(<[u32]>::to_vec));
    }

    let target = target_point_count(points.len(), level);
    if points.len() <= target {
        return (points.to_vec(), tags.map(<[u32]>::to_vec));
    }

    let (min, max) = parallel_bounding_box(points);
    let extents = [max.x - min.x, max.y - min.y, max.z - min.z];
    let largest = extents[0].max(extents[1]).max(extents[2]);
    let smallest = extents[0].min(extents[1]).min(extents[2]);

    // Zero-extent bounding box: voxel hashing would divide by zero, so
    // hand the input back unreduced.
    if largest <= 0.0 {
        return (points.to_vec(), tags.map(<[u32]>::to_vec));
    }

    let idx = (level.clamp(1, 10) - 1) as usize;
    let avg_extent = (extents[0] + extents[1] + extents[2]) / 3.0;
    let raw = avg_extent / (target as f32).cbrt() * VOXEL_SCALE[idx];
    let voxel_size = raw.clamp(smallest * 0.001, largest * 0.1);
    if !(voxel_size > 0.0) || !voxel_size.is_finite() {
        return (points.to_vec(), tags.map(<[u32]>::to_vec));
    }

    // One pass in input order; the first point hashed into each voxel is
    // its representative, so output order is first-encounter order.
    let mut occupied: HashSet<(i64, i64, i64)> = HashSet::new();
    let mut reduced = Vec::new();
    let mut reduced_tags = tags.map(|_| Vec::new());

    for (i, p) in points.iter().enumerate() {
        let key = (
            ((p.x - min.x) / voxel_size).floor() as i64,
            ((p.y - min.y) / voxel_size).floor() as i64,
            ((p.z - min.z) / voxel_size).floor() as i64,
        );
        if occupied.insert(key) {
            reduced.push(*p);
            if let (Some(out), Some(t)) = (reduced_tags.as_mut(), tags) {
                out.push(t[i]);
            }
        }
    }

    (reduced, reduced_tags)
}

fn parallel_bounding_box(points: &[Point3f]) -> (Point3f, Point3f) {
    points
        .par_iter()
        .fold(
            || {
                (
                    Point3f::new(f32::MAX, f32::MAX, f32::MAX),
                    Point3f::new(f32::MIN, f32::MIN, f32::MIN),
                )
            },
            |(mut min, mut max), p| {
                min.x = min.x.min(p.x);
                min.y = min.y.min(p.y);
                min.z = min.z.min(p.z);
                max.x = max.x.max(p.x);
                max.y = max.y.max(p.y);
                max.z = max.z.max(p.z);
                (min, max)
            },
        )
        .reduce(
            || {
                (
                    Point3f::new(f32::MAX, f32::MAX, f32::MAX),
                    Point3f::new(f32::MIN, f32::MIN, f32::MIN),
                )
            },
            |(amin, amax), (bmin, bmax)| {
                (
                    Point3f::new(amin.x.min(bmin.x), amin.y.min(bmin.y), amin.z.min(bmin.z)),
                    Point3f::new(amax.x.max(bmax.x), amax.y.max(bmax.y), amax.z.max(bmax.z)),
                )
            },
        )
}
