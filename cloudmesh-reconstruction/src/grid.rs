//! Grid-resampling reconstruction
//!
//! Treats z as a height field over the planar (x, y) bounding box: every
//! grid cell center picks the nearest input point by squared planar
//! distance and adopts that point's full 3D position. The grid resolution
//! is stepped from the input size and capped, which bounds the worst-case
//! triangle count regardless of how many points come in. Brute-force
//! nearest lookup is acceptable at that bounded resolution.

use cloudmesh_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use rayon::prelude::*;

/// Hard cap on the square grid resolution.
pub const MAX_GRID_RESOLUTION: usize = 60;

/// Pick the square grid resolution for an input point count.
///
/// Stepped table, hand-tuned; boundary values are pinned downstream, keep
/// verbatim.
pub fn grid_resolution(point_count: usize) -> usize {
    match point_count {
        n if n < 1_000 => 15,
        n if n < 10_000 => 25,
        n if n < 50_000 => 35,
        n if n < 100_000 => 45,
        n => (((n as f64 / 50.0).sqrt().floor()) as usize).min(MAX_GRID_RESOLUTION),
    }
}

/// Reconstruct a triangulated surface from scattered points, choosing the
/// grid resolution from the input size.
pub fn reconstruct(points: &[Point3f]) -> Result<TriangleMesh> {
    reconstruct_with_resolution(points, grid_resolution(points.len()))
}

/// Reconstruct with an explicit square grid resolution (minimum 2).
///
/// Fewer than three input points is a contract violation and is rejected
/// before any grid work begins.
pub fn reconstruct_with_resolution(points: &[Point3f], resolution: usize) -> Result<TriangleMesh> {
    if points.len() < 3 {
        return Err(Error::InsufficientData(format!(
            "surface reconstruction needs at least 3 points, got {}",
            points.len()
        )));
    }
    let res = resolution.max(2);

    // Planar bounding box; z is sampled, not gridded.
    let mut min_x = points[0].x;
    let mut min_y = points[0].y;
    let mut max_x = points[0].x;
    let mut max_y = points[0].y;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let step_x = (max_x - min_x) / res as f32;
    let step_y = (max_y - min_y) / res as f32;

    // Sample each cell center from its planar nearest neighbor. Cells are
    // independent, so the lookup parallelizes without affecting the result.
    let vertices: Vec<Point3f> = (0..res * res)
        .into_par_iter()
        .map(|cell| {
            let row = cell / res;
            let col = cell % res;
            let cx = min_x + (col as f32 + 0.5) * step_x;
            let cy = min_y + (row as f32 + 0.5) * step_y;

            let mut best = points[0];
            let mut best_d2 = f32::MAX;
            for p in points {
                let dx = p.x - cx;
                let dy = p.y - cy;
                let d2 = dx * dx + dy * dy;
                if d2 < best_d2 {
                    best_d2 = d2;
                    best = *p;
                }
            }
            best
        })
        .collect();

    // Two triangles per quad with a fixed diagonal split.
    let mut faces = Vec::with_capacity(2 * (res - 1) * (res - 1));
    for row in 0..res - 1 {
        for col in 0..res - 1 {
            let tl = row * res + col;
            let tr = tl + 1;
            let bl = (row + 1) * res + col;
            let br = bl + 1;
            faces.push([tl, bl, tr]);
            faces.push([tr, bl, br]);
        }
    }

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    let normals = accumulate_vertex_normals(&mesh);
    mesh.set_normals(normals);
    Ok(mesh)
}

/// Sum each triangle's unit normal into the accumulators of the vertices
/// it touches, then normalize. Vertices whose accumulation cancels out (or
/// that only touch degenerate triangles) keep a zero normal.
fn accumulate_vertex_normals(mesh: &TriangleMesh) -> Vec<Vector3f> {
    let mut acc = vec![Vector3f::zeros(); mesh.vertex_count()];
    for face in &mesh.faces {
        let n = mesh.face_normal(face);
        for &vi in face {
            acc[vi] += n;
        }
    }
    for n in &mut acc {
        let len = n.magnitude();
        if len > 1e-12 {
            *n /= len;
        } else {
            *n = Vector3f::zeros();
        }
    }
    acc
}
