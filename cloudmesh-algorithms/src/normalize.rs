//! Global normalization
//!
//! Computes and applies the one-time center/scale transform described in
//! [`cloudmesh_core::GlobalTransform`]. The transform is derived from the
//! bounding box of the full accumulated point set; applying it recenters
//! the set at the origin and maps the largest extent to the nominal span.

use cloudmesh_core::{GlobalTransform, Point3f, NOMINAL_SPAN};
use rayon::prelude::*;

/// Compute the global transform for a full accumulated point set.
///
/// `scale = NOMINAL_SPAN / max_range`, or 1.0 when the set is empty or has
/// zero extent. The result is marked `computed`.
pub fn compute_transform(points: &[Point3f]) -> GlobalTransform {
    if points.is_empty() {
        return GlobalTransform {
            center: Point3f::origin(),
            scale: 1.0,
            computed: true,
        };
    }

    let mut min = points[0];
    let mut max = points[0];
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    let center = Point3f::new(
        (min.x + max.x) / 2.0,
        (min.y + max.y) / 2.0,
        (min.z + max.z) / 2.0,
    );
    let max_range = (max.x - min.x).max(max.y - min.y).max(max.z - min.z);
    let scale = if max_range > 0.0 {
        NOMINAL_SPAN / max_range
    } else {
        1.0
    };

    GlobalTransform {
        center,
        scale,
        computed: true,
    }
}

/// Apply the transform to every point in place.
///
/// The same transform must be used for every point of the accumulated set
/// regardless of source file; per-file transforms would put the files'
/// coordinate frames out of register with each other.
pub fn apply_transform(points: &mut [Point3f], transform: &GlobalTransform) {
    points
        .par_iter_mut()
        .for_each(|p| *p = transform.apply_point(p));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_set_is_identity() {
        let t = compute_transform(&[]);
        assert!(t.computed);
        assert_eq!(t.center, Point3f::origin());
        assert_eq!(t.scale, 1.0);
    }

    #[test]
    fn test_zero_extent_scale_is_one() {
        let points = vec![Point3f::new(7.0, 8.0, 9.0); 10];
        let t = compute_transform(&points);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.center, Point3f::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_apply_then_compute_is_origin_centered() {
        // Large native coordinates, 4000 units of x extent.
        let mut points = vec![
            Point3f::new(500_000.0, 4_000_000.0, 120.0),
            Point3f::new(504_000.0, 4_001_000.0, 180.0),
            Point3f::new(502_000.0, 4_000_500.0, 150.0),
        ];
        let t = compute_transform(&points);
        apply_transform(&mut points, &t);

        let t2 = compute_transform(&points);
        assert_relative_eq!(t2.center.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(t2.center.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(t2.center.z, 0.0, epsilon = 1e-3);

        // The normalized max range equals the nominal span, so the second
        // scale is 1.0 within float tolerance.
        assert_relative_eq!(t2.scale, 1.0, epsilon = 1e-4);
        let xs: Vec<f32> = points.iter().map(|p| p.x).collect();
        let range = xs.iter().cloned().fold(f32::MIN, f32::max)
            - xs.iter().cloned().fold(f32::MAX, f32::min);
        assert_relative_eq!(range, NOMINAL_SPAN, epsilon = 1e-2);
    }

    #[test]
    fn test_single_global_frame_for_all_points() {
        // Two "files" in different frames still land in one shared frame.
        let mut points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(10.0, 0.0, 0.0),
            Point3f::new(1000.0, 0.0, 0.0),
            Point3f::new(1010.0, 0.0, 0.0),
        ];
        let t = compute_transform(&points);
        apply_transform(&mut points, &t);

        // Relative spacing within each file is preserved by the shared scale.
        assert_relative_eq!(points[1].x - points[0].x, points[3].x - points[2].x);
    }
}
