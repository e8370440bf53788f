//! Global normalization transform
//!
//! Points expressed in very large native coordinates (survey data, UTM
//! frames) lose precision when rendered as f32. The global transform
//! recenters the full accumulated point set at the origin and scales its
//! largest extent to a fixed nominal span of 100 units.

use crate::point::*;
use serde::{Deserialize, Serialize};

/// Nominal span the largest bounding-box extent is mapped to.
pub const NOMINAL_SPAN: f32 = 100.0;

/// One-time center-and-scale normalization for the accumulated point set.
///
/// Computed once per full load from the bounding box of the *entire*
/// accumulated set and reused for every subsequent downsample/render cycle,
/// so points from different files stay in a consistent frame. `computed` is
/// cleared whenever the set changes or is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalTransform {
    pub center: Point3f,
    pub scale: f32,
    pub computed: bool,
}

impl GlobalTransform {
    /// The identity transform, marked as not yet computed
    pub fn identity() -> Self {
        Self {
            center: Point3f::origin(),
            scale: 1.0,
            computed: false,
        }
    }

    /// Apply the transform to a single point: `(p - center) * scale`
    pub fn apply_point(&self, p: &Point3f) -> Point3f {
        Point3f::from((p - self.center) * self.scale)
    }

    /// Mark the transform stale so the next render cycle recomputes it
    pub fn reset(&mut self) {
        *self = Self::identity();
    }
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity() {
        let t = GlobalTransform::identity();
        assert!(!t.computed);
        assert_eq!(t.scale, 1.0);
        let p = Point3f::new(3.0, -2.0, 5.0);
        assert_eq!(t.apply_point(&p), p);
    }

    #[test]
    fn test_apply_point() {
        let t = GlobalTransform {
            center: Point3f::new(10.0, 20.0, 30.0),
            scale: 0.5,
            computed: true,
        };
        let p = t.apply_point(&Point3f::new(12.0, 18.0, 30.0));
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, -1.0);
        assert_relative_eq!(p.z, 0.0);
    }

    #[test]
    fn test_reset_clears_computed() {
        let mut t = GlobalTransform {
            center: Point3f::new(1.0, 1.0, 1.0),
            scale: 2.0,
            computed: true,
        };
        t.reset();
        assert!(!t.computed);
        assert_eq!(t.center, Point3f::origin());
    }
}
