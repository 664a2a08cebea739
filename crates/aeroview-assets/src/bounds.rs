use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::scene::SceneGraph;

/// Axis-aligned bounding box.
///
/// An empty volume has `min = +inf` and `max = -inf` so that extending it
/// with the first point yields a zero-size box around that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingVolume {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    /// Smallest box containing every world-space vertex of `scene`.
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let mut bounds = Self::empty();
        scene.for_each_world_position(|p| bounds.extend(p));
        bounds
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// True until at least one point has been added.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Largest of the three extents.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }

    /// Bounds of this box after applying `matrix` to all eight corners.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let (lo, hi) = (self.min, self.max);
        Self::from_points((0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            matrix.transform_point3(corner)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_until_extended() {
        let mut bounds = BoundingVolume::empty();
        assert!(bounds.is_empty());
        bounds.extend(Vec3::new(1.0, 2.0, 3.0));
        assert!(!bounds.is_empty());
        assert_eq!(bounds.size(), Vec3::ZERO);
    }

    #[test]
    fn test_size_and_center() {
        let bounds = BoundingVolume::from_points([Vec3::new(-1.0, -2.0, -1.0), Vec3::new(1.0, 2.0, 1.0)]);
        assert_eq!(bounds.size(), Vec3::new(2.0, 4.0, 2.0));
        assert_eq!(bounds.center(), Vec3::ZERO);
        assert_eq!(bounds.max_extent(), 4.0);
    }

    #[test]
    fn test_transformed_handles_rotation() {
        let bounds = BoundingVolume::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let rotated = bounds.transformed(Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let size = rotated.size();
        assert!((size.x - 1.0).abs() < 1e-5);
        assert!((size.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_non_finite_points_are_detected() {
        let bounds = BoundingVolume::from_points([Vec3::ZERO, Vec3::new(f32::INFINITY, 0.0, 0.0)]);
        assert!(!bounds.is_finite());
    }
}
