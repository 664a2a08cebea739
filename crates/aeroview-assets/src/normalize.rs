use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingVolume;
use crate::error::LoadError;
use crate::scene::SceneGraph;

/// Length of the largest dimension of a normalized scene, in viewport units.
pub const VIEWPORT_UNIT: f32 = 2.0;

/// Uniform scale followed by a translation that centers a scene at the
/// origin with its largest dimension equal to [`VIEWPORT_UNIT`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizingTransform {
    pub scale: f32,
    pub translation: Vec3,
}

impl NormalizingTransform {
    /// Derive the transform for `bounds`.
    ///
    /// Fails when the volume is empty, non-finite, or has a zero extent on
    /// any axis.
    pub fn from_bounds(name: &str, bounds: &BoundingVolume) -> Result<Self, LoadError> {
        if bounds.is_empty() {
            return Err(LoadError::NoGeometry(name.to_string()));
        }
        if !bounds.is_finite() {
            return Err(LoadError::NonFiniteBounds(name.to_string()));
        }

        let size = bounds.size();
        if size.cmple(Vec3::ZERO).any() {
            return Err(LoadError::DegenerateBounds {
                name: name.to_string(),
                size,
            });
        }

        let scale = VIEWPORT_UNIT / size.max_element();
        if !scale.is_finite() || scale <= 0.0 {
            return Err(LoadError::NonFiniteBounds(name.to_string()));
        }

        Ok(Self {
            scale,
            translation: -bounds.center() * scale,
        })
    }

    /// Matrix form: `translate(translation) * scale(scale)`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            glam::Quat::IDENTITY,
            self.translation,
        )
    }

}

/// Compute the normalizing transform for a loaded scene.
///
/// Pure: the same scene always yields the same transform.
pub fn normalize(scene: &SceneGraph) -> Result<NormalizingTransform, LoadError> {
    let bounds = BoundingVolume::from_scene(scene);
    NormalizingTransform::from_bounds(&scene.name, &bounds)
}
