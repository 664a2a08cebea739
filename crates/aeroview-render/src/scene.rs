//! Camera and lighting for the viewer stage

use glam::Vec3;
use serde::Serialize;

/// A point or directional light
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Light {
    pub position: Vec3,
    pub intensity: f32,
}

/// View-wide uniforms for rendering
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewUniforms {
    /// Camera position, looking at the origin
    pub eye: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub ambient_intensity: f32,
    pub key_light: Light,
    pub fill_light: Light,
}

impl Default for ViewUniforms {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            fov_degrees: 50.0,
            near: 0.1,
            far: 100.0,
            ambient_intensity: 0.5,
            key_light: Light {
                position: Vec3::new(10.0, 10.0, 5.0),
                intensity: 1.0,
            },
            fill_light: Light {
                position: Vec3::new(-10.0, -10.0, -10.0),
                intensity: 0.5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_scene_fits_in_view() {
        // A 2-unit scene centered at the origin must sit inside the frustum.
        let uniforms = ViewUniforms::default();
        let distance = uniforms.eye.z - 1.0;
        assert!(distance > uniforms.near);
        assert!(uniforms.eye.z + 1.0 < uniforms.far);

        let half_height = (uniforms.fov_degrees.to_radians() / 2.0).tan() * distance;
        assert!(half_height > 1.0, "{}", half_height);
    }
}
