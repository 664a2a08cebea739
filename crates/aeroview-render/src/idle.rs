//! Idle oscillation that keeps the view visibly live

use glam::{Mat4, Quat};
use serde::{Deserialize, Serialize};

/// Yaw oscillation: `sin(t * frequency) * amplitude` radians about +Y.
///
/// Rotation happens about the origin, after normalization, so it never moves
/// the scene's center or changes its scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdleMotion {
    /// Peak yaw in radians
    pub amplitude: f32,
    /// Angular frequency in radians per second
    pub frequency: f32,
}

impl Default for IdleMotion {
    fn default() -> Self {
        Self {
            amplitude: 0.1,
            frequency: 1.0,
        }
    }
}

impl IdleMotion {
    pub const STILL: Self = Self {
        amplitude: 0.0,
        frequency: 0.0,
    };

    pub fn new(amplitude: f32, frequency: f32) -> Self {
        Self {
            amplitude: if amplitude.is_finite() { amplitude.abs() } else { 0.0 },
            frequency: if frequency.is_finite() { frequency } else { 0.0 },
        }
    }

    /// Yaw angle at `time` seconds
    pub fn yaw(&self, time: f32) -> f32 {
        (time * self.frequency).sin() * self.amplitude
    }

    pub fn rotation(&self, time: f32) -> Quat {
        Quat::from_rotation_y(self.yaw(time))
    }

    /// Compose the oscillation on top of a placement matrix
    pub fn compose(&self, time: f32, placement: Mat4) -> Mat4 {
        Mat4::from_quat(self.rotation(time)) * placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_yaw_stays_within_amplitude() {
        let idle = IdleMotion::default();
        for i in 0..1000 {
            let yaw = idle.yaw(i as f32 * 0.037);
            assert!(yaw.abs() <= 0.1 + 1e-6);
        }
        assert_eq!(idle.yaw(0.0), 0.0);
    }

    #[test]
    fn test_compose_keeps_origin_fixed() {
        let idle = IdleMotion::default();
        let m = idle.compose(1.3, Mat4::from_scale(Vec3::splat(0.5)));
        assert!(m.transform_point3(Vec3::ZERO).length() < 1e-6);
        // Scale is preserved by the rotation.
        assert!((m.transform_vector3(Vec3::X).length() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_parameters_are_sanitized() {
        let idle = IdleMotion::new(f32::NAN, f32::INFINITY);
        assert_eq!(idle, IdleMotion::STILL);
        assert_eq!(IdleMotion::new(-0.2, 1.0).amplitude, 0.2);
    }
}
