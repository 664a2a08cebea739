//! Fixed stand-in scenes shown while loading and after a failure

use aeroview_core::Color;
use glam::Vec3;

use crate::mesh::Mesh;

const LOADING_COLOR: u32 = 0x3B82F6;
const ERROR_BODY_COLOR: u32 = 0xEF4444;
const ERROR_MARKER_COLOR: u32 = 0xFBBF24;

/// Small cube drawn while an asset is still loading
pub fn loading_indicator() -> Mesh {
    Mesh::cuboid(Vec3::splat(0.5), Vec3::ZERO, Color::from_hex(LOADING_COLOR).to_array())
}

/// Red block with a yellow marker, drawn when an asset cannot be shown
pub fn error_indicator() -> Mesh {
    let mut mesh = Mesh::cuboid(
        Vec3::new(2.0, 1.0, 0.5),
        Vec3::ZERO,
        Color::from_hex(ERROR_BODY_COLOR).to_array(),
    );
    mesh.append(&Mesh::cuboid(
        Vec3::new(0.1, 0.3, 0.1),
        Vec3::new(0.0, 1.2, 0.0),
        Color::from_hex(ERROR_MARKER_COLOR).to_array(),
    ));
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_indicator_has_body_and_marker() {
        let mesh = error_indicator();
        assert_eq!(mesh.vertex_count(), 48);
        let bounds = mesh.bounds();
        assert!((bounds.min.y + 0.5).abs() < 1e-6);
        assert!((bounds.max.y - 1.35).abs() < 1e-6);
    }

    #[test]
    fn test_loading_indicator_is_small() {
        let bounds = loading_indicator().bounds();
        assert!((bounds.max_extent() - 0.5).abs() < 1e-6);
    }
}
