//! Vertex types for 3D rendering

use bytemuck::{Pod, Zeroable};

/// Standard 3D vertex with position, normal, and color
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex3D {
    /// Size of one vertex in a GPU buffer
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }
}
