/// A loaded mesh asset (renderer-agnostic). Contains raw vertex data extracted
/// from a glTF file.
#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub name: String,
    pub primitives: Vec<MeshPrimitive>,
}

/// How a primitive's vertices are assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveMode {
    /// Whether the primitive describes surfaces.
    pub fn is_surface(&self) -> bool {
        matches!(self, Self::Triangles | Self::TriangleStrip | Self::TriangleFan)
    }
}

/// A single draw primitive within a mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshPrimitive {
    pub mode: PrimitiveMode,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Option<Vec<[f32; 4]>>,
    pub indices: Option<Vec<u32>>,
}

impl MeshAsset {
    /// Total vertex count across all primitives.
    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.positions.len()).sum()
    }
}
