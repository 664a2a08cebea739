//! Rendered frame description handed to the presentation layer

use std::sync::Arc;

use aeroview_assets::NormalizingTransform;
use glam::Mat4;
use serde::Serialize;

use crate::mesh::Mesh;
use crate::scene::ViewUniforms;

/// What a frame is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameKind {
    /// No asset has been supplied
    Empty,
    /// Asset is still loading; the loading indicator is drawn
    Loading,
    /// The normalized asset
    Scene,
    /// Loading or rendering failed; the error indicator is drawn
    Placeholder,
}

/// One mesh drawn with one model matrix
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub mesh: Arc<Mesh>,
    pub model: Mat4,
}

/// Everything needed to draw one frame of the viewer
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    /// Animation time in seconds
    pub time: f32,
    pub kind: FrameKind,
    /// Normalization in effect, when showing a scene
    pub normalization: Option<NormalizingTransform>,
    pub draws: Vec<DrawCall>,
    pub uniforms: ViewUniforms,
}

/// Serializable digest of a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub index: u64,
    pub time: f32,
    pub kind: FrameKind,
    pub normalization: Option<NormalizingTransform>,
    pub draw_calls: usize,
    pub vertices: usize,
    pub triangles: usize,
}

impl Frame {
    pub fn empty(index: u64, time: f32) -> Self {
        Self {
            index,
            time,
            kind: FrameKind::Empty,
            normalization: None,
            draws: Vec::new(),
            uniforms: ViewUniforms::default(),
        }
    }

    /// A frame drawing a single fixed mesh (placeholder or loading indicator)
    pub fn fixed(index: u64, time: f32, kind: FrameKind, mesh: Arc<Mesh>, model: Mat4) -> Self {
        Self {
            index,
            time,
            kind,
            normalization: None,
            draws: vec![DrawCall { mesh, model }],
            uniforms: ViewUniforms::default(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.draws.iter().map(|d| d.mesh.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.draws.iter().map(|d| d.mesh.triangle_count()).sum()
    }

    pub fn summary(&self) -> FrameSummary {
        FrameSummary {
            index: self.index,
            time: self.time,
            kind: self.kind,
            normalization: self.normalization,
            draw_calls: self.draws.len(),
            vertices: self.vertex_count(),
            triangles: self.triangle_count(),
        }
    }
}
