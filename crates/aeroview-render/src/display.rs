//! Baking a loaded scene into draw-ready geometry
//!
//! The loaded [`SceneGraph`] is never touched after loading. Baking produces
//! the render step's own copy with world transforms applied, which frames
//! then place with `idle * normalize`.

use std::sync::Arc;

use aeroview_assets::{MeshPrimitive, NormalizingTransform, PrimitiveMode, SceneGraph};
use aeroview_core::Color;
use glam::{Mat3, Mat4, Vec3};
use tracing::debug;

use crate::error::RenderError;
use crate::frame::{DrawCall, Frame, FrameKind};
use crate::idle::IdleMotion;
use crate::mesh::{face_normal, Mesh};
use crate::scene::ViewUniforms;
use crate::vertex::Vertex3D;

/// Body color for assets that carry no vertex colors
const DEFAULT_BODY_COLOR: u32 = 0xB8BEC7;

/// World-space geometry of one loaded scene
#[derive(Debug, Clone)]
pub struct DisplayModel {
    pub name: String,
    pub mesh: Arc<Mesh>,
}

impl DisplayModel {
    /// Flatten the scene hierarchy into a single world-space mesh.
    pub fn bake(scene: &SceneGraph) -> Result<Self, RenderError> {
        let mut mesh = Mesh::empty();
        let mut failure = None;

        scene.walk(|node, world| {
            if failure.is_some() {
                return;
            }
            let Some(asset) = node.mesh.and_then(|m| scene.meshes.get(m)) else {
                return;
            };
            for primitive in &asset.primitives {
                if let Err(e) = append_primitive(&mut mesh, &asset.name, primitive, world) {
                    failure = Some(e);
                    return;
                }
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }

        debug!(
            "Baked '{}': {} vertices, {} triangles",
            scene.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        Ok(Self {
            name: scene.name.clone(),
            mesh: Arc::new(mesh),
        })
    }

    /// Produce a frame showing this model under `transform` at `time`.
    pub fn frame(
        &self,
        index: u64,
        time: f32,
        transform: &NormalizingTransform,
        idle: &IdleMotion,
    ) -> Result<Frame, RenderError> {
        if !transform.scale.is_finite() || !transform.translation.is_finite() {
            return Err(RenderError::NonFiniteTransform);
        }

        Ok(Frame {
            index,
            time,
            kind: FrameKind::Scene,
            normalization: Some(*transform),
            draws: vec![DrawCall {
                mesh: Arc::clone(&self.mesh),
                model: idle.compose(time, transform.matrix()),
            }],
            uniforms: ViewUniforms::default(),
        })
    }
}

fn append_primitive(
    mesh: &mut Mesh,
    mesh_name: &str,
    primitive: &MeshPrimitive,
    world: Mat4,
) -> Result<(), RenderError> {
    let Some(indices) = triangle_list(mesh_name, primitive)? else {
        debug!("Skipping {:?} primitive in '{}'", primitive.mode, mesh_name);
        return Ok(());
    };
    let count = primitive.positions.len();

    let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
    let has_normals = primitive.normals.len() == count;
    let fallback_color = Color::from_hex(DEFAULT_BODY_COLOR).to_array();
    let colors = primitive.colors.as_ref().filter(|c| c.len() == count);

    let base = mesh.vertices.len();
    for i in 0..count {
        let position = world.transform_point3(Vec3::from_array(primitive.positions[i]));
        if !position.is_finite() {
            return Err(RenderError::NonFiniteVertex(mesh_name.to_string()));
        }
        let normal = if has_normals {
            (normal_matrix * Vec3::from_array(primitive.normals[i])).normalize_or_zero()
        } else {
            Vec3::ZERO
        };
        let color = colors.map_or(fallback_color, |c| c[i]);
        mesh.vertices.push(Vertex3D::new(position.to_array(), normal.to_array(), color));
    }

    if !has_normals {
        accumulate_normals(&mut mesh.vertices[base..], &indices);
    }

    let offset = base as u32;
    mesh.indices.extend(indices.iter().map(|i| i + offset));
    Ok(())
}

/// Triangle-list indices for a surface primitive, or `None` for points and
/// lines, which have no faces to draw.
fn triangle_list(mesh_name: &str, primitive: &MeshPrimitive) -> Result<Option<Vec<u32>>, RenderError> {
    if !primitive.mode.is_surface() {
        return Ok(None);
    }

    let count = primitive.positions.len();
    let order: Vec<u32> = match &primitive.indices {
        Some(indices) => {
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
                return Err(RenderError::IndexOutOfRange {
                    mesh: mesh_name.to_string(),
                    index: bad,
                    count,
                });
            }
            indices.clone()
        }
        None => (0..count as u32).collect(),
    };

    let triangles = match primitive.mode {
        PrimitiveMode::TriangleStrip => (0..order.len().saturating_sub(2))
            .flat_map(|i| {
                // Alternate winding so every face keeps the strip's orientation.
                if i % 2 == 0 {
                    [order[i], order[i + 1], order[i + 2]]
                } else {
                    [order[i + 1], order[i], order[i + 2]]
                }
            })
            .collect(),
        PrimitiveMode::TriangleFan => (1..order.len().saturating_sub(1))
            .flat_map(|i| [order[i], order[i + 1], order[0]])
            .collect(),
        _ if primitive.indices.is_some() && order.len() % 3 != 0 => {
            return Err(RenderError::IncompleteTriangles {
                mesh: mesh_name.to_string(),
                count: order.len(),
            });
        }
        _ => {
            let mut order = order;
            order.truncate(order.len() - order.len() % 3);
            order
        }
    };
    Ok(Some(triangles))
}

/// Average adjacent face normals into each vertex.
fn accumulate_normals(vertices: &mut [Vertex3D], indices: &[u32]) {
    let mut sums = vec![Vec3::ZERO; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let n = face_normal(
            Vec3::from_array(vertices[a].position),
            Vec3::from_array(vertices[b].position),
            Vec3::from_array(vertices[c].position),
        );
        sums[a] += n;
        sums[b] += n;
        sums[c] += n;
    }
    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        vertex.normal = sum.normalize_or_zero().to_array();
    }
}
