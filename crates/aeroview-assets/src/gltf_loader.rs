use std::path::Path;

use glam::Mat4;
use tracing::debug;

use crate::error::LoadError;
use crate::format::{has_glb_magic, AssetFormat};
use crate::handle::AssetHandle;
use crate::mesh::{MeshAsset, MeshPrimitive, PrimitiveMode};
use crate::scene::{SceneGraph, SceneNode};

/// Size of the GLB file header (magic, version, length).
const GLB_HEADER_LEN: usize = 12;

/// Load the scene referenced by `handle`.
///
/// Malformed, truncated, or mislabelled input is always an error; this never
/// returns an empty scene in place of a failure.
pub fn load_scene(handle: &AssetHandle) -> Result<SceneGraph, LoadError> {
    let name = handle.name();
    if handle.is_revoked() {
        return Err(LoadError::Revoked(handle.uri().to_string()));
    }
    if handle.is_empty() {
        return Err(LoadError::Empty(name.to_string()));
    }
    if !handle.format().matches_content(handle.bytes()) {
        return Err(LoadError::UnsupportedContainer(
            name.to_string(),
            format!("content is not a .{} container", handle.format().extension()),
        ));
    }

    let base = handle.origin().and_then(Path::parent);
    parse_scene(name, handle.bytes(), base)
}

/// Read a `.glb`/`.gltf` file from disk and load it.
pub fn load_scene_file(path: &Path) -> Result<SceneGraph, LoadError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let format = AssetFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedContainer(name.clone(), "unknown extension".into()))?;
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;

    load_scene(&AssetHandle::from_bytes(name, format, bytes).with_origin(path))
}

fn parse_scene(name: &str, data: &[u8], base: Option<&Path>) -> Result<SceneGraph, LoadError> {
    if has_glb_magic(data) {
        check_glb_length(name, data)?;
    }

    let malformed = |e: gltf::Error| LoadError::Malformed(name.to_string(), e.to_string());
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(data).map_err(malformed)?;
    let buffers = gltf::import_buffers(&document, base, blob).map_err(malformed)?;
    check_ranges(name, &document, &buffers)?;

    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        let mesh_name = mesh.name().unwrap_or("unnamed").to_string();
        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let colors: Option<Vec<[f32; 4]>> = reader
                .read_colors(0)
                .map(|c| c.into_rgba_f32().collect());

            let indices: Option<Vec<u32>> = reader
                .read_indices()
                .map(|idx| idx.into_u32().collect());

            primitives.push(MeshPrimitive {
                mode: primitive_mode(primitive.mode()),
                positions,
                normals,
                colors,
                indices,
            });
        }

        let asset = MeshAsset {
            name: mesh_name,
            primitives,
        };
        debug!(
            "Loaded mesh '{}' with {} primitives, {} vertices",
            asset.name,
            asset.primitives.len(),
            asset.vertex_count()
        );
        meshes.push(asset);
    }

    let nodes: Vec<SceneNode> = document
        .nodes()
        .map(|node| SceneNode {
            name: node.name().map(str::to_string),
            local: Mat4::from_cols_array_2d(&node.transform().matrix()),
            mesh: node.mesh().map(|m| m.index()),
            children: node.children().map(|c| c.index()).collect(),
        })
        .collect();

    let roots: Vec<usize> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        // No scene declared: every node that is nobody's child is a root.
        None => {
            let mut is_child = vec![false; nodes.len()];
            for child in nodes.iter().flat_map(|n| n.children.iter()) {
                if let Some(flag) = is_child.get_mut(*child) {
                    *flag = true;
                }
            }
            (0..nodes.len()).filter(|&i| !is_child[i]).collect()
        }
    };

    let scene = SceneGraph {
        name: name.to_string(),
        nodes,
        roots,
        meshes,
    };

    debug!(
        "glTF '{}': {} nodes ({} with geometry), {} meshes",
        name,
        scene.nodes.len(),
        scene.geometry_node_count(),
        scene.meshes.len()
    );

    Ok(scene)
}

fn primitive_mode(mode: gltf::mesh::Mode) -> PrimitiveMode {
    use gltf::mesh::Mode;
    match mode {
        Mode::Points => PrimitiveMode::Points,
        Mode::Lines => PrimitiveMode::Lines,
        Mode::LineLoop => PrimitiveMode::LineLoop,
        Mode::LineStrip => PrimitiveMode::LineStrip,
        Mode::Triangles => PrimitiveMode::Triangles,
        Mode::TriangleStrip => PrimitiveMode::TriangleStrip,
        Mode::TriangleFan => PrimitiveMode::TriangleFan,
    }
}

/// Reject GLB containers shorter than their header claims.
fn check_glb_length(name: &str, data: &[u8]) -> Result<(), LoadError> {
    if data.len() < GLB_HEADER_LEN {
        return Err(LoadError::Truncated(
            name.to_string(),
            format!("{} bytes is shorter than the GLB header", data.len()),
        ));
    }
    let declared = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
    if declared > data.len() {
        return Err(LoadError::Truncated(
            name.to_string(),
            format!("header declares {} bytes, got {}", declared, data.len()),
        ));
    }
    Ok(())
}

/// Ensure every buffer view and accessor lies inside the loaded buffers, so
/// reading vertex data can never run past the end.
fn check_ranges(
    name: &str,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<(), LoadError> {
    let truncated = |detail: String| LoadError::Truncated(name.to_string(), detail);

    for view in document.views() {
        let available = buffers.get(view.buffer().index()).map_or(0, |d| d.0.len());
        let end = view.offset().checked_add(view.length());
        if end.map_or(true, |end| end > available) {
            return Err(truncated(format!(
                "buffer view {} ends past buffer {} ({} bytes)",
                view.index(),
                view.buffer().index(),
                available
            )));
        }
    }

    for accessor in document.accessors() {
        let Some(view) = accessor.view() else {
            continue;
        };
        if accessor.count() == 0 {
            continue;
        }
        let element = accessor.size();
        let stride = view.stride().unwrap_or(element);
        let end = (accessor.count() - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(accessor.offset()))
            .and_then(|n| n.checked_add(element));
        if end.map_or(true, |end| end > view.length()) {
            return Err(truncated(format!(
                "accessor {} ends past buffer view {}",
                accessor.index(),
                view.index()
            )));
        }
    }

    Ok(())
}
