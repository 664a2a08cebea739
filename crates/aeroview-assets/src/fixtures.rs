//! Minimal GLB writer for tests.
//!
//! Produces real binary glTF containers (header, JSON chunk, BIN chunk) so
//! tests exercise the same parsing path as uploaded files.

use serde_json::{json, Value};

const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;

struct FixtureNode {
    positions: Vec<[f32; 3]>,
    indices: Option<Vec<u32>>,
    translation: [f32; 3],
    scale: Option<[f32; 3]>,
    mode: Option<u32>,
}

/// Builds a GLB with one root node per call to [`GlbBuilder::node`], each
/// owning its own mesh.
#[derive(Default)]
pub struct GlbBuilder {
    nodes: Vec<FixtureNode>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node whose mesh is a triangle list over `positions`.
    pub fn node(mut self, positions: &[[f32; 3]], translation: [f32; 3]) -> Self {
        self.nodes.push(FixtureNode {
            positions: positions.to_vec(),
            indices: None,
            translation,
            scale: None,
            mode: None,
        });
        self
    }

    /// Add an indexed node.
    pub fn indexed_node(mut self, positions: &[[f32; 3]], indices: &[u32]) -> Self {
        self.nodes.push(FixtureNode {
            positions: positions.to_vec(),
            indices: Some(indices.to_vec()),
            translation: [0.0; 3],
            scale: None,
            mode: None,
        });
        self
    }

    /// Add a node with a per-axis scale.
    pub fn scaled_node(mut self, positions: &[[f32; 3]], scale: [f32; 3]) -> Self {
        self.nodes.push(FixtureNode {
            positions: positions.to_vec(),
            indices: None,
            translation: [0.0; 3],
            scale: Some(scale),
            mode: None,
        });
        self
    }

    /// Set the primitive mode of the most recently added node
    /// (glTF numbering: 0 points, 1 lines, 4 triangles, 5 strip, 6 fan).
    pub fn with_mode(mut self, mode: u32) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.mode = Some(mode);
        }
        self
    }

    /// A closed unit-ish box spanning `min..max`, as 12 indexed triangles.
    pub fn cuboid(self, min: [f32; 3], max: [f32; 3]) -> Self {
        let corners: Vec<[f32; 3]> = (0..8)
            .map(|i| {
                [
                    if i & 1 == 0 { min[0] } else { max[0] },
                    if i & 2 == 0 { min[1] } else { max[1] },
                    if i & 4 == 0 { min[2] } else { max[2] },
                ]
            })
            .collect();
        let indices = [
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        self.indexed_node(&corners, &indices)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bin: Vec<u8> = Vec::new();
        let mut buffer_views = Vec::new();
        let mut accessors = Vec::new();
        let mut meshes = Vec::new();
        let mut nodes = Vec::new();

        for (i, node) in self.nodes.iter().enumerate() {
            let position_accessor = accessors.len();
            let (min, max) = min_max(&node.positions);
            let offset = bin.len();
            for p in &node.positions {
                for c in p {
                    bin.extend_from_slice(&c.to_le_bytes());
                }
            }
            buffer_views.push(json!({
                "buffer": 0,
                "byteOffset": offset,
                "byteLength": node.positions.len() * 12,
            }));
            accessors.push(json!({
                "bufferView": buffer_views.len() - 1,
                "componentType": FLOAT,
                "count": node.positions.len(),
                "type": "VEC3",
                "min": min,
                "max": max,
            }));

            let mut primitive = json!({ "attributes": { "POSITION": position_accessor } });
            if let Some(indices) = &node.indices {
                let offset = bin.len();
                for index in indices {
                    bin.extend_from_slice(&index.to_le_bytes());
                }
                buffer_views.push(json!({
                    "buffer": 0,
                    "byteOffset": offset,
                    "byteLength": indices.len() * 4,
                }));
                accessors.push(json!({
                    "bufferView": buffer_views.len() - 1,
                    "componentType": UNSIGNED_INT,
                    "count": indices.len(),
                    "type": "SCALAR",
                }));
                primitive["indices"] = json!(accessors.len() - 1);
            }
            if let Some(mode) = node.mode {
                primitive["mode"] = json!(mode);
            }

            meshes.push(json!({ "name": format!("mesh{}", i), "primitives": [primitive] }));
            let mut node_json = json!({
                "name": format!("node{}", i),
                "mesh": i,
                "translation": node.translation,
            });
            if let Some(scale) = node.scale {
                node_json["scale"] = json!(scale);
            }
            nodes.push(node_json);
        }

        let mut root = json!({
            "asset": { "version": "2.0", "generator": "aeroview fixtures" },
            "scene": 0,
            "scenes": [{ "nodes": (0..self.nodes.len()).collect::<Vec<_>>() }],
        });
        if !self.nodes.is_empty() {
            root["nodes"] = Value::Array(nodes);
            root["meshes"] = Value::Array(meshes);
            root["accessors"] = Value::Array(accessors);
            root["bufferViews"] = Value::Array(buffer_views);
            root["buffers"] = json!([{ "byteLength": bin.len() }]);
        }

        let mut json_chunk = serde_json::to_vec(&root).unwrap_or_default();
        pad(&mut json_chunk, b' ');
        pad(&mut bin, 0);

        let mut total = 12 + 8 + json_chunk.len();
        if !bin.is_empty() {
            total += 8 + bin.len();
        }

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json_chunk);
        if !bin.is_empty() {
            out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
            out.extend_from_slice(&bin);
        }
        out
    }
}

fn min_max(points: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for p in points {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (min, max)
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}
