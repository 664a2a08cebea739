use glam::{Mat4, Vec3};

use crate::mesh::MeshAsset;

/// One node of a loaded scene hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    /// Transform relative to the parent node.
    pub local: Mat4,
    /// Index into [`SceneGraph::meshes`].
    pub mesh: Option<usize>,
    /// Indices into [`SceneGraph::nodes`].
    pub children: Vec<usize>,
}

impl SceneNode {
    pub fn new(local: Mat4, mesh: Option<usize>) -> Self {
        Self {
            name: None,
            local,
            mesh,
            children: Vec::new(),
        }
    }
}

/// A parsed 3D scene. Treated as an immutable snapshot once loaded: the
/// viewer shares it behind an `Arc` and the render step bakes its own copy.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub name: String,
    pub nodes: Vec<SceneNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshAsset>,
}

impl SceneGraph {
    /// Number of nodes that reference a mesh.
    pub fn geometry_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.mesh.is_some()).count()
    }

    /// Visit every reachable node with its world matrix, depth first.
    ///
    /// Each node is visited at most once even if the hierarchy is cyclic.
    pub fn walk(&self, mut visit: impl FnMut(&SceneNode, Mat4)) {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Mat4::IDENTITY))
            .collect();

        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            let world = parent * node.local;
            visit(node, world);
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    /// Visit every vertex position in world space.
    pub fn for_each_world_position(&self, mut visit: impl FnMut(Vec3)) {
        self.walk(|node, world| {
            let Some(mesh) = node.mesh.and_then(|m| self.meshes.get(m)) else {
                return;
            };
            for primitive in &mesh.primitives {
                for p in &primitive.positions {
                    visit(world.transform_point3(Vec3::from_array(*p)));
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshPrimitive;

    fn single_point_mesh(p: [f32; 3]) -> MeshAsset {
        MeshAsset {
            name: "point".into(),
            primitives: vec![MeshPrimitive {
                positions: vec![p],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_walk_composes_parent_transforms() {
        let mut parent = SceneNode::new(Mat4::from_translation(Vec3::X * 10.0), None);
        parent.children.push(1);
        let child = SceneNode::new(Mat4::from_scale(Vec3::splat(2.0)), Some(0));

        let scene = SceneGraph {
            name: "nested".into(),
            nodes: vec![parent, child],
            roots: vec![0],
            meshes: vec![single_point_mesh([1.0, 1.0, 1.0])],
        };

        let mut points = Vec::new();
        scene.for_each_world_position(|p| points.push(p));
        assert_eq!(points, vec![Vec3::new(12.0, 2.0, 2.0)]);
        assert_eq!(scene.geometry_node_count(), 1);
    }

    #[test]
    fn test_walk_survives_cycles_and_dangling_indices() {
        let mut a = SceneNode::new(Mat4::IDENTITY, Some(0));
        a.children = vec![1, 7];
        let mut b = SceneNode::new(Mat4::IDENTITY, None);
        b.children = vec![0];

        let scene = SceneGraph {
            name: "cyclic".into(),
            nodes: vec![a, b],
            roots: vec![0, 42],
            meshes: vec![single_point_mesh([0.0, 0.0, 0.0])],
        };

        let mut visits = 0;
        scene.walk(|_, _| visits += 1);
        assert_eq!(visits, 2);
    }
}
