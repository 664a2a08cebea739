/// Errors raised while turning a scene into a frame.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("mesh '{mesh}' references vertex {index} but has {count} vertices")]
    IndexOutOfRange { mesh: String, index: u32, count: usize },

    #[error("mesh '{mesh}' has {count} indices, which is not a whole number of triangles")]
    IncompleteTriangles { mesh: String, count: usize },

    #[error("non-finite vertex in mesh '{0}'")]
    NonFiniteVertex(String),

    #[error("normalizing transform is not finite")]
    NonFiniteTransform,
}
