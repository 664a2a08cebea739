use std::path::PathBuf;

use glam::Vec3;

/// Errors that can occur while loading or normalizing an asset.
///
/// All of these are recovered inside the viewer by substituting a
/// placeholder scene.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("asset '{0}' is empty")]
    Empty(String),

    #[error("unsupported container for '{0}': {1}")]
    UnsupportedContainer(String, String),

    #[error("malformed glTF in '{0}': {1}")]
    Malformed(String, String),

    #[error("asset '{0}' is truncated: {1}")]
    Truncated(String, String),

    #[error("asset handle '{0}' was revoked before loading finished")]
    Revoked(String),

    #[error("scene in '{0}' contains no geometry")]
    NoGeometry(String),

    #[error("degenerate bounding volume (size {size}) in '{name}'")]
    DegenerateBounds { name: String, size: Vec3 },

    #[error("non-finite bounding volume in '{0}'")]
    NonFiniteBounds(String),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("asset loader stopped before delivering a result")]
    Interrupted,
}
