//! AeroView Assets - Asset loading and normalization
//!
//! Turns an uploaded binary glTF container into an immutable [`SceneGraph`],
//! measures its [`BoundingVolume`], and derives the [`NormalizingTransform`]
//! that fits it into the viewport.

mod bounds;
mod error;
mod format;
mod gltf_loader;
mod handle;
mod loader;
mod mesh;
mod normalize;
mod scene;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use bounds::BoundingVolume;
pub use error::LoadError;
pub use format::AssetFormat;
pub use gltf_loader::{load_scene, load_scene_file};
pub use handle::{AssetHandle, AssetId, HandleRegistry};
pub use loader::{spawn_load, PendingLoad};
pub use mesh::{MeshAsset, MeshPrimitive, PrimitiveMode};
pub use normalize::{normalize, NormalizingTransform, VIEWPORT_UNIT};
pub use scene::{SceneGraph, SceneNode};
