//! AeroView Render - Display model and viewer failure domain
//!
//! Bakes a loaded scene into draw-ready meshes, composes the idle animation
//! on top of the normalizing transform, and substitutes placeholder scenes
//! whenever loading or rendering fails.

pub mod display;
pub mod error;
pub mod frame;
pub mod idle;
pub mod mesh;
pub mod placeholder;
pub mod scene;
pub mod vertex;
pub mod viewer;

pub use display::DisplayModel;
pub use error::RenderError;
pub use frame::{DrawCall, Frame, FrameKind, FrameSummary};
pub use idle::IdleMotion;
pub use mesh::Mesh;
pub use scene::ViewUniforms;
pub use vertex::Vertex3D;
pub use viewer::{AssetViewer, ViewerStatus};
