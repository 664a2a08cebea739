//! AeroView Core - Shared types for the AeroView asset viewer
//!
//! This crate provides the foundational types used by the other crates:
//! - RGBA colors for display meshes
//! - Frame clock driving the viewer's idle animation

pub mod time;
pub mod types;

pub use time::{ClockConfig, FrameClock};
pub use types::Color;
