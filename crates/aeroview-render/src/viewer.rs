//! Asset viewer with an isolated failure domain
//!
//! Loading, normalizing, and rendering errors are caught here, flip the
//! viewer's error flag, and swap the scene for the error indicator. Nothing
//! propagates to the caller. Supplying a new asset clears the flag.

use std::sync::Arc;

use aeroview_assets::{
    normalize, spawn_load, AssetHandle, AssetId, LoadError, NormalizingTransform, PendingLoad,
    SceneGraph,
};
use aeroview_core::{ClockConfig, FrameClock};
use glam::Mat4;
use serde::Serialize;
use tracing::{info, warn};

use crate::display::DisplayModel;
use crate::frame::{Frame, FrameKind};
use crate::idle::IdleMotion;
use crate::mesh::Mesh;
use crate::placeholder;

/// Externally visible viewer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewerStatus {
    Empty,
    Loading,
    Ready,
    Failed,
}

enum Stage {
    Empty,
    Loading {
        pending: PendingLoad,
    },
    Ready {
        scene: Arc<SceneGraph>,
        model: DisplayModel,
        transform: NormalizingTransform,
    },
    Failed,
}

/// Loads one asset at a time and renders it normalized, or a placeholder.
pub struct AssetViewer {
    stage: Stage,
    has_error: bool,
    last_error: Option<String>,
    /// Bumped on every new asset; identifies which upload is on screen.
    generation: u64,
    asset: Option<AssetId>,
    clock: FrameClock,
    idle: IdleMotion,
    loading_mesh: Arc<Mesh>,
    error_mesh: Arc<Mesh>,
}

impl Default for AssetViewer {
    fn default() -> Self {
        Self::new(IdleMotion::default(), ClockConfig::default())
    }
}

impl AssetViewer {
    pub fn new(idle: IdleMotion, clock: ClockConfig) -> Self {
        Self {
            stage: Stage::Empty,
            has_error: false,
            last_error: None,
            generation: 0,
            asset: None,
            clock: FrameClock::new(clock),
            idle,
            loading_mesh: Arc::new(placeholder::loading_indicator()),
            error_mesh: Arc::new(placeholder::error_indicator()),
        }
    }

    /// Start showing `handle`. Loads on a background thread; frames show the
    /// loading indicator until it resolves.
    pub fn set_asset(&mut self, handle: AssetHandle) {
        let id = handle.id();
        info!("Viewer loading '{}' ({})", handle.name(), handle.uri());
        self.watch(spawn_load(handle));
        self.asset = Some(id);
    }

    /// Start showing whatever `pending` resolves to.
    ///
    /// Any earlier load is abandoned: its receiver is dropped, so its result
    /// can never reach this viewer.
    pub fn watch(&mut self, pending: PendingLoad) {
        self.reset_failure_domain();
        self.generation += 1;
        self.asset = None;
        self.clock.reset();
        self.stage = Stage::Loading { pending };
    }

    /// Drop the current asset and show nothing.
    pub fn clear(&mut self) {
        self.reset_failure_domain();
        self.generation += 1;
        self.asset = None;
        self.stage = Stage::Empty;
    }

    /// Block until the current load resolves.
    pub fn finish_loading(&mut self) -> ViewerStatus {
        if let Stage::Loading { .. } = self.stage {
            if let Stage::Loading { pending } = std::mem::replace(&mut self.stage, Stage::Empty) {
                self.accept(pending.wait());
            }
        }
        self.status()
    }

    /// Check for a finished load without blocking.
    pub fn poll(&mut self) -> ViewerStatus {
        let outcome = match &self.stage {
            Stage::Loading { pending } => pending.try_recv(),
            _ => None,
        };
        if let Some(result) = outcome {
            self.accept(result);
        }
        self.status()
    }

    /// Advance the idle animation by `delta` seconds and produce a frame.
    pub fn render(&mut self, delta: f32) -> Frame {
        self.clock.tick(delta);
        self.poll();

        let index = self.clock.frame_count;
        let time = self.clock.seconds();

        let rendered = match &self.stage {
            Stage::Empty => return Frame::empty(index, time),
            Stage::Loading { .. } => {
                return Frame::fixed(index, time, FrameKind::Loading, Arc::clone(&self.loading_mesh), Mat4::IDENTITY)
            }
            Stage::Failed => return self.placeholder_frame(index, time),
            Stage::Ready { model, transform, .. } => model.frame(index, time, transform, &self.idle),
        };

        match rendered {
            Ok(frame) => frame,
            Err(e) => {
                self.fail(e.to_string());
                self.placeholder_frame(index, time)
            }
        }
    }

    pub fn status(&self) -> ViewerStatus {
        match self.stage {
            Stage::Empty => ViewerStatus::Empty,
            Stage::Loading { .. } => ViewerStatus::Loading,
            Stage::Ready { .. } => ViewerStatus::Ready,
            Stage::Failed => ViewerStatus::Failed,
        }
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// ID of the asset handle currently shown, if it came from `set_asset`.
    pub fn asset_id(&self) -> Option<AssetId> {
        self.asset
    }

    /// The loaded scene snapshot, when ready.
    pub fn scene(&self) -> Option<Arc<SceneGraph>> {
        match &self.stage {
            Stage::Ready { scene, .. } => Some(Arc::clone(scene)),
            _ => None,
        }
    }

    pub fn transform(&self) -> Option<NormalizingTransform> {
        match &self.stage {
            Stage::Ready { transform, .. } => Some(*transform),
            _ => None,
        }
    }

    pub fn idle(&self) -> IdleMotion {
        self.idle
    }

    fn accept(&mut self, result: Result<SceneGraph, LoadError>) {
        let prepared = result.and_then(|scene| {
            let transform = normalize(&scene)?;
            Ok((scene, transform))
        });

        let (scene, transform) = match prepared {
            Ok(ready) => ready,
            Err(e) => return self.fail(e.to_string()),
        };

        match DisplayModel::bake(&scene) {
            Ok(model) => {
                info!(
                    "Viewer ready: '{}' scale {:.4} translation {}",
                    scene.name, transform.scale, transform.translation
                );
                self.stage = Stage::Ready {
                    scene: Arc::new(scene),
                    model,
                    transform,
                };
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn fail(&mut self, reason: String) {
        warn!("Viewer showing placeholder: {}", reason);
        self.has_error = true;
        self.last_error = Some(reason);
        self.stage = Stage::Failed;
    }

    fn reset_failure_domain(&mut self) {
        self.has_error = false;
        self.last_error = None;
    }

    fn placeholder_frame(&self, index: u64, time: f32) -> Frame {
        Frame::fixed(index, time, FrameKind::Placeholder, Arc::clone(&self.error_mesh), Mat4::IDENTITY)
    }
}
