//! Upload-driven composition of the viewer and the analysis cycle
//!
//! One upload feeds both components. They then progress independently:
//! either may finish first, and a failure in one never blocks the other.

use std::path::Path;

use aeroview_assets::HandleRegistry;
use aeroview_core::ClockConfig;
use aeroview_integration::{
    AnalysisOrchestrator, AnalysisRequest, AnalysisState, DragRating, IntegrationClient,
    OrchestratorError,
};
use aeroview_render::{AssetViewer, Frame, FrameSummary, IdleMotion, ViewerStatus};
use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::settings::Settings;
use crate::upload;

/// What became of a selected file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Loading and analysis have started
    Accepted,
    /// Not a 3D scene file; nothing changed
    Ignored,
    /// An analysis is in flight and re-uploads are refused; nothing changed
    Rejected,
}

/// Read-only snapshot for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct PresentationView {
    pub is_dark_mode: bool,
    pub asset: Option<String>,
    pub viewer: ViewerStatus,
    pub viewer_error: Option<String>,
    pub frame: Option<FrameSummary>,
    pub analysis: AnalysisState,
    pub drag_rating: Option<DragRating>,
    pub results_visible: bool,
}

pub struct Dashboard {
    handles: HandleRegistry,
    viewer: AssetViewer,
    analysis: AnalysisOrchestrator,
    client: IntegrationClient,
    dark_mode: bool,
    last_frame: Option<FrameSummary>,
}

impl Dashboard {
    pub fn new(settings: &Settings, client: IntegrationClient) -> Self {
        let idle = IdleMotion::new(settings.viewer.idle_amplitude, settings.viewer.idle_frequency);
        let clock = ClockConfig {
            max_delta_time: settings.viewer.max_delta_time,
            ..Default::default()
        };

        Self {
            handles: HandleRegistry::new(),
            viewer: AssetViewer::new(idle, clock),
            analysis: AnalysisOrchestrator::new(settings.analysis.reupload_policy),
            client,
            dark_mode: settings.display.dark_mode,
            last_frame: None,
        }
    }

    /// Accept a selected file: replace the live handle, start loading it for
    /// display, and start its analysis.
    pub fn upload(&mut self, path: &Path) -> Result<UploadOutcome> {
        let Some(handle) = upload::read_asset(path)? else {
            return Ok(UploadOutcome::Ignored);
        };

        let request = AnalysisRequest::new(handle.name());
        let ticket = match self.analysis.begin(&request) {
            Ok(ticket) => ticket,
            Err(OrchestratorError::Busy) => {
                info!("Upload of '{}' refused: analysis in progress", handle.name());
                return Ok(UploadOutcome::Rejected);
            }
        };

        self.handles.replace(handle.clone());
        self.viewer.set_asset(handle);
        self.analysis.attach(ticket, self.client.request_analysis(&request));
        Ok(UploadOutcome::Accepted)
    }

    /// Advance both components by `delta` seconds and render a frame.
    pub fn tick(&mut self, delta: f32) -> Frame {
        self.analysis.poll();
        let frame = self.viewer.render(delta);
        self.last_frame = Some(frame.summary());
        frame
    }

    /// Neither the viewer nor the analysis has work outstanding.
    pub fn is_settled(&self) -> bool {
        self.viewer.status() != ViewerStatus::Loading && !self.analysis.state().is_analyzing()
    }

    /// The results panel shows only a published result.
    pub fn results_visible(&self) -> bool {
        self.analysis.state().result().is_some()
    }

    pub fn analysis(&self) -> &AnalysisState {
        self.analysis.state()
    }

    pub fn viewer(&self) -> &AssetViewer {
        &self.viewer
    }

    pub fn presentation(&self) -> PresentationView {
        PresentationView {
            is_dark_mode: self.dark_mode,
            asset: self.handles.current().map(|h| h.name().to_string()),
            viewer: self.viewer.status(),
            viewer_error: self.viewer.last_error().map(str::to_string),
            frame: self.last_frame.clone(),
            analysis: self.analysis.state().clone(),
            drag_rating: self.analysis.state().result().map(|r| r.rating()),
            results_visible: self.results_visible(),
        }
    }
}
