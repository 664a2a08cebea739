//! AeroView Integration - Inference client and analysis orchestration
//!
//! Sends one analysis request per uploaded asset, interprets the free-form
//! reply as an [`AnalysisResult`], and falls back to a synthetic result when
//! the reply cannot be trusted.

pub mod analysis;
pub mod client;
pub mod config;
pub mod error;
pub mod inference;
pub mod orchestrator;
pub mod types;

#[cfg(test)]
mod test_server;

pub use analysis::{fallback_result, parse_analysis};
pub use client::{IntegrationClient, PendingRequest};
pub use config::InferenceConfig;
pub use error::{IntegrationError, OrchestratorError, ParseError};
pub use orchestrator::{AnalysisFailure, AnalysisOrchestrator, AnalysisState, ReuploadPolicy, ResultSource, Ticket};
pub use types::*;
