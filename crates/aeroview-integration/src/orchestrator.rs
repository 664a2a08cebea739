//! Analysis state machine
//!
//! `Idle -> Analyzing -> Complete | Failed`, one cycle per uploaded asset.
//! Every cycle is identified by a [`Ticket`]; replies carrying a ticket that
//! is no longer current are dropped without touching state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::{fallback_result, parse_analysis};
use crate::client::{IntegrationClient, PendingRequest};
use crate::error::{IntegrationError, OrchestratorError};
use crate::types::{AnalysisRequest, AnalysisResult};

/// Message shown when the request could not be completed
pub const FAILURE_MESSAGE: &str = "Analysis failed. Please try again.";

/// What happens to an upload that arrives while a cycle is in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReuploadPolicy {
    /// Start a new cycle; the old reply is ignored when it arrives
    #[default]
    Supersede,
    /// Refuse with [`OrchestratorError::Busy`]
    Reject,
}

/// Where a published result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Inference,
    Fallback,
}

/// Details of a failed cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisFailure {
    pub user_message: String,
    pub status: Option<u16>,
    pub detail: String,
    pub retryable: bool,
}

impl AnalysisFailure {
    fn from_error(err: &IntegrationError) -> Self {
        Self {
            user_message: FAILURE_MESSAGE.to_string(),
            status: err.status(),
            detail: err.to_string(),
            retryable: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisState {
    #[default]
    Idle,
    Analyzing,
    Complete {
        result: AnalysisResult,
        source: ResultSource,
        completed_at: DateTime<Utc>,
    },
    Failed(AnalysisFailure),
}

impl AnalysisState {
    /// The published result; only `Complete` has one.
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisState::Complete { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self, AnalysisState::Analyzing)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "idle",
            AnalysisState::Analyzing => "analyzing",
            AnalysisState::Complete { .. } => "complete",
            AnalysisState::Failed(_) => "failed",
        }
    }
}

/// Identifies one analysis cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct InFlight {
    ticket: Ticket,
    descriptor: String,
    pending: Option<PendingRequest<String>>,
}

/// Drives one request/response cycle per upload.
pub struct AnalysisOrchestrator {
    state: AnalysisState,
    policy: ReuploadPolicy,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl Default for AnalysisOrchestrator {
    fn default() -> Self {
        Self::new(ReuploadPolicy::default())
    }
}

impl AnalysisOrchestrator {
    pub fn new(policy: ReuploadPolicy) -> Self {
        Self {
            state: AnalysisState::Idle,
            policy,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn policy(&self) -> ReuploadPolicy {
        self.policy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Enter `Analyzing` for `request`, clearing any previous result.
    ///
    /// The returned ticket must accompany the reply passed to
    /// [`complete`](Self::complete).
    pub fn begin(&mut self, request: &AnalysisRequest) -> Result<Ticket, OrchestratorError> {
        if self.state.is_analyzing() {
            match self.policy {
                ReuploadPolicy::Reject => {
                    debug!("Rejecting upload of '{}': analysis in progress", request.asset_descriptor);
                    return Err(OrchestratorError::Busy);
                }
                ReuploadPolicy::Supersede => {
                    info!("Superseding analysis generation {}", self.generation);
                }
            }
        }

        self.generation += 1;
        let ticket = Ticket { generation: self.generation };
        self.in_flight = Some(InFlight {
            ticket,
            descriptor: request.asset_descriptor.clone(),
            pending: None,
        });
        self.state = AnalysisState::Analyzing;
        info!("Analyzing '{}' (generation {})", request.asset_descriptor, ticket.generation);
        Ok(ticket)
    }

    /// Begin a cycle and send its request through `client`.
    pub fn submit(
        &mut self,
        client: &IntegrationClient,
        request: &AnalysisRequest,
    ) -> Result<Ticket, OrchestratorError> {
        let ticket = self.begin(request)?;
        self.attach(ticket, client.request_analysis(request));
        Ok(ticket)
    }

    /// Associate a reply handle with the cycle `ticket` started.
    /// Returns `false` (and drops the handle) if the ticket is stale.
    pub fn attach(&mut self, ticket: Ticket, pending: PendingRequest<String>) -> bool {
        match self.in_flight.as_mut() {
            Some(flight) if flight.ticket == ticket => {
                flight.pending = Some(pending);
                true
            }
            _ => false,
        }
    }

    /// Check the attached reply handle. Returns `true` if the state changed.
    pub fn poll(&mut self) -> bool {
        let polled = self
            .in_flight
            .as_ref()
            .and_then(|flight| Some((flight.ticket, flight.pending.as_ref()?.try_recv()?)));

        match polled {
            Some((ticket, reply)) => self.complete(ticket, reply),
            None => false,
        }
    }

    /// Apply the outcome of the cycle `ticket` started.
    ///
    /// Transport errors end in `Failed`. Any reply text ends in `Complete`:
    /// parsed when it holds a valid result, synthesized otherwise. Returns
    /// `false` without changing state when `ticket` has been superseded or
    /// dismissed.
    pub fn complete(&mut self, ticket: Ticket, reply: Result<String, IntegrationError>) -> bool {
        let descriptor = match &self.in_flight {
            Some(flight) if flight.ticket == ticket => flight.descriptor.clone(),
            _ => {
                debug!("Dropping reply for stale generation {}", ticket.generation);
                return false;
            }
        };
        self.in_flight = None;

        self.state = match reply {
            Ok(text) => {
                let (result, source) = match parse_analysis(&text) {
                    Ok(result) => (result, ResultSource::Inference),
                    Err(e) => {
                        warn!("Unusable analysis reply for '{}' ({}); using fallback", descriptor, e);
                        (fallback_result(&descriptor), ResultSource::Fallback)
                    }
                };
                info!(
                    "Analysis of '{}' complete: Cd {:.3} ({:?})",
                    descriptor,
                    result.drag_coefficient(),
                    source
                );
                AnalysisState::Complete {
                    result,
                    source,
                    completed_at: Utc::now(),
                }
            }
            Err(e) => {
                warn!("Analysis of '{}' failed: {}", descriptor, e);
                AnalysisState::Failed(AnalysisFailure::from_error(&e))
            }
        };
        true
    }

    /// Return to `Idle`, dropping interest in any in-flight cycle.
    pub fn dismiss(&mut self) {
        if self.in_flight.take().is_some() {
            // Outstanding tickets must not match any later cycle.
            self.generation += 1;
        }
        self.state = AnalysisState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve_once;
    use crate::types::Impact;

    const REPLY: &str = r#"{"dragCoefficient": 0.28, "improvements": [{"area": "Diffuser", "impact": "High", "description": "Extend", "reduction": "0.01"}]}"#;

    fn request(name: &str) -> AnalysisRequest {
        AnalysisRequest::new(name)
    }

    #[test]
    fn test_begin_clears_previous_result() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        orch.complete(t, Ok(REPLY.into()));
        assert!(orch.state().result().is_some());

        orch.begin(&request("b.glb")).unwrap();
        assert_eq!(orch.state(), &AnalysisState::Analyzing);
        assert!(orch.state().result().is_none());
    }

    #[test]
    fn test_valid_reply_completes_from_inference() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        assert!(orch.complete(t, Ok(REPLY.into())));

        match orch.state() {
            AnalysisState::Complete { result, source, .. } => {
                assert_eq!(*source, ResultSource::Inference);
                assert_eq!(result.drag_coefficient(), 0.28);
                assert_eq!(result.improvements()[0].area, "Diffuser");
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_prose_reply_completes_with_fallback() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("sedan.glb")).unwrap();
        orch.complete(t, Ok("I cannot analyze this".into()));

        match orch.state() {
            AnalysisState::Complete { result, source, .. } => {
                assert_eq!(*source, ResultSource::Fallback);
                assert_eq!(result.improvements().len(), 4);
                let drag = result.drag_coefficient();
                assert!((0.30..=0.45).contains(&drag));
                let impacts: Vec<Impact> = result.improvements().iter().map(|i| i.impact).collect();
                assert_eq!(impacts, vec![Impact::High, Impact::Medium, Impact::Low, Impact::Medium]);
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_reply_completes_with_fallback() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        orch.complete(t, Ok(r#"{"dragCoefficient": 3.0, "improvements": []}"#.into()));
        assert!(matches!(
            orch.state(),
            AnalysisState::Complete { source: ResultSource::Fallback, .. }
        ));
    }

    #[test]
    fn test_server_error_fails_without_result() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        orch.complete(
            t,
            Err(IntegrationError::ServerError { status: 500, message: "Internal".into() }),
        );

        match orch.state() {
            AnalysisState::Failed(failure) => {
                assert_eq!(failure.status, Some(500));
                assert_eq!(failure.user_message, FAILURE_MESSAGE);
                assert!(failure.detail.contains("Internal"));
                assert!(failure.retryable);
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(orch.state().result().is_none());
    }

    #[test]
    fn test_missing_credentials_fail() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        orch.complete(t, Err(IntegrationError::MissingCredentials));
        assert!(matches!(orch.state(), AnalysisState::Failed(f) if f.status.is_none()));
    }

    #[test]
    fn test_stale_reply_does_not_overwrite_newer_cycle() {
        let mut orch = AnalysisOrchestrator::default();
        let first = orch.begin(&request("first.glb")).unwrap();
        let second = orch.begin(&request("second.glb")).unwrap();
        assert_ne!(first, second);

        assert!(!orch.complete(first, Ok(REPLY.into())));
        assert_eq!(orch.state(), &AnalysisState::Analyzing);

        assert!(orch.complete(second, Err(IntegrationError::Timeout)));
        assert!(matches!(orch.state(), AnalysisState::Failed(_)));

        // Late arrival after the newer cycle finished.
        assert!(!orch.complete(first, Ok(REPLY.into())));
        assert!(matches!(orch.state(), AnalysisState::Failed(_)));
    }

    #[test]
    fn test_reject_policy_refuses_while_busy() {
        let mut orch = AnalysisOrchestrator::new(ReuploadPolicy::Reject);
        let t = orch.begin(&request("a.glb")).unwrap();
        assert_eq!(orch.begin(&request("b.glb")), Err(OrchestratorError::Busy));

        orch.complete(t, Ok(REPLY.into()));
        assert!(orch.begin(&request("b.glb")).is_ok());
    }

    #[test]
    fn test_dismiss_returns_to_idle_and_drops_reply() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        orch.dismiss();
        assert_eq!(orch.state(), &AnalysisState::Idle);
        assert!(!orch.complete(t, Ok(REPLY.into())));
        assert_eq!(orch.state(), &AnalysisState::Idle);
    }

    #[test]
    fn test_poll_applies_attached_reply() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        let (tx, pending) = PendingRequest::channel();
        assert!(orch.attach(t, pending));

        assert!(!orch.poll());
        assert!(orch.state().is_analyzing());

        tx.send(Ok(REPLY.to_string())).unwrap();
        assert!(orch.poll());
        assert_eq!(orch.state().name(), "complete");
        assert!(!orch.poll());
    }

    #[test]
    fn test_poll_never_leaves_cycle_stuck_on_dropped_worker() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        let (tx, pending) = PendingRequest::<String>::channel();
        orch.attach(t, pending);
        drop(tx);

        assert!(orch.poll());
        assert!(matches!(orch.state(), AnalysisState::Failed(_)));
    }

    #[test]
    fn test_stale_ticket_cannot_attach() {
        let mut orch = AnalysisOrchestrator::default();
        let old = orch.begin(&request("a.glb")).unwrap();
        orch.begin(&request("b.glb")).unwrap();
        let (_tx, pending) = PendingRequest::<String>::channel();
        assert!(!orch.attach(old, pending));
    }

    fn client_for(endpoint: String) -> IntegrationClient {
        let config = crate::InferenceConfig {
            endpoint,
            ..Default::default()
        };
        IntegrationClient::new(config.with_api_key("test-key")).unwrap()
    }

    fn poll_until_settled(orch: &mut AnalysisOrchestrator) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while orch.state().is_analyzing() {
            assert!(std::time::Instant::now() < deadline, "analysis never settled");
            orch.poll();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    #[test]
    fn test_http_500_ends_in_failed() {
        let (url, server) = serve_once("500 Internal Server Error", "text/plain", "quota exceeded");
        let client = client_for(url);
        let mut orch = AnalysisOrchestrator::default();

        orch.submit(&client, &request("sedan.glb")).unwrap();
        poll_until_settled(&mut orch);
        server.join().unwrap();

        match orch.state() {
            AnalysisState::Failed(failure) => {
                assert_eq!(failure.status, Some(500));
                assert!(failure.detail.contains("quota exceeded"));
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(orch.state().result().is_none());
    }

    #[test]
    fn test_http_prose_reply_ends_in_fallback() {
        let (url, server) = serve_once("200 OK", "text/plain", "I cannot analyze this");
        let client = client_for(url);
        let mut orch = AnalysisOrchestrator::default();

        orch.submit(&client, &request("sedan.glb")).unwrap();
        poll_until_settled(&mut orch);
        server.join().unwrap();

        match orch.state() {
            AnalysisState::Complete { result, source, .. } => {
                assert_eq!(*source, ResultSource::Fallback);
                assert_eq!(result, &fallback_result("sedan.glb"));
                assert_eq!(result.improvements().len(), 4);
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(client.is_online());
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let mut orch = AnalysisOrchestrator::default();
        let t = orch.begin(&request("a.glb")).unwrap();
        orch.complete(t, Ok(REPLY.into()));
        let json = serde_json::to_value(orch.state()).unwrap();
        assert_eq!(json["state"], "complete");
        assert_eq!(json["source"], "inference");
        assert_eq!(json["result"]["dragCoefficient"], 0.28);
    }
}
