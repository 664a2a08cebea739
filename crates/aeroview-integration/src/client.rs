use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use reqwest::Client;
use tracing::error;

use crate::config::InferenceConfig;
use crate::error::IntegrationError;
use crate::inference::InferenceApi;
use crate::types::AnalysisRequest;

/// A non-blocking handle to an in-flight async request.
/// Call `try_recv()` each frame to check for results without blocking the UI loop.
pub struct PendingRequest<T> {
    receiver: mpsc::Receiver<Result<T, IntegrationError>>,
}

impl<T> PendingRequest<T> {
    /// Non-blocking check for the result. Returns `None` if still pending.
    ///
    /// A worker that went away without answering is reported as a network
    /// error so callers never wait on it forever.
    pub fn try_recv(&self) -> Option<Result<T, IntegrationError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                Some(Err(IntegrationError::Network("Channel closed".into())))
            }
        }
    }

    /// Blocking wait for the result.
    pub fn wait(self) -> Result<T, IntegrationError> {
        self.receiver.recv().map_err(|_| IntegrationError::Network("Channel closed".into()))?
    }

    /// A pending request fed by the returned sender.
    pub fn channel() -> (mpsc::Sender<Result<T, IntegrationError>>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { receiver: rx })
    }
}

/// Facade for the inference service.
/// Owns a background tokio runtime and dispatches async work via channels.
pub struct IntegrationClient {
    runtime: tokio::runtime::Runtime,
    inference: Arc<InferenceApi>,
    online: Arc<AtomicBool>,
}

impl IntegrationClient {
    /// Create a client with a background tokio runtime.
    pub fn new(config: InferenceConfig) -> Result<Self, IntegrationError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("aeroview-net")
            .enable_all()
            .build()
            .map_err(|e| IntegrationError::Network(format!("Failed to create runtime: {}", e)))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| IntegrationError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            runtime,
            inference: Arc::new(InferenceApi::new(client, config)),
            online: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Ask for an aerodynamic assessment of the described asset.
    /// Resolves to the raw reply text.
    pub fn request_analysis(&self, request: &AnalysisRequest) -> PendingRequest<String> {
        self.send_prompt(request.prompt())
    }

    /// Send an arbitrary prompt to the generation endpoint.
    pub fn send_prompt(&self, prompt: String) -> PendingRequest<String> {
        let (tx, pending) = PendingRequest::channel();
        let api = Arc::clone(&self.inference);
        let online = Arc::clone(&self.online);

        self.runtime.spawn(async move {
            let result = api.generate(&prompt).await;
            match &result {
                Ok(_) | Err(IntegrationError::ServerError { .. }) => online.store(true, Ordering::Relaxed),
                Err(IntegrationError::Offline) | Err(IntegrationError::Timeout) => {
                    online.store(false, Ordering::Relaxed)
                }
                _ => {}
            }
            if let Err(e) = &result {
                error!("Inference request failed: {}", e);
            }
            let _ = tx.send(result);
        });

        pending
    }

    /// Whether the service appears to be reachable (based on the last request).
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &InferenceConfig {
        self.inference.config()
    }
}
