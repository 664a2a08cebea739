use reqwest::Client;
use tracing::debug;

use crate::config::InferenceConfig;
use crate::error::IntegrationError;
use crate::types::{GenerateRequest, GenerateResponse};

/// API client for the text-generation endpoint
pub struct InferenceApi {
    client: Client,
    config: InferenceConfig,
}

impl InferenceApi {
    pub fn new(client: Client, config: InferenceConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Send `prompt` and return the reply text.
    ///
    /// A body that is not a recognizable generation envelope is returned
    /// verbatim; interpreting it is the caller's job.
    pub async fn generate(&self, prompt: &str) -> Result<String, IntegrationError> {
        let key = self.config.api_key().ok_or(IntegrationError::MissingCredentials)?;
        let url = self.config.generate_url();
        let request = GenerateRequest::from_prompt(prompt, &self.config);

        let response = self.client
            .post(&url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IntegrationError::ServerError {
                status: status.as_u16(),
                message: text,
            });
        }

        let body = response.text().await?;
        match serde_json::from_str::<GenerateResponse>(&body).ok().and_then(|r| r.text()) {
            Some(text) => Ok(text),
            None => {
                debug!("Unrecognized response envelope ({} bytes), passing body through", body.len());
                Ok(body)
            }
        }
    }
}
