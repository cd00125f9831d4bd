//! Direct-API adapter (secondary backend).
//!
//! Talks to the generative API with key-in-query authentication and a single
//! configured model. This is the path used once fallback is sticky, and the
//! target of cost-triggered reroutes. The wire format only carries the output
//! cap and temperature; the extra sampling knobs stay on the primary path.

use super::wire::{GenerateContentRequest, GenerateContentResponse, WireGenerationConfig};
use super::{BackendError, BackendKind, GeneratedContent, GenerationParams, GenerativeBackend};
use crate::config::GeminiConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Adapter for the direct generative API.
#[derive(Debug)]
pub struct GeminiAdapter {
    url: String,
    model: String,
    client: Client,
    timeout: Duration,
}

impl GeminiAdapter {
    /// Construct the adapter. Requires an API key in the configuration
    /// (populated from `GEMINI_API_KEY` / `GOOGLE_API_KEY`).
    pub fn from_config(
        config: &GeminiConfig,
        client: Client,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        if !config.enabled {
            return Err(BackendError::Configuration(
                "direct API is disabled".to_string(),
            ));
        }
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                BackendError::Configuration(
                    "no API key found (GEMINI_API_KEY or GOOGLE_API_KEY)".to_string(),
                )
            })?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            config.base_url, config.model, api_key
        );

        tracing::info!(model = %config.model, "direct API adapter initialized");

        Ok(Self {
            url,
            model: config.model.clone(),
            client,
            timeout,
        })
    }
}

#[async_trait]
impl GenerativeBackend for GeminiAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Secondary
    }

    async fn generate_content(
        &self,
        _model_class: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedContent, BackendError> {
        let request = GenerateContentRequest::single_turn(
            prompt,
            WireGenerationConfig {
                temperature: Some(params.temperature),
                max_output_tokens: Some(params.max_output_tokens),
                top_p: None,
                top_k: None,
            },
        );

        tracing::debug!(
            backend = "secondary",
            model = %self.model,
            "dispatching generateContent"
        );

        let timeout_secs = self.timeout.as_secs();
        let response = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(timeout_secs)
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            tracing::info!(
                backend = "secondary",
                model = %self.model,
                status = %status,
                "generateContent failed"
            );
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("failed to parse API response: {}", e))
        })?;

        Ok(GeneratedContent {
            text: body.text(),
            model: self.model.clone(),
        })
    }
}
