//! Managed-platform adapter (primary backend).
//!
//! Speaks the platform's `generateContent` endpoint under a project- and
//! region-scoped path, authenticating with a bearer token. One endpoint
//! handle is constructed per catalog entry at setup; setup fails only if no
//! handle can be constructed at all.

use super::wire::{GenerateContentRequest, GenerateContentResponse, WireGenerationConfig};
use super::{BackendError, BackendKind, GeneratedContent, GenerationParams, GenerativeBackend};
use crate::catalog::ModelCatalog;
use crate::config::VertexConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

// Platform defaults applied when the caller leaves the knobs unset.
const DEFAULT_TOP_P: f32 = 0.8;
const DEFAULT_TOP_K: u32 = 40;

#[derive(Debug)]
struct ModelHandle {
    url: String,
    display_name: String,
    max_output_tokens: u32,
}

/// Adapter for the managed inference platform.
#[derive(Debug)]
pub struct VertexAdapter {
    handles: HashMap<String, ModelHandle>,
    access_token: String,
    client: Client,
    timeout: Duration,
}

impl VertexAdapter {
    /// Construct the adapter, validating config and building one endpoint
    /// handle per catalog entry.
    pub fn from_config(
        config: &VertexConfig,
        catalog: &ModelCatalog,
        client: Client,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        if !config.enabled {
            return Err(BackendError::Configuration(
                "managed platform is disabled".to_string(),
            ));
        }
        let project_id = config
            .project_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                BackendError::Configuration("cloud project id is not configured".to_string())
            })?;
        let access_token = config
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BackendError::Configuration("platform access token is not configured".to_string())
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", config.location));

        let mut handles = HashMap::new();
        for class in catalog.classes() {
            let Some(profile) = catalog.get(class) else {
                continue;
            };
            if profile.display_name.is_empty() {
                tracing::warn!(model_class = %class, "skipping catalog entry without a model name");
                continue;
            }
            let url = format!(
                "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                base_url, project_id, config.location, profile.display_name
            );
            handles.insert(
                class.to_string(),
                ModelHandle {
                    url,
                    display_name: profile.display_name.clone(),
                    max_output_tokens: profile.max_output_tokens,
                },
            );
            tracing::debug!(model_class = %class, model = %profile.display_name, "platform model handle constructed");
        }

        if handles.is_empty() {
            return Err(BackendError::Configuration(
                "no platform model handle could be constructed".to_string(),
            ));
        }

        tracing::info!(
            project_id = %project_id,
            location = %config.location,
            model_count = handles.len(),
            "managed platform adapter initialized"
        );

        Ok(Self {
            handles,
            access_token: access_token.to_string(),
            client,
            timeout,
        })
    }
}

#[async_trait]
impl GenerativeBackend for VertexAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Primary
    }

    async fn generate_content(
        &self,
        model_class: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedContent, BackendError> {
        let handle = self
            .handles
            .get(model_class)
            .ok_or_else(|| BackendError::UnknownModel(model_class.to_string()))?;

        let request = GenerateContentRequest::single_turn(
            prompt,
            WireGenerationConfig {
                temperature: Some(params.temperature),
                max_output_tokens: Some(params.max_output_tokens.min(handle.max_output_tokens)),
                top_p: Some(params.top_p.unwrap_or(DEFAULT_TOP_P)),
                top_k: Some(params.top_k.unwrap_or(DEFAULT_TOP_K)),
            },
        );

        tracing::debug!(
            backend = "primary",
            model_class = %model_class,
            model = %handle.display_name,
            "dispatching generateContent"
        );

        let timeout_secs = self.timeout.as_secs();
        let response = self
            .client
            .post(&handle.url)
            .header("authorization", format!("Bearer {}", self.access_token))
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
                backend = "primary",
                model_class = %model_class,
                status = %status,
                "generateContent failed"
            );
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("failed to parse platform response: {}", e))
        })?;

        Ok(GeneratedContent {
            text: body.text(),
            model: handle.display_name.clone(),
        })
    }
}
