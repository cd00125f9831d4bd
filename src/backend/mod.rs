//! Backend adapter seam.
//!
//! Exactly two backends exist: the managed platform ([`VertexAdapter`],
//! primary) and the direct API ([`GeminiAdapter`], secondary). Both implement
//! the single-capability [`GenerativeBackend`] trait, so the gateway holds a
//! current adapter reference and never branches on concrete type at call
//! sites.

pub mod error;
pub mod gemini;
pub mod vertex;

mod wire;

pub use error::BackendError;
pub use gemini::GeminiAdapter;
pub use vertex::VertexAdapter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two backends served an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Managed inference platform, tried first.
    Primary,
    /// Direct API, the fallback path.
    Secondary,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Primary => f.write_str("primary"),
            BackendKind::Secondary => f.write_str("secondary"),
        }
    }
}

/// Generation knobs forwarded to a backend.
///
/// Each adapter decides which knobs its wire format carries; the direct API
/// path only forwards `max_output_tokens` and `temperature`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

/// Text produced by one backend call.
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub text: String,
    /// Upstream model that actually served the call.
    pub model: String,
}

/// Unified interface for the two generative backends.
///
/// Object-safe; the gateway stores adapters as `Arc<dyn GenerativeBackend>`.
/// Dropping the future aborts the in-flight HTTP request.
#[async_trait]
pub trait GenerativeBackend: Send + Sync + 'static {
    /// Which side of the primary/secondary split this adapter is.
    fn kind(&self) -> BackendKind;

    /// Execute one text-generation call.
    ///
    /// `model_class` is a catalog class key (`fast`, `pro`, `basic`); the
    /// secondary backend serves its single configured model regardless.
    async fn generate_content(
        &self,
        model_class: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedContent, BackendError>;
}
