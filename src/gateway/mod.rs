//! Gateway orchestration.
//!
//! [`GatewayClient`] owns the backend selection state machine: it tries the
//! managed platform while `PrimaryActive`, flips to `FallbackActive` on the
//! first primary failure (sticky until the next [`GatewayClient::initialize`]),
//! and diverts individual calls to the secondary backend when the daily cost
//! ceiling is hit without touching the mode. Every completed attempt lands in
//! the usage ledger.

pub mod blocking;
pub mod error;
pub mod health;

pub use blocking::{generate_blocking, DEFAULT_BLOCKING_TIMEOUT};
pub use error::GatewayError;
pub use health::{HealthMonitor, HealthReport, ProbeOutcome};

use crate::backend::{
    BackendKind, GeminiAdapter, GeneratedContent, GenerationParams, GenerativeBackend,
    VertexAdapter,
};
use crate::budget::{check_budget, estimate_tokens, BudgetVerdict, RejectReason};
use crate::catalog::ModelCatalog;
use crate::config::GatewayConfig;
use crate::ledger::{UsageLedger, UsageRecord, UsageStats};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

const DEFAULT_MODEL_CLASS: &str = "fast";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Lifecycle state of the gateway.
///
/// `PrimaryActive -> FallbackActive` is one-directional; only a fresh
/// `initialize()` can restore primary service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayMode {
    Uninitialized,
    PrimaryActive,
    FallbackActive,
    Unavailable,
}

/// One application-level generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Catalog class key; defaults to "fast".
    pub model_class: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model_class: DEFAULT_MODEL_CLASS.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: None,
            top_k: None,
        }
    }

    pub fn with_model_class(mut self, class: impl Into<String>) -> Self {
        self.model_class = class.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Successful generation outcome returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub text: String,
    /// Upstream model that served the call.
    pub model: String,
    pub model_class: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
    pub latency_seconds: f64,
    pub backend: BackendKind,
}

/// Read-only gateway status plus the ledger's stats view.
#[derive(Debug, Clone, Serialize)]
pub struct GatewaySnapshot {
    pub mode: GatewayMode,
    pub primary_configured: bool,
    pub secondary_configured: bool,
    pub usage: UsageStats,
}

struct GatewayState {
    mode: GatewayMode,
    ledger: UsageLedger,
    primary: Option<Arc<dyn GenerativeBackend>>,
    secondary: Option<Arc<dyn GenerativeBackend>>,
}

/// Client for governed text generation with automatic failover.
///
/// Construct one instance at startup and share it by reference; all mutable
/// state (mode, ledger, adapters) lives behind a single mutex, and the lock
/// is never held across a network call.
pub struct GatewayClient {
    config: GatewayConfig,
    catalog: ModelCatalog,
    http: Client,
    state: Mutex<GatewayState>,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_catalog(config, ModelCatalog::builtin())
    }

    pub fn with_catalog(config: GatewayConfig, catalog: ModelCatalog) -> Self {
        Self {
            config,
            catalog,
            http: Client::new(),
            state: Mutex::new(GatewayState {
                mode: GatewayMode::Uninitialized,
                ledger: UsageLedger::new(),
                primary: None,
                secondary: None,
            }),
        }
    }

    /// Set up the backends and pick the starting mode.
    ///
    /// Primary setup is attempted first; if it fails, the gateway starts
    /// directly in fallback. Re-invoking resets a sticky fallback.
    pub async fn initialize(&self) -> Result<(), GatewayError> {
        let timeout = Duration::from_secs(self.config.limits.request_timeout_seconds);

        let primary = match VertexAdapter::from_config(
            &self.config.vertex,
            &self.catalog,
            self.http.clone(),
            timeout,
        ) {
            Ok(adapter) => Some(Arc::new(adapter) as Arc<dyn GenerativeBackend>),
            Err(e) => {
                tracing::warn!(error = %e, "managed platform unavailable");
                None
            }
        };

        let secondary =
            match GeminiAdapter::from_config(&self.config.gemini, self.http.clone(), timeout) {
                Ok(adapter) => Some(Arc::new(adapter) as Arc<dyn GenerativeBackend>),
                Err(e) => {
                    tracing::warn!(error = %e, "direct API unavailable");
                    None
                }
            };

        let mode = if primary.is_some() {
            GatewayMode::PrimaryActive
        } else if secondary.is_some() {
            GatewayMode::FallbackActive
        } else {
            GatewayMode::Unavailable
        };

        {
            let mut state = self.state();
            state.primary = primary;
            state.secondary = secondary;
            state.mode = mode;
        }

        match mode {
            GatewayMode::Unavailable => {
                tracing::error!("no generative backend could be initialized");
                Err(GatewayError::NoBackendAvailable)
            }
            mode => {
                tracing::info!(?mode, "gateway initialized");
                Ok(())
            }
        }
    }

    /// Current lifecycle mode.
    pub fn mode(&self) -> GatewayMode {
        self.state().mode
    }

    /// Generate a reply, enforcing budgets and failing over as needed.
    pub async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerationResult, GatewayError> {
        if matches!(
            self.mode(),
            GatewayMode::Uninitialized | GatewayMode::Unavailable
        ) {
            // One re-initialize attempt; its error is reported below if the
            // gateway is still down.
            let _ = self.initialize().await;
            if matches!(
                self.mode(),
                GatewayMode::Uninitialized | GatewayMode::Unavailable
            ) {
                return Err(GatewayError::NoBackendAvailable);
            }
        }

        let estimated_tokens = estimate_tokens(&request.prompt) + request.max_tokens;

        // Lazy reset and evaluation happen atomically under the state lock.
        let (verdict, mode) = {
            let mut state = self.state();
            let verdict = check_budget(
                estimated_tokens,
                &request.model_class,
                &mut state.ledger,
                &self.config.limits,
                &self.catalog,
                Utc::now(),
            );
            (verdict, state.mode)
        };

        match verdict {
            BudgetVerdict::Allowed => {}
            BudgetVerdict::Rejected {
                reason: RejectReason::DailyCost,
                message,
            } if mode == GatewayMode::PrimaryActive => {
                // Cost-triggered reroute: per-call diversion to the cost-free
                // path. The mode stays PrimaryActive.
                tracing::warn!(%message, "cost ceiling reached, rerouting call to secondary");
                return self.generate_on_secondary(&request).await;
            }
            BudgetVerdict::Rejected { message, .. } => {
                tracing::warn!(%message, "request rejected by budget gate");
                return Err(GatewayError::BudgetExceeded(message));
            }
        }

        if mode == GatewayMode::PrimaryActive {
            let primary = self.state().primary.clone();
            if let Some(primary) = primary {
                match self.call_and_record(primary.as_ref(), &request).await {
                    Ok(result) => return Ok(result),
                    Err(e) => {
                        // Swallowed: the failure becomes a sticky mode flip
                        // plus a secondary attempt.
                        tracing::warn!(error = %e, "primary backend failed, switching to fallback");
                        self.state().mode = GatewayMode::FallbackActive;
                    }
                }
            }
        }

        self.generate_on_secondary(&request).await
    }

    /// Gateway status plus current usage stats. Triggers the ledger's lazy
    /// daily reset so a stale snapshot is never served.
    pub fn usage_stats(&self) -> GatewaySnapshot {
        let mut state = self.state();
        state.ledger.reset_if_stale(Utc::now());
        GatewaySnapshot {
            mode: state.mode,
            primary_configured: state.primary.is_some(),
            secondary_configured: state.secondary.is_some(),
            usage: state.ledger.snapshot(),
        }
    }

    async fn generate_on_secondary(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerationResult, GatewayError> {
        let secondary = self.state().secondary.clone();
        let Some(secondary) = secondary else {
            self.record_failed_attempt(BackendKind::Secondary);
            return Err(GatewayError::AllBackendsFailed {
                cause: "secondary backend not configured".to_string(),
            });
        };

        match self.call_and_record(secondary.as_ref(), request).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.record_failed_attempt(BackendKind::Secondary);
                tracing::error!(error = %e, "all backends failed");
                Err(GatewayError::AllBackendsFailed {
                    cause: e.to_string(),
                })
            }
        }
    }

    /// Run one backend call and, on success, account it in the ledger.
    /// Failures are returned unrecorded; the caller decides whether they are
    /// terminal.
    async fn call_and_record(
        &self,
        backend: &dyn GenerativeBackend,
        request: &GenerateRequest,
    ) -> Result<GenerationResult, crate::backend::BackendError> {
        let params = GenerationParams {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            top_k: request.top_k,
        };

        let start = Instant::now();
        let GeneratedContent { text, model } = backend
            .generate_content(&request.model_class, &request.prompt, &params)
            .await?;
        let latency_seconds = start.elapsed().as_secs_f64();

        let input_tokens = estimate_tokens(&request.prompt);
        let output_tokens = estimate_tokens(&text);
        // Real spend only accrues on the managed platform; the direct API is
        // treated as free tier.
        let cost_usd = match backend.kind() {
            BackendKind::Primary => {
                self.catalog
                    .estimate_cost(input_tokens, output_tokens, &request.model_class)
            }
            BackendKind::Secondary => 0.0,
        };

        {
            let mut state = self.state();
            state.ledger.record(UsageRecord {
                timestamp: Utc::now(),
                input_tokens,
                output_tokens,
                cost_usd,
                latency_seconds,
                backend: backend.kind(),
                success: true,
            });
        }

        tracing::info!(
            backend = %backend.kind(),
            model = %model,
            model_class = %request.model_class,
            latency_ms = (latency_seconds * 1000.0) as u64,
            input_tokens,
            output_tokens,
            "generation succeeded"
        );

        Ok(GenerationResult {
            text,
            model,
            model_class: request.model_class.clone(),
            input_tokens,
            output_tokens,
            cost_usd,
            latency_seconds,
            backend: backend.kind(),
        })
    }

    fn record_failed_attempt(&self, backend: BackendKind) {
        let mut state = self.state();
        state.ledger.record(UsageRecord::failed(backend));
    }

    pub(crate) fn primary(&self) -> Option<Arc<dyn GenerativeBackend>> {
        self.state().primary.clone()
    }

    pub(crate) fn secondary(&self) -> Option<Arc<dyn GenerativeBackend>> {
        self.state().secondary.clone()
    }

    // A poisoned lock only means another caller panicked mid-update; the
    // counters underneath remain usable.
    fn state(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
