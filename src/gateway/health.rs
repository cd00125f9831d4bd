//! Cached, time-boxed health probing layered onto the gateway.
//!
//! A probe is one minimal generation call per configured adapter, failures
//! caught independently. Results are cached: repeat checks inside the
//! configured window return the last verdict without any network I/O.

use super::GatewayClient;
use crate::backend::{GenerationParams, GenerativeBackend};
use crate::config::HealthCheckConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

const PROBE_PROMPT: &str = "ping";
const PROBE_MODEL_CLASS: &str = "basic";
const PROBE_PARAMS: GenerationParams = GenerationParams {
    max_output_tokens: 10,
    temperature: 0.1,
    top_p: None,
    top_k: None,
};

/// Outcome of probing one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeOutcome {
    fn unconfigured() -> Self {
        Self {
            available: false,
            error: None,
        }
    }
}

/// Health check result returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthReport {
    /// Served from cache; no probe was performed.
    Cached { healthy: bool },
    /// Fresh probe with per-backend detail.
    Fresh {
        timestamp: DateTime<Utc>,
        primary: ProbeOutcome,
        secondary: ProbeOutcome,
        overall_healthy: bool,
    },
}

impl HealthReport {
    pub fn healthy(&self) -> bool {
        match self {
            HealthReport::Cached { healthy } => *healthy,
            HealthReport::Fresh {
                overall_healthy, ..
            } => *overall_healthy,
        }
    }
}

struct MonitorState {
    last_check: Option<Instant>,
    last_healthy: bool,
}

/// Cached health probe over the gateway's adapters.
pub struct HealthMonitor {
    client: Arc<GatewayClient>,
    config: HealthCheckConfig,
    state: Mutex<MonitorState>,
}

impl HealthMonitor {
    pub fn new(client: Arc<GatewayClient>, config: HealthCheckConfig) -> Self {
        Self {
            client,
            config,
            state: Mutex::new(MonitorState {
                last_check: None,
                last_healthy: false,
            }),
        }
    }

    /// Check backend health, serving from cache inside the probe window.
    pub async fn health_check(&self) -> HealthReport {
        let window = std::time::Duration::from_secs(self.config.interval_seconds);
        {
            let state = self.state();
            if let Some(last) = state.last_check {
                if last.elapsed() < window {
                    return HealthReport::Cached {
                        healthy: state.last_healthy,
                    };
                }
            }
        }

        // Probe with the lock released; each adapter's failure is captured
        // independently.
        let (primary, secondary) = tokio::join!(
            probe(self.client.primary()),
            probe(self.client.secondary())
        );
        let overall_healthy = primary.available || secondary.available;

        tracing::info!(
            primary_ok = primary.available,
            secondary_ok = secondary.available,
            "health probe completed"
        );

        {
            let mut state = self.state();
            state.last_check = Some(Instant::now());
            state.last_healthy = overall_healthy;
        }

        HealthReport::Fresh {
            timestamp: Utc::now(),
            primary,
            secondary,
            overall_healthy,
        }
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn probe(adapter: Option<Arc<dyn GenerativeBackend>>) -> ProbeOutcome {
    let Some(adapter) = adapter else {
        return ProbeOutcome::unconfigured();
    };
    match adapter
        .generate_content(PROBE_MODEL_CLASS, PROBE_PROMPT, &PROBE_PARAMS)
        .await
    {
        Ok(_) => ProbeOutcome {
            available: true,
            error: None,
        },
        Err(e) => {
            tracing::warn!(backend = %adapter.kind(), error = %e, "health probe failed");
            ProbeOutcome {
                available: false,
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serialization_tags() {
        let cached = HealthReport::Cached { healthy: true };
        let json = serde_json::to_value(&cached).unwrap();
        assert_eq!(json["status"], "cached");
        assert_eq!(json["healthy"], true);

        let fresh = HealthReport::Fresh {
            timestamp: Utc::now(),
            primary: ProbeOutcome {
                available: true,
                error: None,
            },
            secondary: ProbeOutcome {
                available: false,
                error: Some("boom".to_string()),
            },
            overall_healthy: true,
        };
        let json = serde_json::to_value(&fresh).unwrap();
        assert_eq!(json["status"], "fresh");
        assert_eq!(json["primary"]["available"], true);
        assert_eq!(json["secondary"]["error"], "boom");
        assert!(fresh.healthy());
    }
}
