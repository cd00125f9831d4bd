//! Configuration for the gateway client.
//!
//! Layered loading: defaults, then an optional TOML file, then environment
//! variable overrides. Credentials are only ever read from the environment,
//! never written back out.
//!
//! # Example
//!
//! ```rust
//! use relay::config::GatewayConfig;
//!
//! let config = GatewayConfig::default();
//! assert_eq!(config.limits.max_daily_cost_usd, 50.0);
//!
//! let toml = r#"
//! [limits]
//! max_daily_cost_usd = 10.0
//! "#;
//! let config: GatewayConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.limits.max_daily_cost_usd, 10.0);
//! ```

pub mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Unified configuration for the gateway client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Primary backend: managed inference platform.
    pub vertex: VertexConfig,
    /// Secondary backend: direct generative API.
    pub gemini: GeminiConfig,
    /// Budget ceilings enforced before each request.
    pub limits: BudgetLimits,
    /// Health probe configuration.
    pub health: HealthCheckConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Credentials and project identity always come from the environment.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(project) = std::env::var("GOOGLE_CLOUD_PROJECT_ID") {
            if !project.is_empty() {
                self.vertex.project_id = Some(project);
            }
        }
        if let Ok(location) = std::env::var("GOOGLE_CLOUD_LOCATION") {
            if !location.is_empty() {
                self.vertex.location = location;
            }
        }
        if let Ok(token) = std::env::var("VERTEX_ACCESS_TOKEN") {
            if !token.is_empty() {
                self.vertex.access_token = Some(token);
            }
        }
        if let Ok(enabled) = std::env::var("VERTEX_AI_ENABLED") {
            self.vertex.enabled = enabled.to_lowercase() == "true";
        }

        // GEMINI_API_KEY takes precedence over the legacy GOOGLE_API_KEY.
        let key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());
        if key.is_some() {
            self.gemini.api_key = key;
        }

        if let Ok(cost) = std::env::var("GATEWAY_MAX_DAILY_COST") {
            if let Ok(c) = cost.parse() {
                self.limits.max_daily_cost_usd = c;
            }
        }

        if let Ok(level) = std::env::var("RELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("RELAY_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_daily_cost_usd <= 0.0 {
            return Err(ConfigError::Validation {
                field: "limits.max_daily_cost_usd".to_string(),
                message: "daily cost ceiling must be positive".to_string(),
            });
        }
        if self.limits.max_tokens_per_request == 0 {
            return Err(ConfigError::Validation {
                field: "limits.max_tokens_per_request".to_string(),
                message: "token ceiling must be non-zero".to_string(),
            });
        }
        if self.limits.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "limits.request_timeout_seconds".to_string(),
                message: "request timeout must be non-zero".to_string(),
            });
        }
        if self.health.interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "health.interval_seconds".to_string(),
                message: "probe cache interval must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Primary backend configuration (managed inference platform).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexConfig {
    pub enabled: bool,
    /// Cloud project the platform endpoint is scoped to.
    pub project_id: Option<String>,
    /// Platform region (part of the endpoint hostname and path).
    pub location: String,
    /// Bearer token for platform authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Endpoint override, mainly for tests. Defaults to the regional host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            project_id: None,
            location: "us-central1".to_string(),
            access_token: None,
            base_url: None,
        }
    }
}

/// Secondary backend configuration (direct generative API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub enabled: bool,
    /// API key for query-parameter authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model served on the fallback path.
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: "gemini-flash-latest".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

/// Usage ceilings protecting against traffic spikes and unexpected cost.
///
/// Immutable after startup. The pre-flight gate enforces the cost and token
/// ceilings; the per-minute and per-day request ceilings are carried for the
/// calling application to enforce at its own edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BudgetLimits {
    pub max_daily_cost_usd: f64,
    pub max_tokens_per_request: u32,
    pub requests_per_minute: u32,
    pub requests_per_day: u32,
    pub request_timeout_seconds: u64,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            max_daily_cost_usd: 50.0,
            max_tokens_per_request: 8192,
            requests_per_minute: 1000,
            requests_per_day: 50_000,
            request_timeout_seconds: 60,
        }
    }
}

/// Configuration for backend health probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Seconds a probe result stays cached before a fresh probe is allowed.
    pub interval_seconds: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Pretty-printed logs for humans
    #[default]
    Pretty,
    /// JSON logs for machine parsing
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert!(config.vertex.enabled);
        assert_eq!(config.vertex.location, "us-central1");
        assert!(config.vertex.project_id.is_none());
        assert_eq!(config.gemini.model, "gemini-flash-latest");
        assert_eq!(config.limits.max_daily_cost_usd, 50.0);
        assert_eq!(config.limits.max_tokens_per_request, 8192);
        assert_eq!(config.limits.requests_per_minute, 1000);
        assert_eq!(config.limits.requests_per_day, 50_000);
        assert_eq!(config.limits.request_timeout_seconds, 60);
        assert_eq!(config.health.interval_seconds, 300);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let err = GatewayConfig::load(Some(Path::new("/nonexistent/relay.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_none_returns_defaults() {
        let config = GatewayConfig::load(None).unwrap();
        assert_eq!(config.limits.max_daily_cost_usd, 50.0);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[vertex]
project_id = "demo-project"
location = "europe-west4"

[limits]
max_daily_cost_usd = 5.0
max_tokens_per_request = 4096

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.vertex.project_id.as_deref(), Some("demo-project"));
        assert_eq!(config.vertex.location, "europe-west4");
        assert_eq!(config.limits.max_daily_cost_usd, 5.0);
        assert_eq!(config.limits.max_tokens_per_request, 4096);
        // Unspecified sections keep defaults.
        assert_eq!(config.limits.request_timeout_seconds, 60);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "limits = \"not a table\"").unwrap();
        let err = GatewayConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_zero_ceilings() {
        let mut config = GatewayConfig::default();
        config.limits.max_daily_cost_usd = 0.0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.limits.max_tokens_per_request = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.limits.request_timeout_seconds = 0;
        assert!(config.validate().is_err());

        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("xml").is_err());
    }
}
