//! Model catalog for the managed platform.
//!
//! Static table of model profiles keyed by model class (`fast`, `pro`,
//! `basic`), with per-million-token pricing and output caps. Loaded once at
//! startup and never mutated; pricing must be manually updated when the
//! provider changes rates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Profile of one model class offered on the primary backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Class key callers select by (e.g., "fast").
    pub id: String,
    /// Upstream model identifier the class maps to.
    pub display_name: String,
    /// Combined input+output cost in USD per one million tokens.
    pub cost_per_1m_tokens: f64,
    /// Hard cap on output tokens for this class.
    pub max_output_tokens: u32,
    /// Workloads this class is suited for.
    pub recommended_uses: Vec<String>,
}

/// Immutable catalog of model profiles, shared across the gateway.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    profiles: Arc<HashMap<String, ModelProfile>>,
}

impl ModelCatalog {
    /// The built-in catalog for the managed platform.
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();

        profiles.insert(
            "fast".to_string(),
            ModelProfile {
                id: "fast".to_string(),
                display_name: "gemini-flash-latest".to_string(),
                cost_per_1m_tokens: 0.50,
                max_output_tokens: 8192,
                recommended_uses: vec![
                    "chat".to_string(),
                    "summarization".to_string(),
                    "classification".to_string(),
                ],
            },
        );
        profiles.insert(
            "pro".to_string(),
            ModelProfile {
                id: "pro".to_string(),
                display_name: "gemini-flash-latest".to_string(),
                cost_per_1m_tokens: 3.50,
                max_output_tokens: 8192,
                recommended_uses: vec![
                    "data analysis".to_string(),
                    "complex reasoning".to_string(),
                    "code generation".to_string(),
                ],
            },
        );
        profiles.insert(
            "basic".to_string(),
            ModelProfile {
                id: "basic".to_string(),
                display_name: "gemini-flash-latest".to_string(),
                cost_per_1m_tokens: 0.25,
                max_output_tokens: 2048,
                recommended_uses: vec!["basic chat".to_string(), "simple q&a".to_string()],
            },
        );

        Self {
            profiles: Arc::new(profiles),
        }
    }

    /// Build a catalog from explicit profiles (mainly for tests).
    pub fn from_profiles(profiles: Vec<ModelProfile>) -> Self {
        Self {
            profiles: Arc::new(profiles.into_iter().map(|p| (p.id.clone(), p)).collect()),
        }
    }

    /// Get the profile for a model class.
    pub fn get(&self, class: &str) -> Option<&ModelProfile> {
        self.profiles.get(class)
    }

    /// Check whether a model class exists in the catalog.
    pub fn has_class(&self, class: &str) -> bool {
        self.profiles.contains_key(class)
    }

    /// All class keys in the catalog.
    pub fn classes(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Estimate request cost in USD from token counts.
    ///
    /// Returns 0.0 for unknown model classes; the condition is logged as a
    /// warning, not surfaced as an error.
    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, class: &str) -> f64 {
        match self.profiles.get(class) {
            Some(profile) => {
                let total = (input_tokens + output_tokens) as f64;
                (total / 1_000_000.0) * profile.cost_per_1m_tokens
            }
            None => {
                tracing::warn!(model_class = %class, "cost estimate requested for unknown model class");
                0.0
            }
        }
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
