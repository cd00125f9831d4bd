//! Shared test utilities for gateway integration tests.
//!
//! Provides config builders wiring the gateway at mock HTTP backends, plus
//! canned `generateContent` response bodies.

#![allow(dead_code)]

use relay::config::GatewayConfig;

/// Endpoint the primary adapter resolves for every built-in model class
/// (all classes map to the same upstream model).
pub const VERTEX_PATH: &str =
    "/v1/projects/test-project/locations/us-central1/publishers/google/models/gemini-flash-latest:generateContent";

/// Endpoint the secondary adapter calls, key included.
pub const GEMINI_PATH: &str = "/v1beta/models/gemini-flash-latest:generateContent?key=test-key";

/// Gateway config pointing each backend at a mock server URL; `None` leaves
/// that backend unconfigured.
pub fn gateway_config(vertex_url: Option<&str>, gemini_url: Option<&str>) -> GatewayConfig {
    let mut config = GatewayConfig::default();

    match vertex_url {
        Some(url) => {
            config.vertex.project_id = Some("test-project".to_string());
            config.vertex.access_token = Some("test-token".to_string());
            config.vertex.base_url = Some(url.to_string());
        }
        None => config.vertex.enabled = false,
    }

    match gemini_url {
        Some(url) => {
            config.gemini.api_key = Some("test-key".to_string());
            config.gemini.base_url = url.to_string();
        }
        None => config.gemini.enabled = false,
    }

    config
}

/// A successful `generateContent` body carrying one text part.
pub fn reply_body(text: &str) -> String {
    format!(
        r#"{{"candidates":[{{"content":{{"role":"model","parts":[{{"text":"{text}"}}]}}}}]}}"#
    )
}
