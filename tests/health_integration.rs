//! Health monitor behavior: fresh probes, per-backend failure capture, and
//! the no-network cache window.

mod common;

use common::{gateway_config, reply_body, GEMINI_PATH, VERTEX_PATH};
use mockito::Server;
use relay::config::HealthCheckConfig;
use relay::gateway::{GatewayClient, HealthMonitor, HealthReport};
use std::sync::Arc;

#[tokio::test]
async fn test_fresh_probe_then_cached_without_network() {
    let mut gemini = Server::new_async().await;
    // Exactly one probe call; the second health check must be served from
    // cache without touching the network.
    let mock = gemini
        .mock("POST", GEMINI_PATH)
        .with_status(200)
        .with_body(reply_body("pong"))
        .expect(1)
        .create_async()
        .await;

    let client = Arc::new(GatewayClient::new(gateway_config(None, Some(&gemini.url()))));
    client.initialize().await.unwrap();
    let monitor = HealthMonitor::new(client, HealthCheckConfig::default());

    let first = monitor.health_check().await;
    match &first {
        HealthReport::Fresh {
            primary,
            secondary,
            overall_healthy,
            ..
        } => {
            assert!(!primary.available);
            assert!(primary.error.is_none()); // unconfigured, not failing
            assert!(secondary.available);
            assert!(overall_healthy);
        }
        other => panic!("expected fresh report, got {other:?}"),
    }

    let second = monitor.health_check().await;
    assert_eq!(second, HealthReport::Cached { healthy: true });

    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_failure_is_captured_per_backend() {
    let mut vertex = Server::new_async().await;
    let mut gemini = Server::new_async().await;
    let _vertex_mock = vertex
        .mock("POST", VERTEX_PATH)
        .with_status(200)
        .with_body(reply_body("pong"))
        .create_async()
        .await;
    let _gemini_mock = gemini
        .mock("POST", GEMINI_PATH)
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let client = Arc::new(GatewayClient::new(gateway_config(
        Some(&vertex.url()),
        Some(&gemini.url()),
    )));
    client.initialize().await.unwrap();
    let monitor = HealthMonitor::new(client, HealthCheckConfig::default());

    // One side failing does not make the gateway unhealthy.
    let report = monitor.health_check().await;
    match report {
        HealthReport::Fresh {
            primary,
            secondary,
            overall_healthy,
            ..
        } => {
            assert!(primary.available);
            assert!(!secondary.available);
            assert!(secondary.error.unwrap().contains("503"));
            assert!(overall_healthy);
        }
        other => panic!("expected fresh report, got {other:?}"),
    }
}

#[tokio::test]
async fn test_all_probes_failing_caches_unhealthy() {
    let mut gemini = Server::new_async().await;
    let _gemini_mock = gemini
        .mock("POST", GEMINI_PATH)
        .with_status(500)
        .create_async()
        .await;

    let client = Arc::new(GatewayClient::new(gateway_config(None, Some(&gemini.url()))));
    client.initialize().await.unwrap();
    let monitor = HealthMonitor::new(client, HealthCheckConfig::default());

    let report = monitor.health_check().await;
    assert!(!report.healthy());

    let cached = monitor.health_check().await;
    assert_eq!(cached, HealthReport::Cached { healthy: false });
}
