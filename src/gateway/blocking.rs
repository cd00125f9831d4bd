//! Blocking bridge for callers that cannot suspend.
//!
//! Runs one gateway call to completion on a dedicated worker thread hosting
//! a single-use current-thread runtime, bounded by a hard deadline. The
//! calling thread blocks only on that worker, never on a shared runtime.
//! An in-flight backend request is dropped at the deadline but may continue
//! server-side.

use super::{GatewayClient, GatewayError, GenerateRequest, GenerationResult};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default hard deadline for a blocking call.
pub const DEFAULT_BLOCKING_TIMEOUT: Duration = Duration::from_secs(120);

/// Execute one generation call synchronously.
///
/// The deadline covers the whole call, including any re-initialize and
/// fallback attempts inside `generate`.
pub fn generate_blocking(
    client: Arc<GatewayClient>,
    request: GenerateRequest,
    timeout: Duration,
) -> Result<GenerationResult, GatewayError> {
    let (tx, rx) = mpsc::channel();

    let worker = thread::Builder::new()
        .name("relay-blocking".to_string())
        .spawn(move || {
            let outcome = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(async {
                    match tokio::time::timeout(timeout, client.generate(request)).await {
                        Ok(result) => result,
                        Err(_) => Err(GatewayError::Timeout(timeout)),
                    }
                }),
                Err(e) => Err(GatewayError::Configuration(format!(
                    "failed to start blocking runtime: {e}"
                ))),
            };
            // The receiver may have given up; nothing to do then.
            let _ = tx.send(outcome);
        })
        .map_err(|e| {
            GatewayError::Configuration(format!("failed to spawn blocking worker: {e}"))
        })?;

    // The worker always sends: the deadline resolves the call either way. A
    // recv error therefore means the worker panicked.
    let outcome = rx.recv().unwrap_or_else(|_| {
        Err(GatewayError::Configuration(
            "blocking worker terminated unexpectedly".to_string(),
        ))
    });
    let _ = worker.join();
    outcome
}
