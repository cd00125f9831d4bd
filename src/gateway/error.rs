//! Error types surfaced by the gateway.

use std::time::Duration;
use thiserror::Error;

/// Errors the gateway surfaces to callers.
///
/// Intermediate failures are folded away: a primary-backend failure becomes a
/// mode transition plus a secondary attempt, never an error of its own. The
/// caller only ever sees the terminal outcome.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Neither backend could be initialized or re-initialized.
    #[error("no backend available")]
    NoBackendAvailable,

    /// The pre-flight budget gate rejected the request.
    #[error("request rejected: {0}")]
    BudgetExceeded(String),

    /// Every eligible backend failed; carries the last cause.
    #[error("all backends failed: {cause}")]
    AllBackendsFailed { cause: String },

    /// The blocking wrapper's hard deadline elapsed.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// Gateway-level configuration problem.
    #[error("configuration error: {0}")]
    Configuration(String),
}
