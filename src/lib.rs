//! Relay - governed AI gateway client
//!
//! This library turns an application-level "generate a reply" request into a
//! governed call against one of two generative-AI backends: a managed
//! inference platform tried first, and a direct API used as fallback. It
//! enforces daily cost and per-request token budgets, keeps usage accounting,
//! probes backend health, and fails over without operator intervention.

pub mod backend;
pub mod budget;
pub mod catalog;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod logging;

pub use backend::BackendKind;
pub use catalog::{ModelCatalog, ModelProfile};
pub use config::{BudgetLimits, GatewayConfig};
pub use gateway::{
    generate_blocking, GatewayClient, GatewayError, GatewayMode, GenerateRequest,
    GenerationResult, HealthMonitor, HealthReport,
};
pub use ledger::{UsageRecord, UsageStats};
