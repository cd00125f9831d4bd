//! Usage accounting shared across all requests.
//!
//! The ledger keeps daily counters (cost, requests, errors) plus a bounded
//! history of recent attempts. Counters reset lazily: staleness is checked at
//! the start of every budget evaluation, not on a timer.

use crate::backend::BackendKind;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Maximum retained history entries; oldest evicted first.
pub const HISTORY_CAPACITY: usize = 1000;

/// Window over which average latency is computed.
const RECENT_WINDOW: usize = 100;

const RESET_INTERVAL_HOURS: i64 = 24;

/// One completed attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
    pub latency_seconds: f64,
    pub backend: BackendKind,
    pub success: bool,
}

impl UsageRecord {
    /// Record for a failed attempt: zeroed cost and token fields, kept for audit.
    pub fn failed(backend: BackendKind) -> Self {
        Self {
            timestamp: Utc::now(),
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            latency_seconds: 0.0,
            backend,
            success: false,
        }
    }
}

/// Read-only view of current usage, for admin/metrics surfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    /// Requests since the last daily reset.
    pub requests: u64,
    /// Accrued cost in USD since the last daily reset, rounded to 4 places.
    pub cost_usd: f64,
    /// Failed requests since the last daily reset.
    pub errors: u64,
    /// Percentage of successful requests, rounded to 2 places.
    pub success_rate: f64,
    /// History entries inside the recent window.
    pub recent_requests: usize,
    /// Average latency over the recent window, rounded to 3 places.
    pub avg_latency_seconds: f64,
}

/// Mutable usage-accounting state.
///
/// Not internally synchronized; the gateway owns it behind a mutex.
#[derive(Debug)]
pub struct UsageLedger {
    daily_cost_usd: f64,
    request_count: u64,
    error_count: u64,
    last_reset: DateTime<Utc>,
    history: VecDeque<UsageRecord>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self {
            daily_cost_usd: 0.0,
            request_count: 0,
            error_count: 0,
            last_reset: Utc::now(),
            history: VecDeque::new(),
        }
    }

    /// Reset daily counters if more than 24h have elapsed since the last
    /// reset. Returns true if a reset happened. History is not cleared.
    pub fn reset_if_stale(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.last_reset > Duration::hours(RESET_INTERVAL_HOURS) {
            self.daily_cost_usd = 0.0;
            self.request_count = 0;
            self.error_count = 0;
            self.last_reset = now;
            tracing::info!("daily usage counters reset");
            true
        } else {
            false
        }
    }

    /// Account one completed attempt.
    pub fn record(&mut self, record: UsageRecord) {
        self.request_count += 1;
        if !record.success {
            self.error_count += 1;
        }
        self.daily_cost_usd += record.cost_usd;

        self.history.push_back(record);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
    }

    pub fn daily_cost_usd(&self) -> f64 {
        self.daily_cost_usd
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent record, if any.
    pub fn last_record(&self) -> Option<&UsageRecord> {
        self.history.back()
    }

    /// Current stats view.
    pub fn snapshot(&self) -> UsageStats {
        let successes = self.request_count - self.error_count;
        let success_rate = successes as f64 / self.request_count.max(1) as f64 * 100.0;

        let recent: Vec<&UsageRecord> = self.history.iter().rev().take(RECENT_WINDOW).collect();
        let avg_latency = if recent.is_empty() {
            0.0
        } else {
            recent.iter().map(|r| r.latency_seconds).sum::<f64>() / recent.len() as f64
        };

        UsageStats {
            requests: self.request_count,
            cost_usd: round_to(self.daily_cost_usd, 4),
            errors: self.error_count,
            success_rate: round_to(success_rate, 2),
            recent_requests: recent.len(),
            avg_latency_seconds: round_to(avg_latency, 3),
        }
    }
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
