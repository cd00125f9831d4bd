//! Pre-flight budget gate.
//!
//! Advisory checks run before any network call: the daily cost ceiling first,
//! then the per-request token ceiling. Actual cost is recomputed from the real
//! response afterward; that recomputed figure is what the ledger records.

use crate::catalog::ModelCatalog;
use crate::config::BudgetLimits;
use crate::ledger::UsageLedger;
use chrono::{DateTime, Utc};

/// Heuristic token estimate: ~1.3 tokens per whitespace-separated word.
///
/// Deterministic, no I/O. Deliberately not a real tokenizer; downstream
/// budget behavior assumes this heuristic.
pub fn estimate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    (words as f64 * 1.3).round() as u32
}

/// Which ceiling rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Projected spend would exceed the daily cost ceiling.
    DailyCost,
    /// Request alone exceeds the per-request token ceiling.
    TokenCeiling,
}

/// Verdict of the pre-flight gate.
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetVerdict {
    Allowed,
    Rejected {
        reason: RejectReason,
        message: String,
    },
}

impl BudgetVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, BudgetVerdict::Allowed)
    }
}

/// Decide whether a prospective request is allowed.
///
/// Triggers the ledger's lazy daily reset before evaluating, so a stale
/// ledger never rejects on yesterday's spend.
pub fn check_budget(
    estimated_tokens: u32,
    model_class: &str,
    ledger: &mut UsageLedger,
    limits: &BudgetLimits,
    catalog: &ModelCatalog,
    now: DateTime<Utc>,
) -> BudgetVerdict {
    ledger.reset_if_stale(now);

    let projected_cost = catalog.estimate_cost(estimated_tokens, 0, model_class);
    if ledger.daily_cost_usd() + projected_cost > limits.max_daily_cost_usd {
        return BudgetVerdict::Rejected {
            reason: RejectReason::DailyCost,
            message: format!(
                "daily cost ceiling reached (${:.2}/${:.2})",
                ledger.daily_cost_usd(),
                limits.max_daily_cost_usd
            ),
        };
    }

    if estimated_tokens > limits.max_tokens_per_request {
        return BudgetVerdict::Rejected {
            reason: RejectReason::TokenCeiling,
            message: format!(
                "request exceeds token ceiling ({}/{})",
                estimated_tokens, limits.max_tokens_per_request
            ),
        };
    }

    BudgetVerdict::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::ledger::UsageRecord;
    use chrono::Duration;

    fn limits() -> BudgetLimits {
        BudgetLimits::default()
    }

    #[test]
    fn test_estimate_tokens_heuristic() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("hello"), 1); // round(1.3)
        assert_eq!(estimate_tokens("one two three"), 4); // round(3.9)
        assert_eq!(estimate_tokens("a b c d e f g h i j"), 13); // round(13.0)
    }

    #[test]
    fn test_estimate_tokens_deterministic() {
        let prompt = "the quick brown fox jumps over the lazy dog";
        assert_eq!(estimate_tokens(prompt), estimate_tokens(prompt));
        assert_eq!(estimate_tokens(prompt), 12); // round(9 * 1.3)
    }

    #[test]
    fn test_allows_within_limits() {
        let mut ledger = UsageLedger::new();
        let verdict = check_budget(
            1000,
            "fast",
            &mut ledger,
            &limits(),
            &ModelCatalog::builtin(),
            Utc::now(),
        );
        assert!(verdict.is_allowed());
    }

    #[test]
    fn test_rejects_on_daily_cost_ceiling() {
        let mut ledger = UsageLedger::new();
        let mut limits = limits();
        limits.max_daily_cost_usd = 0.01;

        // Accrue spend right at the ceiling.
        ledger.record(UsageRecord {
            timestamp: Utc::now(),
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.01,
            latency_seconds: 0.0,
            backend: BackendKind::Primary,
            success: true,
        });

        let verdict = check_budget(
            1000,
            "fast",
            &mut ledger,
            &limits,
            &ModelCatalog::builtin(),
            Utc::now(),
        );
        match verdict {
            BudgetVerdict::Rejected { reason, message } => {
                assert_eq!(reason, RejectReason::DailyCost);
                assert!(message.contains("daily cost ceiling"));
            }
            BudgetVerdict::Allowed => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_rejects_on_token_ceiling() {
        let mut ledger = UsageLedger::new();
        let verdict = check_budget(
            9000,
            "fast",
            &mut ledger,
            &limits(),
            &ModelCatalog::builtin(),
            Utc::now(),
        );
        match verdict {
            BudgetVerdict::Rejected { reason, .. } => {
                assert_eq!(reason, RejectReason::TokenCeiling)
            }
            BudgetVerdict::Allowed => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_cost_ceiling_checked_before_token_ceiling() {
        let mut ledger = UsageLedger::new();
        let mut limits = limits();
        limits.max_daily_cost_usd = 0.000001;

        // Violates both ceilings; cost must win.
        let verdict = check_budget(
            9000,
            "pro",
            &mut ledger,
            &limits,
            &ModelCatalog::builtin(),
            Utc::now(),
        );
        match verdict {
            BudgetVerdict::Rejected { reason, .. } => assert_eq!(reason, RejectReason::DailyCost),
            BudgetVerdict::Allowed => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_idempotent_for_unchanged_ledger() {
        let mut ledger = UsageLedger::new();
        let catalog = ModelCatalog::builtin();
        let now = Utc::now();
        let first = check_budget(2000, "fast", &mut ledger, &limits(), &catalog, now);
        let second = check_budget(2000, "fast", &mut ledger, &limits(), &catalog, now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_triggers_lazy_daily_reset() {
        let mut ledger = UsageLedger::new();
        let mut limits = limits();
        limits.max_daily_cost_usd = 0.01;

        ledger.record(UsageRecord {
            timestamp: Utc::now(),
            input_tokens: 100,
            output_tokens: 100,
            cost_usd: 0.01,
            latency_seconds: 0.1,
            backend: BackendKind::Primary,
            success: true,
        });
        assert_eq!(ledger.request_count(), 1);

        // Evaluated 25h later: the stale counters reset before the check,
        // so yesterday's spend no longer rejects the request.
        let verdict = check_budget(
            1000,
            "fast",
            &mut ledger,
            &limits,
            &ModelCatalog::builtin(),
            Utc::now() + Duration::hours(25),
        );
        assert!(verdict.is_allowed());
        assert_eq!(ledger.request_count(), 0);
        assert_eq!(ledger.daily_cost_usd(), 0.0);
    }

    #[test]
    fn test_unknown_class_costs_nothing() {
        // Unknown model class estimates to zero cost, so only the token
        // ceiling can reject it.
        let mut ledger = UsageLedger::new();
        let mut limits = limits();
        limits.max_daily_cost_usd = 0.0000001;

        let verdict = check_budget(
            1000,
            "nonexistent",
            &mut ledger,
            &limits,
            &ModelCatalog::builtin(),
            Utc::now(),
        );
        assert!(verdict.is_allowed());
    }
}
