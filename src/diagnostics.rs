//! In-memory rollups for directory calls.
//!
//! Each operation keeps a fixed-size ring of recent latencies next to plain
//! counters for budget overruns, failures and stale responses. Nothing is
//! persisted; a session's figures die with it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

const MAX_SAMPLES_PER_OPERATION: usize = 256;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRollup {
    pub operation: String,
    pub sample_count: usize,
    pub p50_ms: u128,
    pub p95_ms: u128,
    pub max_ms: u128,
    pub budget_ms: u128,
    pub budget_violations: u64,
    pub failures: u64,
    pub stale_discarded: u64,
    pub last_recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub operations: Vec<OperationRollup>,
}

/// Ring of the most recent latencies; `next` is the slot overwritten once full.
#[derive(Debug, Default)]
struct LatencyRing {
    samples: Vec<u128>,
    next: usize,
}

impl LatencyRing {
    fn push(&mut self, elapsed_ms: u128) {
        if self.samples.len() < MAX_SAMPLES_PER_OPERATION {
            self.samples.push(elapsed_ms);
        } else {
            self.samples[self.next] = elapsed_ms;
        }
        self.next = (self.next + 1) % MAX_SAMPLES_PER_OPERATION;
    }

    fn sorted(&self) -> Vec<u128> {
        let mut values = self.samples.clone();
        values.sort_unstable();
        values
    }
}

#[derive(Debug, Default)]
struct OperationStats {
    latencies: LatencyRing,
    budget_ms: u128,
    budget_violations: u64,
    failures: u64,
    stale_discarded: u64,
    last_recorded_at: Option<DateTime<Utc>>,
}

impl OperationStats {
    fn rollup(&self, operation: &str) -> OperationRollup {
        let sorted = self.latencies.sorted();
        OperationRollup {
            operation: operation.to_string(),
            sample_count: sorted.len(),
            p50_ms: nearest_rank(&sorted, 50),
            p95_ms: nearest_rank(&sorted, 95),
            max_ms: sorted.last().copied().unwrap_or_default(),
            budget_ms: self.budget_ms,
            budget_violations: self.budget_violations,
            failures: self.failures,
            stale_discarded: self.stale_discarded,
            last_recorded_at: self.last_recorded_at,
        }
    }
}

/// Per-session recorder, keyed by operation name.
#[derive(Debug, Default)]
pub struct CallDiagnostics {
    operations: Mutex<BTreeMap<String, OperationStats>>,
}

impl CallDiagnostics {
    pub fn record_call(&self, operation: &str, elapsed_ms: u128, budget_ms: u128, ok: bool) {
        let mut operations = self.operations.lock();
        let stats = operations.entry(operation.to_string()).or_default();
        stats.latencies.push(elapsed_ms);
        stats.budget_ms = budget_ms;
        stats.budget_violations += u64::from(elapsed_ms > budget_ms);
        stats.failures += u64::from(!ok);
        stats.last_recorded_at = Some(Utc::now());
    }

    pub fn record_stale(&self, operation: &str) {
        let mut operations = self.operations.lock();
        let stats = operations.entry(operation.to_string()).or_default();
        stats.stale_discarded += 1;
        if stats.last_recorded_at.is_none() {
            stats.last_recorded_at = Some(Utc::now());
        }
    }

    /// Rollups ordered by operation name.
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let operations = self
            .operations
            .lock()
            .iter()
            .map(|(name, stats)| stats.rollup(name))
            .collect();
        DiagnosticsSnapshot {
            generated_at: Utc::now(),
            operations,
        }
    }
}

/// Nearest-rank percentile of an ascending slice; 0 when empty.
fn nearest_rank(sorted: &[u128], pct: usize) -> u128 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rollup<'a>(snapshot: &'a DiagnosticsSnapshot, op: &str) -> &'a OperationRollup {
        snapshot
            .operations
            .iter()
            .find(|o| o.operation == op)
            .expect("rollup")
    }

    #[test]
    fn test_nearest_rank() {
        assert_eq!(nearest_rank(&[], 95), 0);
        assert_eq!(nearest_rank(&[7], 50), 7);
        let values: Vec<u128> = (1..=20).collect();
        assert_eq!(nearest_rank(&values, 50), 10);
        assert_eq!(nearest_rank(&values, 95), 19);
        assert_eq!(nearest_rank(&values, 100), 20);
    }

    #[test]
    fn test_ring_keeps_most_recent_samples() {
        let diag = CallDiagnostics::default();
        for ms in 1..=300 {
            diag.record_call("get_users", ms, 100, true);
        }
        let snapshot = diag.snapshot();
        let r = rollup(&snapshot, "get_users");
        assert_eq!(r.sample_count, MAX_SAMPLES_PER_OPERATION);
        assert_eq!(r.max_ms, 300);
        // Samples 1..=44 were overwritten, leaving 45..=300.
        assert_eq!(r.p50_ms, 172);
        assert_eq!(r.budget_violations, 200);
    }

    #[test]
    fn test_failures_and_stale_counts() {
        let diag = CallDiagnostics::default();
        diag.record_call("get_org_tree", 10, 100, false);
        diag.record_call("get_org_tree", 12, 100, true);
        diag.record_stale("get_org_tree");
        diag.record_stale("get_users");

        let snapshot = diag.snapshot();
        let names: Vec<&str> = snapshot.operations.iter().map(|o| o.operation.as_str()).collect();
        assert_eq!(names, vec!["get_org_tree", "get_users"]);
        let tree = rollup(&snapshot, "get_org_tree");
        assert_eq!(tree.failures, 1);
        assert_eq!(tree.stale_discarded, 1);
        assert_eq!(tree.sample_count, 2);
        let users = rollup(&snapshot, "get_users");
        assert_eq!(users.sample_count, 0);
        assert_eq!(users.p95_ms, 0);
        assert_eq!(users.stale_discarded, 1);
        assert!(users.last_recorded_at.is_some());
    }
}
