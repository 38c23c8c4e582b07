// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for search sessions.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter
//! (Prometheus, OTEL, etc.); without one every call is a no-op.
//!
//! # Metric Naming Convention
//! - `search_session_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: search, load_more, suggestions
//! - `status`: success, error, cache_hit, stale
//! - `kind`: network, server, unknown

use metrics::{counter, gauge, histogram};
use std::time::Duration;
use tokio::time::Instant;

/// Record the outcome of a backend-facing operation
pub fn record_operation(operation: &str, status: &str) {
    counter!(
        "search_session_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record backend round-trip latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "search_session_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a failure surfaced to the session error field
pub fn record_error(operation: &str, kind: &str) {
    counter!(
        "search_session_errors_total",
        "operation" => operation.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a completion discarded because a newer request was issued
pub fn record_stale_response(operation: &str) {
    counter!(
        "search_session_stale_responses_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a search refused because the term failed validation
pub fn record_validation_block() {
    counter!("search_session_validation_blocked_total").increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// RESULT CACHE
// ═══════════════════════════════════════════════════════════════════════════

/// Record a cache lookup (`hit`, `miss`, `expired`)
pub fn record_cache_lookup(result: &str) {
    counter!(
        "search_session_cache_lookups_total",
        "result" => result.to_string()
    )
    .increment(1);
}

/// Record capacity evictions
pub fn record_cache_eviction(count: usize) {
    counter!("search_session_cache_evictions_total").increment(count as u64);
}

/// Set current cache entry count
pub fn set_cache_entries(count: usize) {
    gauge!("search_session_cache_entries").set(count as f64);
}

// ═══════════════════════════════════════════════════════════════════════════
// URL SYNC / REALTIME
// ═══════════════════════════════════════════════════════════════════════════

/// Record a URL sync transfer (`import`, `export`, `malformed`)
pub fn record_url_sync(direction: &str) {
    counter!(
        "search_session_url_sync_total",
        "direction" => direction.to_string()
    )
    .increment(1);
}

/// Set realtime link status (0 = Disconnected, 1 = Connecting, 2 = Connected, 3 = Reconnecting)
pub fn set_realtime_status(status: u8) {
    gauge!("search_session_realtime_status").set(status as f64);
}

/// Record a push update received over the realtime link
pub fn record_realtime_update() {
    counter!("search_session_realtime_updates_total").increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// TIMING HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Latency timer that records on drop.
///
/// Uses the Tokio clock so paused-time tests observe deterministic durations.
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Time since the timer started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
