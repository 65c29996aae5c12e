//! Shared handler utilities
//!
//! Pagination bounds and metrics helpers used across handlers. Centralizing
//! these keeps list endpoints and latency metrics consistent.

use std::time::Instant;

use serde::Deserialize;

/// Default page size for list endpoints
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Hard cap on client-requested page size
const MAX_PAGE_SIZE: i64 = 100;

/// Pagination query parameters shared by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Clamp client-supplied pagination to sane bounds.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "api_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}
