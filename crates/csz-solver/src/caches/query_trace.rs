//! Structured query tracing for solver cache lookups.
//!
//! Events use target `csz::query_json` and are intended to be consumed with:
//! `CSZ_LOG=csz::query_json=trace CSZ_LOG_FORMAT=json`.
//!
//! Environment:
//! - `CSZ_QUERY_RUN_ID`: optional run identifier attached to every event.

use crate::types::TypeId;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, trace};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static QUERY_RUN_ID: OnceLock<String> = OnceLock::new();

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "csz::query_json", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

#[inline]
fn run_id() -> &'static str {
    QUERY_RUN_ID
        .get_or_init(|| std::env::var("CSZ_QUERY_RUN_ID").unwrap_or_else(|_| "default".to_string()))
        .as_str()
}

/// A query keyed by one type and an operation qualifier (protocol name, etc.).
#[inline]
pub(crate) fn query_start(query_id: u64, op: &'static str, input: TypeId, qualifier: &'static str) {
    trace!(
        target: "csz::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        input_type_id = input.0,
        qualifier
    );
}

#[inline]
pub(crate) fn query_end(query_id: u64, op: &'static str, outcome: &'static str, cache_hit: bool) {
    trace!(
        target: "csz::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        outcome,
        cache_hit
    );
}
