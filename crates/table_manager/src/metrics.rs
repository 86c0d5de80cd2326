//! Counters and a histogram for the table manager's steady-state behavior.
//! Registered with `prometheus`'s default registry, via the `LazyLock`
//! statics idiom wrapped by the `register_*!` macros at first use.

use std::sync::LazyLock;

use prometheus::{
    register_histogram_vec,
    register_int_counter_vec,
    HistogramVec,
    IntCounterVec,
};

static BULK_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "search_sync_bulk_requests_total",
        "Bulk requests issued against the search cluster, by outcome",
        &["outcome"],
    )
    .expect("metric registration should not conflict")
});

static RECONCILE_RUNS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "search_sync_reconcile_runs_total",
        "Reconciliation runs, by outcome",
        &["outcome"],
    )
    .expect("metric registration should not conflict")
});

static WATCHER_RECONNECTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "search_sync_watcher_reconnects_total",
        "Change-stream reconnect attempts, by model",
        &["model"],
    )
    .expect("metric registration should not conflict")
});

static BACKFILL_CHUNK_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "search_sync_backfill_chunk_duration_seconds",
        "Time to build and post one backfill chunk, by model",
        &["model"],
    )
    .expect("metric registration should not conflict")
});

pub fn record_bulk_request(outcome: &str) {
    BULK_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_reconcile_run(outcome: &str) {
    RECONCILE_RUNS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_watcher_reconnect(model: &str) {
    WATCHER_RECONNECTS_TOTAL.with_label_values(&[model]).inc();
}

pub fn observe_backfill_chunk_duration(model: &str, seconds: f64) {
    BACKFILL_CHUNK_DURATION_SECONDS.with_label_values(&[model]).observe(seconds);
}
