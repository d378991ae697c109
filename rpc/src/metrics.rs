//! Prometheus metrics for the check-in API.
//!
//! [`RpcMetrics`] owns a dedicated [`Registry`] that the `/metrics` endpoint
//! encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::RpcError;

pub struct RpcMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub code_checks: IntCounter,
    /// Code checks that matched an accepted window.
    pub code_checks_valid: IntCounter,
    pub gps_checks: IntCounter,
    pub receipt_checks: IntCounter,
    pub commits: IntCounter,
    /// Commits that turned a (user, venue) pair into a pass.
    pub checkins_passed: IntCounter,
    /// Error responses, by error code.
    pub errors: IntCounterVec,

    // ── Histograms ──────────────────────────────────────────────────────
    pub commit_duration_ms: Histogram,
}

impl RpcMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> Result<Self, RpcError> {
        let registry = Registry::new();

        let code_checks = register_int_counter_with_registry!(
            Opts::new("presence_code_checks_total", "Rotating code checks"),
            registry
        )?;
        let code_checks_valid = register_int_counter_with_registry!(
            Opts::new(
                "presence_code_checks_valid_total",
                "Rotating code checks that matched"
            ),
            registry
        )?;
        let gps_checks = register_int_counter_with_registry!(
            Opts::new("presence_gps_checks_total", "Location checks"),
            registry
        )?;
        let receipt_checks = register_int_counter_with_registry!(
            Opts::new("presence_receipt_checks_total", "Receipt checks"),
            registry
        )?;
        let commits = register_int_counter_with_registry!(
            Opts::new("presence_commits_total", "Check-in commits"),
            registry
        )?;
        let checkins_passed = register_int_counter_with_registry!(
            Opts::new(
                "presence_checkins_passed_total",
                "Check-ins that reached the pass threshold"
            ),
            registry
        )?;
        let errors = register_int_counter_vec_with_registry!(
            Opts::new("presence_errors_total", "Error responses by code"),
            &["code"],
            registry
        )?;

        // 0.5 ms → ~8 s
        let commit_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new("presence_commit_duration_ms", "Commit latency in milliseconds")
                .buckets(prometheus::exponential_buckets(0.5, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            code_checks,
            code_checks_valid,
            gps_checks,
            receipt_checks,
            commits,
            checkins_passed,
            errors,
            commit_duration_ms,
        })
    }

    pub fn record_error(&self, err: &RpcError) {
        self.errors.with_label_values(&[err.code().as_str()]).inc();
    }

    /// Render every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, RpcError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| RpcError::Server(e.to_string()))
    }
}
