//! Prometheus metrics for the effect-generation pipeline.
//!
//! ## Usage
//!
//! Call [`init_metrics`] once at process startup **before** serving requests.
//! The helper functions (`record_stage_latency`, `inc_module_decision`, …)
//! are no-ops if `init_metrics` was never called, so the pipeline is always
//! safe to run — observability simply degrades gracefully. Recording never
//! propagates failures back to callers.
//!
//! ## Metrics Exposed
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `effect_requests_total` | Counter | `stage` |
//! | `effect_errors_total` | Counter | `stage`, `err_type` |
//! | `effect_stage_duration_seconds` | Histogram | `stage` |
//! | `effect_module_decisions_total` | Counter | `module` |
//! | `effect_empty_selections_total` | Counter | — |
//! | `effect_fallbacks_total` | Counter | — |

use crate::EffectError;
use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

// ── Internal metrics bundle ────────────────────────────────────────────────

/// All Prometheus metrics for the pipeline, bundled together so they can be
/// stored in a single [`OnceLock`] and initialised atomically.
pub struct Metrics {
    /// Prometheus registry that owns all metric descriptors.
    pub registry: Registry,
    /// Total requests processed per stage.
    pub requests_total: CounterVec,
    /// Errors by stage and error type.
    pub errors_total: CounterVec,
    /// Stage processing latency histogram.
    pub stage_duration: HistogramVec,
    /// Module decisions returned by the selector, per module.
    pub module_decisions: CounterVec,
    /// Selection calls that returned no decisions.
    pub empty_selections: Counter,
    /// Requests where the pipeline fell back to the default module.
    pub fallbacks: Counter,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

// ── Initialisation ─────────────────────────────────────────────────────────

/// Initialise all Prometheus metrics and register them with a private
/// registry.
///
/// Must be called once at process startup before requests are served.
/// Calling it a second time is a no-op (returns `Ok(())`).
///
/// # Errors
///
/// Returns [`EffectError::Other`] if metric construction or registry
/// registration fails (e.g., duplicate descriptor names).
///
/// # Panics
///
/// This function never panics.
pub fn init_metrics() -> Result<(), EffectError> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = CounterVec::new(
        Opts::new("effect_requests_total", "Total requests processed"),
        &["stage"],
    )
    .map_err(|e| EffectError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(requests_total.clone()))
        .map_err(|e| EffectError::Other(format!("metrics registration failed: {e}")))?;

    let errors_total = CounterVec::new(
        Opts::new("effect_errors_total", "Errors by stage and type"),
        &["stage", "err_type"],
    )
    .map_err(|e| EffectError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(errors_total.clone()))
        .map_err(|e| EffectError::Other(format!("metrics registration failed: {e}")))?;

    let stage_duration = HistogramVec::new(
        HistogramOpts::new(
            "effect_stage_duration_seconds",
            "Processing duration per stage",
        ),
        &["stage"],
    )
    .map_err(|e| EffectError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(stage_duration.clone()))
        .map_err(|e| EffectError::Other(format!("metrics registration failed: {e}")))?;

    let module_decisions = CounterVec::new(
        Opts::new(
            "effect_module_decisions_total",
            "Selector decisions per module",
        ),
        &["module"],
    )
    .map_err(|e| EffectError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(module_decisions.clone()))
        .map_err(|e| EffectError::Other(format!("metrics registration failed: {e}")))?;

    let empty_selections = Counter::new(
        "effect_empty_selections_total",
        "Selection calls returning no decisions",
    )
    .map_err(|e| EffectError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(empty_selections.clone()))
        .map_err(|e| EffectError::Other(format!("metrics registration failed: {e}")))?;

    let fallbacks = Counter::new(
        "effect_fallbacks_total",
        "Requests served by the default-module fallback",
    )
    .map_err(|e| EffectError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(fallbacks.clone()))
        .map_err(|e| EffectError::Other(format!("metrics registration failed: {e}")))?;

    // If another thread raced us, the first one wins — both initializations
    // produce identical metric descriptors, so neither outcome is incorrect.
    let _ = METRICS.set(Metrics {
        registry,
        requests_total,
        errors_total,
        stage_duration,
        module_decisions,
        empty_selections,
        fallbacks,
    });

    Ok(())
}

/// Return a reference to the initialised [`Metrics`], or `None` if
/// [`init_metrics`] has not been called yet.
fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

// ── Public helper functions ────────────────────────────────────────────────

/// Record the processing latency for a pipeline stage.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn record_stage_latency(stage: &str, d: Duration) {
    if let Some(m) = metrics() {
        if let Ok(h) = m.stage_duration.get_metric_with_label_values(&[stage]) {
            h.observe(d.as_secs_f64());
        }
    }
}

/// Increment the request counter for a pipeline stage.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_request(stage: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.requests_total.get_metric_with_label_values(&[stage]) {
            c.inc();
        }
    }
}

/// Increment the error counter for a pipeline stage and error type.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_error(stage: &str, err_type: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m
            .errors_total
            .get_metric_with_label_values(&[stage, err_type])
        {
            c.inc();
        }
    }
}

/// Count one selector decision for a module.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_module_decision(module: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.module_decisions.get_metric_with_label_values(&[module]) {
            c.inc();
        }
    }
}

/// Count one selection call that returned no decisions.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_empty_selection() {
    if let Some(m) = metrics() {
        m.empty_selections.inc();
    }
}

/// Count one request served by the default-module fallback.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_fallback() {
    if let Some(m) = metrics() {
        m.fallbacks.inc();
    }
}

/// Gather all registered metrics as a raw list of metric families.
///
/// Returns an empty `Vec` if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    metrics().map_or_else(Vec::new, |m| m.registry.gather())
}

/// Gather and encode all metrics in the Prometheus text exposition format.
///
/// Returns an empty string if metrics have not been initialised or if
/// encoding fails. Observability degrades gracefully rather than panicking.
///
/// # Panics
///
/// This function never panics.
pub fn gather_metrics() -> String {
    let families = gather();
    if families.is_empty() {
        return String::new();
    }
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// A structured snapshot of key metric counters, used by the health endpoint.
#[derive(Debug, Default)]
pub struct MetricsSummary {
    /// Total request counts keyed by stage label.
    pub requests_total: HashMap<String, u64>,
    /// Selector decision counts keyed by module label.
    pub module_decisions: HashMap<String, u64>,
    /// Number of requests served by the fallback module.
    pub fallbacks: u64,
}

/// Return a structured summary of current metric counter values.
///
/// Returns a zeroed [`MetricsSummary`] if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn get_metrics_summary() -> MetricsSummary {
    let Some(m) = metrics() else {
        return MetricsSummary::default();
    };

    let mut summary = MetricsSummary {
        fallbacks: m.fallbacks.get() as u64,
        ..MetricsSummary::default()
    };

    for family in m.requests_total.collect() {
        for metric in family.get_metric() {
            let stage = metric
                .get_label()
                .iter()
                .find(|l| l.get_name() == "stage")
                .map_or("unknown", |l| l.get_value());
            let value = metric.get_counter().get_value() as u64;
            summary.requests_total.insert(stage.to_string(), value);
        }
    }

    for family in m.module_decisions.collect() {
        for metric in family.get_metric() {
            let module = metric
                .get_label()
                .iter()
                .find(|l| l.get_name() == "module")
                .map_or("unknown", |l| l.get_value());
            let value = metric.get_counter().get_value() as u64;
            summary.module_decisions.insert(module.to_string(), value);
        }
    }

    summary
}
