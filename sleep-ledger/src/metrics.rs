//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring a ledger session.
//!
//! # Metrics
//!
//! - `sleep_ledger_edits_total{operation,outcome}` - Edits processed
//! - `sleep_ledger_recompute_duration_seconds` - Edit + rebuild latency
//! - `sleep_ledger_total_events` - Events across active stages
//! - `sleep_ledger_total_sleep_hours` - Hours across active non-W stages
//! - `sleep_ledger_ahi` - Last defined AHI
//! - `sleep_ledger_ahi_defined` - 1 when the AHI is defined, else 0
//! - `sleep_ledger_errors` / `sleep_ledger_warnings` - Current alert counts

use crate::ledger::{Edit, EditOutcome};
use crate::view::DerivedView;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Edits processed, by operation and outcome
    pub edits_total: IntCounterVec,

    /// Edit + rebuild latency
    pub recompute_duration: Histogram,

    /// Events across active stages
    pub total_events: IntGauge,

    /// Sleep hours across active non-W stages
    pub total_sleep_hours: Gauge,

    /// Last defined AHI
    pub ahi: Gauge,

    /// AHI defined flag
    pub ahi_defined: IntGauge,

    /// Current error count
    pub errors: IntGauge,

    /// Current warning count
    pub warnings: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let edits_total = IntCounterVec::new(
            Opts::new("sleep_ledger_edits_total", "Edits processed"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(edits_total.clone()))?;

        let recompute_duration = Histogram::with_opts(
            HistogramOpts::new(
                "sleep_ledger_recompute_duration_seconds",
                "Edit and derived view rebuild latency",
            )
            .buckets(vec![0.000_001, 0.000_005, 0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001]),
        )?;
        registry.register(Box::new(recompute_duration.clone()))?;

        let total_events = IntGauge::new(
            "sleep_ledger_total_events",
            "Respiratory events across active stages",
        )?;
        registry.register(Box::new(total_events.clone()))?;

        let total_sleep_hours = Gauge::new(
            "sleep_ledger_total_sleep_hours",
            "Sleep hours across active non-W stages",
        )?;
        registry.register(Box::new(total_sleep_hours.clone()))?;

        let ahi = Gauge::new("sleep_ledger_ahi", "Last defined Apnea-Hypopnea Index")?;
        registry.register(Box::new(ahi.clone()))?;

        let ahi_defined = IntGauge::new("sleep_ledger_ahi_defined", "AHI is defined (0/1)")?;
        registry.register(Box::new(ahi_defined.clone()))?;

        let errors = IntGauge::new("sleep_ledger_errors", "Current validation errors")?;
        registry.register(Box::new(errors.clone()))?;

        let warnings = IntGauge::new("sleep_ledger_warnings", "Current warnings")?;
        registry.register(Box::new(warnings.clone()))?;

        Ok(Self {
            edits_total,
            recompute_duration,
            total_events,
            total_sleep_hours,
            ahi,
            ahi_defined,
            errors,
            warnings,
            registry,
        })
    }

    /// Record a processed edit
    pub fn record_edit(&self, edit: &Edit, outcome: EditOutcome) {
        let outcome = match outcome {
            EditOutcome::Applied => "applied",
            EditOutcome::IgnoredInactive => "ignored_inactive",
        };
        self.edits_total
            .with_label_values(&[edit.operation(), outcome])
            .inc();
    }

    /// Record edit + rebuild latency
    pub fn record_recompute(&self, duration_secs: f64) {
        self.recompute_duration.observe(duration_secs);
    }

    /// Mirror the derived view into gauges
    pub fn update_view(&self, view: &DerivedView) {
        self.total_events.set(i64::from(view.total_events));
        self.total_sleep_hours.set(view.total_duration);
        match view.ahi.and_then(|ahi| ahi.value().to_f64()) {
            Some(value) => {
                self.ahi.set(value);
                self.ahi_defined.set(1);
            }
            None => self.ahi_defined.set(0),
        }
        self.errors.set(view.errors.len() as i64);
        self.warnings.set(view.warnings.len() as i64);
    }

    /// Text exposition format
    pub fn gather_text(&self) -> crate::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::Error::Other(format!("Metrics output not UTF-8: {}", e)))
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("total_events", &self.total_events.get())
            .field("ahi_defined", &self.ahi_defined.get())
            .finish_non_exhaustive()
    }
}
