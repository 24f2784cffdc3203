//! Derived view over the ledger
//!
//! Everything here is a pure function of the rows. The view is rebuilt from
//! scratch after every edit, so a warning or error can never outlive the
//! condition that raised it.
//!
//! # Aggregation
//!
//! - `total_events`: every counter of every active row
//! - `total_duration`: durations of active rows, excluding W
//! - `ahi`: `total_events / total_duration` to two decimals, only when both
//!   totals are positive. A missing AHI is blank, never zero.
//!
//! Intervals of different stages are summed as entered. Overlap and
//! chronology across stages are not checked.

use crate::types::{EventCounts, SleepStage, StageRow};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;

/// Message text for [`AlertKind::InsufficientSleepDuration`]
pub const INSUFFICIENT_SLEEP_MESSAGE: &str = "Please enter some time asleep (ie not W!)";

/// Message text for [`AlertKind::NoRespiratoryEvents`]
pub const NO_EVENTS_MESSAGE: &str = "Please enter at least one respiratory event";

/// What raised an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertKind {
    /// Active non-W stages add up to zero hours (warning)
    InsufficientSleepDuration,
    /// No events counted on any active stage (warning)
    NoRespiratoryEvents,
    /// End time not after start time on an active stage (error)
    InvertedInterval,
}

/// Warning or error shown to the clinician
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Cause
    pub kind: AlertKind,

    /// Stage the alert is attributed to (`None` for ledger-wide warnings)
    pub stage: Option<SleepStage>,

    /// Human-readable text
    pub message: String,
}

impl Alert {
    fn insufficient_sleep() -> Self {
        Self {
            kind: AlertKind::InsufficientSleepDuration,
            stage: None,
            message: INSUFFICIENT_SLEEP_MESSAGE.to_string(),
        }
    }

    fn no_events() -> Self {
        Self {
            kind: AlertKind::NoRespiratoryEvents,
            stage: None,
            message: NO_EVENTS_MESSAGE.to_string(),
        }
    }

    fn inverted_interval(stage: SleepStage) -> Self {
        Self {
            kind: AlertKind::InvertedInterval,
            stage: Some(stage),
            message: format!("End Time cannot be earlier than Start Time for stage {}", stage),
        }
    }

    /// Whether this alert is attributed to `stage`
    pub fn concerns(&self, stage: SleepStage) -> bool {
        self.stage == Some(stage)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Apnea-Hypopnea Index, events per hour of sleep, two decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Ahi(Decimal);

impl Ahi {
    /// Compute from totals; `None` unless both are positive
    pub fn compute(total_events: u32, total_hours: f64) -> Option<Self> {
        if total_events == 0 || total_hours <= 0.0 {
            return None;
        }
        // Round the exact binary value of the ratio, not its shortest decimal form
        let ratio = f64::from(total_events) / total_hours;
        Decimal::from_f64_retain(ratio)
            .map(|d| Self(d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)))
    }

    /// Exact rounded value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Severity band
    pub fn severity(&self) -> AhiSeverity {
        AhiSeverity::classify(self.0)
    }
}

impl fmt::Display for Ahi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Adult OSA severity bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AhiSeverity {
    /// AHI < 5
    Normal,
    /// 5 <= AHI < 15
    Mild,
    /// 15 <= AHI < 30
    Moderate,
    /// AHI >= 30
    Severe,
}

impl AhiSeverity {
    /// Classify an AHI value
    pub fn classify(ahi: Decimal) -> Self {
        if ahi < Decimal::from(5) {
            AhiSeverity::Normal
        } else if ahi < Decimal::from(15) {
            AhiSeverity::Mild
        } else if ahi < Decimal::from(30) {
            AhiSeverity::Moderate
        } else {
            AhiSeverity::Severe
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            AhiSeverity::Normal => "Normal",
            AhiSeverity::Mild => "Mild",
            AhiSeverity::Moderate => "Moderate",
            AhiSeverity::Severe => "Severe",
        }
    }
}

impl fmt::Display for AhiSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Read-only projection of the ledger for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    /// Events across active rows
    pub total_events: u32,

    /// Hours across active non-W rows
    pub total_duration: f64,

    /// AHI; serialized as `""` when undefined
    #[serde(serialize_with = "serialize_ahi")]
    pub ahi: Option<Ahi>,

    /// Advisory alerts (incomplete data)
    pub warnings: Vec<Alert>,

    /// Validation alerts (data the user must fix)
    pub errors: Vec<Alert>,

    /// Per-event-type totals across active rows
    pub event_totals: EventCounts,
}

fn serialize_ahi<S: Serializer>(ahi: &Option<Ahi>, serializer: S) -> Result<S::Ok, S::Error> {
    match ahi {
        Some(ahi) => serializer.serialize_str(&ahi.to_string()),
        None => serializer.serialize_str(""),
    }
}

impl DerivedView {
    /// Rebuild the view from the rows
    pub fn derive(rows: &[StageRow]) -> Self {
        let mut event_totals = EventCounts::new();
        let mut total_duration = 0.0;
        let mut errors = Vec::new();

        for row in rows.iter().filter(|row| row.active) {
            event_totals.add(&row.events);
            if row.stage.counts_as_sleep() {
                total_duration += row.duration;
            }
            if row.is_inverted() {
                errors.push(Alert::inverted_interval(row.stage));
            }
        }

        let total_events = event_totals.total();

        let mut warnings = Vec::new();
        if total_duration == 0.0 {
            warnings.push(Alert::insufficient_sleep());
        }
        if total_events == 0 {
            warnings.push(Alert::no_events());
        }

        Self {
            total_events,
            total_duration,
            ahi: Ahi::compute(total_events, total_duration),
            warnings,
            errors,
            event_totals,
        }
    }

    /// AHI text, empty when undefined
    pub fn ahi_display(&self) -> String {
        self.ahi.map(|ahi| ahi.to_string()).unwrap_or_default()
    }

    /// Severity band, when the AHI is defined
    pub fn severity(&self) -> Option<AhiSeverity> {
        self.ahi.map(|ahi| ahi.severity())
    }

    /// Apneas across active rows
    pub fn apnea_total(&self) -> u32 {
        self.event_totals.apneas()
    }

    /// Hypopneas across active rows
    pub fn hypopnea_total(&self) -> u32 {
        self.event_totals.hypopneas()
    }

    /// Whether a stage's time inputs should render in error state
    pub fn stage_has_error(&self, stage: SleepStage) -> bool {
        self.errors.iter().any(|alert| alert.concerns(stage))
    }

    /// Whether any alert is attributed to `stage`
    pub fn mentions_stage(&self, stage: SleepStage) -> bool {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .any(|alert| alert.concerns(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Endpoint, RespiratoryEvent};
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rows() -> Vec<StageRow> {
        SleepStage::ALL.into_iter().map(StageRow::new).collect()
    }

    #[test]
    fn test_empty_ledger_warns_twice() {
        let view = DerivedView::derive(&rows());
        assert_eq!(view.total_events, 0);
        assert_eq!(view.total_duration, 0.0);
        assert_eq!(view.ahi, None);
        assert_eq!(view.ahi_display(), "");
        assert_eq!(view.warnings.len(), 2);
        assert_eq!(view.warnings[0].kind, AlertKind::InsufficientSleepDuration);
        assert_eq!(view.warnings[1].kind, AlertKind::NoRespiratoryEvents);
        assert!(view.errors.is_empty());
    }

    #[test]
    fn test_wake_duration_excluded() {
        let mut rows = rows();
        rows[SleepStage::W.index()].set_endpoint(Endpoint::Start, Some(t(21, 0)));
        rows[SleepStage::W.index()].set_endpoint(Endpoint::End, Some(t(22, 0)));
        rows[SleepStage::R.index()].set_endpoint(Endpoint::Start, Some(t(2, 0)));
        rows[SleepStage::R.index()].set_endpoint(Endpoint::End, Some(t(2, 30)));

        let view = DerivedView::derive(&rows);
        assert_eq!(view.total_duration, 0.5);
    }

    #[test]
    fn test_wake_events_counted() {
        let mut rows = rows();
        rows[SleepStage::W.index()]
            .events
            .set(RespiratoryEvent::CentralApnea, 3);

        let view = DerivedView::derive(&rows);
        assert_eq!(view.total_events, 3);
        assert_eq!(view.apnea_total(), 3);
        assert_eq!(view.ahi, None);
    }

    #[test]
    fn test_inactive_rows_ignored() {
        let mut rows = rows();
        let n3 = &mut rows[SleepStage::N3.index()];
        n3.set_endpoint(Endpoint::Start, Some(t(1, 0)));
        n3.set_endpoint(Endpoint::End, Some(t(0, 0)));
        n3.events.set(RespiratoryEvent::MixedApnea, 5);
        n3.active = false;

        let view = DerivedView::derive(&rows);
        assert_eq!(view.total_events, 0);
        assert!(view.errors.is_empty());
        assert!(!view.mentions_stage(SleepStage::N3));
    }

    #[test]
    fn test_inverted_interval_error_is_tagged() {
        let mut rows = rows();
        rows[SleepStage::N1.index()].set_endpoint(Endpoint::Start, Some(t(23, 0)));
        rows[SleepStage::N1.index()].set_endpoint(Endpoint::End, Some(t(22, 0)));

        let view = DerivedView::derive(&rows);
        assert_eq!(view.errors.len(), 1);
        assert_eq!(view.errors[0].stage, Some(SleepStage::N1));
        assert_eq!(
            view.errors[0].message,
            "End Time cannot be earlier than Start Time for stage N1"
        );
        assert!(view.stage_has_error(SleepStage::N1));
        assert!(!view.stage_has_error(SleepStage::N2));
    }

    #[test]
    fn test_ahi_rounding() {
        assert_eq!(Ahi::compute(2, 1.5).unwrap().to_string(), "1.33");
        assert_eq!(Ahi::compute(3, 1.5).unwrap().to_string(), "2.00");
        assert_eq!(Ahi::compute(1, 3.0).unwrap().to_string(), "0.33");
        assert_eq!(Ahi::compute(2, 3.0).unwrap().to_string(), "0.67");
        // 3 / 40 and 201 / 200 sit just below the midpoint in binary
        assert_eq!(Ahi::compute(3, 40.0).unwrap().to_string(), "0.07");
        assert_eq!(Ahi::compute(201, 200.0).unwrap().to_string(), "1.00");
        assert_eq!(Ahi::compute(0, 3.0), None);
        assert_eq!(Ahi::compute(4, 0.0), None);
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(AhiSeverity::classify(Decimal::new(499, 2)), AhiSeverity::Normal);
        assert_eq!(AhiSeverity::classify(Decimal::from(5)), AhiSeverity::Mild);
        assert_eq!(AhiSeverity::classify(Decimal::new(1499, 2)), AhiSeverity::Mild);
        assert_eq!(AhiSeverity::classify(Decimal::from(15)), AhiSeverity::Moderate);
        assert_eq!(AhiSeverity::classify(Decimal::from(30)), AhiSeverity::Severe);
    }

    #[test]
    fn test_view_serializes_blank_ahi() {
        let view = DerivedView::derive(&rows());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["ahi"], "");
        assert_eq!(json["warnings"][0]["stage"], serde_json::Value::Null);
    }
}
