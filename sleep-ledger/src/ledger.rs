//! The sleep-stage ledger
//!
//! Five rows, one per stage, fixed at construction. Three edit operations
//! mutate a single row; each one is followed by a full rebuild of the
//! [`DerivedView`]. No edit can fail: questionable input is clamped (counter
//! floor) or surfaced as an alert (inverted interval), never rejected.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveTime;
//! use sleep_ledger::{Delta, Endpoint, RespiratoryEvent, SleepStage, StageLedger};
//!
//! let mut ledger = StageLedger::new();
//! ledger.set_time(SleepStage::N2, Endpoint::Start, NaiveTime::from_hms_opt(22, 0, 0));
//! ledger.set_time(SleepStage::N2, Endpoint::End, NaiveTime::from_hms_opt(23, 30, 0));
//! ledger.adjust_event_count(SleepStage::N2, RespiratoryEvent::ObstructiveApnea, Delta::Increment);
//! ledger.adjust_event_count(SleepStage::N2, RespiratoryEvent::ObstructiveApnea, Delta::Increment);
//!
//! assert_eq!(ledger.derived_view().ahi_display(), "1.33");
//! ```

use crate::types::{Delta, Endpoint, RespiratoryEvent, SleepStage, StageRow};
use crate::view::DerivedView;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A single edit, as dispatched by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edit {
    /// Set or clear one endpoint of a stage's interval
    SetTime {
        /// Target row
        stage: SleepStage,
        /// Which endpoint
        endpoint: Endpoint,
        /// New value, `None` clears it
        value: Option<NaiveTime>,
    },

    /// Increment or decrement one event counter
    AdjustEventCount {
        /// Target row
        stage: SleepStage,
        /// Counter
        event: RespiratoryEvent,
        /// Direction
        delta: Delta,
    },

    /// Flip a stage's active flag
    ToggleActive {
        /// Target row
        stage: SleepStage,
    },
}

impl Edit {
    /// Row the edit targets
    pub fn stage(&self) -> SleepStage {
        match self {
            Edit::SetTime { stage, .. }
            | Edit::AdjustEventCount { stage, .. }
            | Edit::ToggleActive { stage } => *stage,
        }
    }

    /// Operation name (metrics label)
    pub fn operation(&self) -> &'static str {
        match self {
            Edit::SetTime { .. } => "set_time",
            Edit::AdjustEventCount { .. } => "adjust_event_count",
            Edit::ToggleActive { .. } => "toggle_active",
        }
    }
}

/// What an edit did to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditOutcome {
    /// Row updated and view rebuilt
    Applied,
    /// Row is inactive; data edits on it are dropped
    IgnoredInactive,
}

/// In-memory ledger of sleep-stage rows plus its derived view
#[derive(Debug, Clone)]
pub struct StageLedger {
    rows: [StageRow; SleepStage::COUNT],
    view: DerivedView,
}

impl StageLedger {
    /// All stages active, no times, zero counts
    pub fn new() -> Self {
        let rows = SleepStage::ALL.map(StageRow::new);
        let view = DerivedView::derive(&rows);
        Self { rows, view }
    }

    /// Rows in stage order
    pub fn rows(&self) -> &[StageRow] {
        &self.rows
    }

    /// Row for one stage
    pub fn row(&self, stage: SleepStage) -> &StageRow {
        &self.rows[stage.index()]
    }

    /// Current derived view
    pub fn derived_view(&self) -> &DerivedView {
        &self.view
    }

    /// Set or clear one endpoint of a stage's interval.
    ///
    /// An inverted interval keeps both times, gets a zero duration and is
    /// reported in the view's errors.
    pub fn set_time(
        &mut self,
        stage: SleepStage,
        endpoint: Endpoint,
        value: Option<NaiveTime>,
    ) -> EditOutcome {
        let row = &mut self.rows[stage.index()];
        if !row.active {
            tracing::warn!(%stage, %endpoint, "ignoring time edit on inactive stage");
            return EditOutcome::IgnoredInactive;
        }

        row.set_endpoint(endpoint, value);
        tracing::debug!(
            %stage,
            %endpoint,
            value = ?value,
            duration = row.duration,
            inverted = row.is_inverted(),
            "time set"
        );

        self.recompute();
        EditOutcome::Applied
    }

    /// Increment or decrement an event counter; decrement floors at zero
    pub fn adjust_event_count(
        &mut self,
        stage: SleepStage,
        event: RespiratoryEvent,
        delta: Delta,
    ) -> EditOutcome {
        let row = &mut self.rows[stage.index()];
        if !row.active {
            tracing::warn!(%stage, %event, "ignoring event edit on inactive stage");
            return EditOutcome::IgnoredInactive;
        }

        let count = delta.apply(row.events.get(event));
        row.events.set(event, count);
        tracing::debug!(%stage, %event, ?delta, count, "event count adjusted");

        self.recompute();
        EditOutcome::Applied
    }

    /// Flip a stage's active flag.
    ///
    /// Deactivation wipes the row; reactivation starts from that wiped
    /// state. Alerts attributed to the stage disappear with the rebuild.
    pub fn toggle_active(&mut self, stage: SleepStage) -> EditOutcome {
        let row = &mut self.rows[stage.index()];
        row.active = !row.active;
        if !row.active {
            row.reset();
        }
        tracing::debug!(%stage, active = row.active, "stage toggled");

        self.recompute();
        EditOutcome::Applied
    }

    /// Dispatch an [`Edit`]
    pub fn apply(&mut self, edit: Edit) -> EditOutcome {
        match edit {
            Edit::SetTime {
                stage,
                endpoint,
                value,
            } => self.set_time(stage, endpoint, value),
            Edit::AdjustEventCount {
                stage,
                event,
                delta,
            } => self.adjust_event_count(stage, event, delta),
            Edit::ToggleActive { stage } => self.toggle_active(stage),
        }
    }

    /// Rebuild the derived view from the rows
    pub fn recompute(&mut self) -> &DerivedView {
        self.view = DerivedView::derive(&self.rows);
        &self.view
    }
}

impl Default for StageLedger {
    fn default() -> Self {
        Self::new()
    }
}
