//! Displayed alerts with per-item dismissal
//!
//! Dismissing hides an alert from the displayed list only. The ledger is
//! untouched, and the next [`AlertBoard::sync`] brings the alert back if its
//! condition still holds.

use crate::view::{Alert, DerivedView};

/// Errors and warnings as currently shown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertBoard {
    errors: Vec<Alert>,
    warnings: Vec<Alert>,
}

impl AlertBoard {
    /// Board showing everything in `view`
    pub fn from_view(view: &DerivedView) -> Self {
        Self {
            errors: view.errors.clone(),
            warnings: view.warnings.clone(),
        }
    }

    /// Replace the displayed lists with a freshly derived view
    pub fn sync(&mut self, view: &DerivedView) {
        self.errors.clone_from(&view.errors);
        self.warnings.clone_from(&view.warnings);
    }

    /// Displayed errors
    pub fn errors(&self) -> &[Alert] {
        &self.errors
    }

    /// Displayed warnings
    pub fn warnings(&self) -> &[Alert] {
        &self.warnings
    }

    /// Hide the error at `index`
    pub fn dismiss_error(&mut self, index: usize) -> Option<Alert> {
        (index < self.errors.len()).then(|| self.errors.remove(index))
    }

    /// Hide the warning at `index`
    pub fn dismiss_warning(&mut self, index: usize) -> Option<Alert> {
        (index < self.warnings.len()).then(|| self.warnings.remove(index))
    }

    /// Nothing displayed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Endpoint, SleepStage};
    use crate::view::AlertKind;
    use crate::StageLedger;
    use chrono::NaiveTime;

    #[test]
    fn test_dismiss_is_display_only() {
        let mut ledger = StageLedger::new();
        let mut board = AlertBoard::from_view(ledger.derived_view());
        assert_eq!(board.warnings().len(), 2);

        let dismissed = board.dismiss_warning(0).unwrap();
        assert_eq!(dismissed.kind, AlertKind::InsufficientSleepDuration);
        assert_eq!(board.warnings().len(), 1);
        assert_eq!(ledger.derived_view().warnings.len(), 2);

        // Unrelated edit: the dismissed warning comes back
        ledger.set_time(SleepStage::W, Endpoint::Start, NaiveTime::from_hms_opt(21, 0, 0));
        board.sync(ledger.derived_view());
        assert_eq!(board.warnings().len(), 2);
    }

    #[test]
    fn test_dismiss_out_of_range() {
        let mut board = AlertBoard::default();
        assert!(board.is_empty());
        assert_eq!(board.dismiss_error(0), None);
        assert_eq!(board.dismiss_warning(3), None);
    }

    #[test]
    fn test_dismissed_error_stays_gone_once_fixed() {
        let mut ledger = StageLedger::new();
        ledger.set_time(SleepStage::N1, Endpoint::Start, NaiveTime::from_hms_opt(23, 0, 0));
        ledger.set_time(SleepStage::N1, Endpoint::End, NaiveTime::from_hms_opt(22, 0, 0));

        let mut board = AlertBoard::from_view(ledger.derived_view());
        assert!(board.dismiss_error(0).is_some());
        assert!(board.errors().is_empty());

        ledger.set_time(SleepStage::N1, Endpoint::End, NaiveTime::from_hms_opt(23, 30, 0));
        board.sync(ledger.derived_view());
        assert!(board.errors().is_empty());
    }
}
