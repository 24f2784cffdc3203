//! Text rendering of the ledger for the interactive session

use crate::alerts::AlertBoard;
use crate::config::InputConfig;
use crate::types::{RespiratoryEvent, StageRow};
use crate::view::DerivedView;
use chrono::NaiveTime;
use std::fmt::Write;

const LABEL_WIDTH: usize = 22;
const CELL_WIDTH: usize = 10;

/// Duration cell: two decimals for active rows, `-` otherwise
pub fn duration_cell(row: &StageRow) -> String {
    if row.active {
        format!("{:.2}", row.duration)
    } else {
        "-".to_string()
    }
}

/// Time cell for one endpoint
pub fn time_cell(time: Option<NaiveTime>, input: &InputConfig) -> String {
    match time {
        Some(time) if input.use_24_hour_clock => time.format("%H:%M").to_string(),
        Some(time) => time.format("%I:%M %p").to_string(),
        None => "--:--".to_string(),
    }
}

/// `AHI: x.xx`, only once both totals are positive
pub fn headline(view: &DerivedView) -> Option<String> {
    if view.total_events == 0 || view.total_duration <= 0.0 {
        return None;
    }
    let mut line = format!("AHI: {}", view.ahi_display());
    if let Some(severity) = view.severity() {
        let _ = write!(line, " ({})", severity);
    }
    Some(line)
}

/// Totals line shown under the headline
pub fn breakdown(view: &DerivedView) -> Option<String> {
    if view.total_events == 0 || view.total_duration <= 0.0 {
        return None;
    }
    Some(format!(
        "( respiratory events = {} / sleep duration = {:.2} )",
        view.total_events, view.total_duration
    ))
}

/// Stage table: one column per stage, one line per field
pub fn render_table(rows: &[StageRow], view: &DerivedView, input: &InputConfig) -> String {
    let mut out = String::new();

    let _ = write!(out, "{:<w$}", "Stage", w = LABEL_WIDTH);
    for row in rows {
        let header = if row.active {
            row.stage.to_string()
        } else {
            format!("{} (off)", row.stage)
        };
        let _ = write!(out, "{:>w$}", header, w = CELL_WIDTH);
    }
    out.push('\n');

    let mut line = |label: &str, cell: &dyn Fn(&StageRow) -> String| {
        let _ = write!(out, "{:<w$}", label, w = LABEL_WIDTH);
        for row in rows {
            let _ = write!(out, "{:>w$}", cell(row), w = CELL_WIDTH);
        }
        out.push('\n');
    };

    line("Start Time", &|row: &StageRow| {
        mark_error(time_cell(row.start_time, input), view, row)
    });
    line("End Time", &|row: &StageRow| {
        mark_error(time_cell(row.end_time, input), view, row)
    });
    line("Duration (hrs)", &duration_cell);
    for event in RespiratoryEvent::ALL {
        line(event.label(), &|row: &StageRow| row.events.get(event).to_string());
    }

    out
}

fn mark_error(cell: String, view: &DerivedView, row: &StageRow) -> String {
    if view.stage_has_error(row.stage) {
        format!("!{}", cell)
    } else {
        cell
    }
}

/// Full screen: headline, alerts, table
pub fn render(
    rows: &[StageRow],
    view: &DerivedView,
    board: &AlertBoard,
    input: &InputConfig,
) -> String {
    let mut out = String::new();

    for (i, alert) in board.errors().iter().enumerate() {
        let _ = writeln!(out, "[error {}] {}", i + 1, alert);
    }
    for (i, alert) in board.warnings().iter().enumerate() {
        let _ = writeln!(out, "[warning {}] {}", i + 1, alert);
    }

    if let (Some(headline), Some(breakdown)) = (headline(view), breakdown(view)) {
        let _ = writeln!(out, "{}", headline);
        let _ = writeln!(out, "{}", breakdown);
    }

    out.push_str(&render_table(rows, view, input));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Delta, Endpoint, SleepStage};
    use crate::StageLedger;

    fn scenario_one() -> StageLedger {
        let mut ledger = StageLedger::new();
        ledger.set_time(SleepStage::N2, Endpoint::Start, NaiveTime::from_hms_opt(22, 0, 0));
        ledger.set_time(SleepStage::N2, Endpoint::End, NaiveTime::from_hms_opt(23, 30, 0));
        for _ in 0..2 {
            ledger.adjust_event_count(
                SleepStage::N2,
                RespiratoryEvent::ObstructiveApnea,
                Delta::Increment,
            );
        }
        ledger
    }

    #[test]
    fn test_duration_cell() {
        let mut ledger = StageLedger::new();
        assert_eq!(duration_cell(ledger.row(SleepStage::N1)), "0.00");
        ledger.toggle_active(SleepStage::N1);
        assert_eq!(duration_cell(ledger.row(SleepStage::N1)), "-");
    }

    #[test]
    fn test_headline_and_breakdown() {
        assert_eq!(headline(StageLedger::new().derived_view()), None);

        let ledger = scenario_one();
        let view = ledger.derived_view();
        assert_eq!(headline(view).unwrap(), "AHI: 1.33 (Normal)");
        assert_eq!(
            breakdown(view).unwrap(),
            "( respiratory events = 2 / sleep duration = 1.50 )"
        );
    }

    #[test]
    fn test_time_cell_clock() {
        let input = InputConfig::default();
        let time = NaiveTime::from_hms_opt(22, 5, 0);
        assert_eq!(time_cell(time, &input), "22:05");
        assert_eq!(time_cell(None, &input), "--:--");

        let twelve = InputConfig {
            use_24_hour_clock: false,
            ..InputConfig::default()
        };
        assert_eq!(time_cell(time, &twelve), "10:05 PM");
    }

    #[test]
    fn test_render_marks_errors() {
        let mut ledger = StageLedger::new();
        ledger.set_time(SleepStage::N1, Endpoint::Start, NaiveTime::from_hms_opt(23, 0, 0));
        ledger.set_time(SleepStage::N1, Endpoint::End, NaiveTime::from_hms_opt(22, 0, 0));

        let board = AlertBoard::from_view(ledger.derived_view());
        let text = render(
            ledger.rows(),
            ledger.derived_view(),
            &board,
            &InputConfig::default(),
        );
        assert!(text.contains("[error 1] End Time cannot be earlier than Start Time for stage N1"));
        assert!(text.contains("!23:00"));
        assert!(text.contains("Mixed Hypopnea"));
        assert!(!text.contains("AHI:"));
    }

    #[test]
    fn test_render_scenario_one() {
        let ledger = scenario_one();
        let board = AlertBoard::from_view(ledger.derived_view());
        let text = render(
            ledger.rows(),
            ledger.derived_view(),
            &board,
            &InputConfig::default(),
        );
        assert!(text.starts_with("AHI: 1.33"));
        assert!(text.contains("1.50"));
    }
}
