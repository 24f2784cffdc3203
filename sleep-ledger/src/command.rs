//! Line commands for the interactive session
//!
//! ```text
//! start <stage> <HH:MM | ->      set/clear start time
//! end <stage> <HH:MM | ->        set/clear end time
//! inc <stage> <event>            count one more event
//! dec <stage> <event>            count one less (never below 0)
//! toggle <stage>                 activate/deactivate a stage
//! dismiss error|warning <n>      hide the n-th displayed alert
//! show | json | metrics | help | quit
//! ```
//!
//! Events are named by full label or two-letter code (`oa ca ma oh ch mh`).

use crate::config::InputConfig;
use crate::ledger::Edit;
use crate::types::{Delta, Endpoint, RespiratoryEvent, SleepStage};
use crate::{Error, Result};
use chrono::{NaiveTime, Timelike};

/// Which displayed list a dismissal targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertList {
    /// Errors
    Errors,
    /// Warnings
    Warnings,
}

/// Parsed session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ledger edit
    Edit(Edit),
    /// Hide one displayed alert (zero-based index)
    Dismiss {
        /// Target list
        list: AlertList,
        /// Position in the displayed list
        index: usize,
    },
    /// Render the ledger
    Show,
    /// Print the current snapshot as JSON
    Json,
    /// Print metrics in text exposition format
    Metrics,
    /// Print usage
    Help,
    /// End the session
    Quit,
}

impl Command {
    /// Parse one input line
    pub fn parse(line: &str, input: &InputConfig) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let verb = tokens
            .next()
            .ok_or_else(|| Error::InvalidCommand("empty line".to_string()))?
            .to_ascii_lowercase();

        let command = match verb.as_str() {
            "start" | "end" => {
                let endpoint = if verb == "start" {
                    Endpoint::Start
                } else {
                    Endpoint::End
                };
                let stage = parse_stage(tokens.next())?;
                let text = tokens
                    .next()
                    .ok_or_else(|| Error::InvalidCommand(format!("{} needs a time", verb)))?;
                Command::Edit(Edit::SetTime {
                    stage,
                    endpoint,
                    value: parse_time(text, input)?,
                })
            }
            "inc" | "dec" => {
                let delta = if verb == "inc" {
                    Delta::Increment
                } else {
                    Delta::Decrement
                };
                let stage = parse_stage(tokens.next())?;
                let label = tokens.collect::<Vec<_>>().join(" ");
                let event = RespiratoryEvent::from_label(&label)
                    .ok_or_else(|| Error::UnknownEvent(label.clone()))?;
                Command::Edit(Edit::AdjustEventCount {
                    stage,
                    event,
                    delta,
                })
            }
            "toggle" => Command::Edit(Edit::ToggleActive {
                stage: parse_stage(tokens.next())?,
            }),
            "dismiss" => {
                let list = match tokens.next().map(|s| s.to_ascii_lowercase()).as_deref() {
                    Some("error") | Some("errors") => AlertList::Errors,
                    Some("warning") | Some("warnings") => AlertList::Warnings,
                    other => {
                        return Err(Error::InvalidCommand(format!(
                            "dismiss expects error|warning, got {:?}",
                            other
                        )))
                    }
                };
                let number: usize = tokens
                    .next()
                    .and_then(|n| n.parse().ok())
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| {
                        Error::InvalidCommand("dismiss needs a position starting at 1".to_string())
                    })?;
                Command::Dismiss {
                    list,
                    index: number - 1,
                }
            }
            "show" => Command::Show,
            "json" => Command::Json,
            "metrics" => Command::Metrics,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(Error::InvalidCommand(format!("unknown command '{}'", other))),
        };

        Ok(command)
    }
}

fn parse_stage(token: Option<&str>) -> Result<SleepStage> {
    let token = token.ok_or_else(|| Error::InvalidCommand("missing stage".to_string()))?;
    SleepStage::from_label(token).ok_or_else(|| Error::UnknownStage(token.to_string()))
}

/// Parse `HH:MM` (24-hour) on the configured minute grid; `-` clears
pub fn parse_time(text: &str, input: &InputConfig) -> Result<Option<NaiveTime>> {
    let text = text.trim();
    if text == "-" || text.eq_ignore_ascii_case("clear") {
        return Ok(None);
    }

    let time = NaiveTime::parse_from_str(text, "%H:%M")
        .map_err(|e| Error::InvalidTime(format!("'{}': {}", text, e)))?;

    if input.minute_step > 1 && time.minute() % input.minute_step != 0 {
        return Err(Error::InvalidTime(format!(
            "'{}' is not on the {}-minute grid",
            text, input.minute_step
        )));
    }

    Ok(Some(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InputConfig {
        InputConfig::default()
    }

    #[test]
    fn test_parse_set_time() {
        let cmd = Command::parse("start n2 22:00", &input()).unwrap();
        assert_eq!(
            cmd,
            Command::Edit(Edit::SetTime {
                stage: SleepStage::N2,
                endpoint: Endpoint::Start,
                value: NaiveTime::from_hms_opt(22, 0, 0),
            })
        );

        let cmd = Command::parse("end R -", &input()).unwrap();
        assert_eq!(
            cmd,
            Command::Edit(Edit::SetTime {
                stage: SleepStage::R,
                endpoint: Endpoint::End,
                value: None,
            })
        );
    }

    #[test]
    fn test_parse_event_by_label_and_code() {
        let by_code = Command::parse("inc N1 oa", &input()).unwrap();
        let by_label = Command::parse("inc N1 Obstructive Apnea", &input()).unwrap();
        assert_eq!(by_code, by_label);

        let cmd = Command::parse("dec w mh", &input()).unwrap();
        assert_eq!(
            cmd,
            Command::Edit(Edit::AdjustEventCount {
                stage: SleepStage::W,
                event: RespiratoryEvent::MixedHypopnea,
                delta: Delta::Decrement,
            })
        );
    }

    #[test]
    fn test_parse_dismiss_is_one_based() {
        let cmd = Command::parse("dismiss warning 2", &input()).unwrap();
        assert_eq!(
            cmd,
            Command::Dismiss {
                list: AlertList::Warnings,
                index: 1
            }
        );
        assert!(Command::parse("dismiss error 0", &input()).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Command::parse("toggle N4", &input()),
            Err(Error::UnknownStage(_))
        ));
        assert!(matches!(
            Command::parse("inc N2 snore", &input()),
            Err(Error::UnknownEvent(_))
        ));
        assert!(matches!(
            Command::parse("frobnicate", &input()),
            Err(Error::InvalidCommand(_))
        ));
        assert!(matches!(
            Command::parse("", &input()),
            Err(Error::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_time_grid() {
        assert!(parse_time("22:05", &input()).unwrap().is_some());
        assert!(matches!(
            parse_time("22:07", &input()),
            Err(Error::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time("25:00", &input()),
            Err(Error::InvalidTime(_))
        ));

        let any_minute = InputConfig {
            minute_step: 1,
            ..InputConfig::default()
        };
        assert!(parse_time("22:07", &any_minute).unwrap().is_some());
    }
}
