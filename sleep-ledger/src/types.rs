//! Core types for the sleep ledger
//!
//! The stage and event sets are closed enums, so a row can only ever be
//! addressed by one of the five stages and a counter by one of the six
//! event types. Raw indices and labels coming from a presentation layer are
//! resolved through `from_index` / `from_label` at the edge.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sleep stage (AASM scoring)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SleepStage {
    /// Wake
    W,
    /// NREM stage 1
    N1,
    /// NREM stage 2
    N2,
    /// NREM stage 3
    N3,
    /// REM
    R,
}

impl SleepStage {
    /// Number of stages (and ledger rows)
    pub const COUNT: usize = 5;

    /// All stages in display order
    pub const ALL: [SleepStage; Self::COUNT] = [
        SleepStage::W,
        SleepStage::N1,
        SleepStage::N2,
        SleepStage::N3,
        SleepStage::R,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            SleepStage::W => "W",
            SleepStage::N1 => "N1",
            SleepStage::N2 => "N2",
            SleepStage::N3 => "N3",
            SleepStage::R => "R",
        }
    }

    /// Row position in the ledger
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Resolve a row position
    pub fn from_index(index: usize) -> crate::Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(crate::Error::StageIndexOutOfRange(index))
    }

    /// Parse from label (case-insensitive)
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(s.trim()))
    }

    /// Whether time in this stage counts as sleep
    pub fn counts_as_sleep(&self) -> bool {
        !matches!(self, SleepStage::W)
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Scored respiratory event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RespiratoryEvent {
    /// Obstructive apnea
    ObstructiveApnea,
    /// Central apnea
    CentralApnea,
    /// Mixed apnea
    MixedApnea,
    /// Obstructive hypopnea
    ObstructiveHypopnea,
    /// Central hypopnea
    CentralHypopnea,
    /// Mixed hypopnea
    MixedHypopnea,
}

impl RespiratoryEvent {
    /// Number of event types
    pub const COUNT: usize = 6;

    /// All event types in display order
    pub const ALL: [RespiratoryEvent; Self::COUNT] = [
        RespiratoryEvent::ObstructiveApnea,
        RespiratoryEvent::CentralApnea,
        RespiratoryEvent::MixedApnea,
        RespiratoryEvent::ObstructiveHypopnea,
        RespiratoryEvent::CentralHypopnea,
        RespiratoryEvent::MixedHypopnea,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            RespiratoryEvent::ObstructiveApnea => "Obstructive Apnea",
            RespiratoryEvent::CentralApnea => "Central Apnea",
            RespiratoryEvent::MixedApnea => "Mixed Apnea",
            RespiratoryEvent::ObstructiveHypopnea => "Obstructive Hypopnea",
            RespiratoryEvent::CentralHypopnea => "Central Hypopnea",
            RespiratoryEvent::MixedHypopnea => "Mixed Hypopnea",
        }
    }

    /// Two-letter code used by the session command line
    pub fn short_code(&self) -> &'static str {
        match self {
            RespiratoryEvent::ObstructiveApnea => "oa",
            RespiratoryEvent::CentralApnea => "ca",
            RespiratoryEvent::MixedApnea => "ma",
            RespiratoryEvent::ObstructiveHypopnea => "oh",
            RespiratoryEvent::CentralHypopnea => "ch",
            RespiratoryEvent::MixedHypopnea => "mh",
        }
    }

    /// Position in an [`EventCounts`] table
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Parse from full label or short code (case-insensitive)
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|event| {
            event.label().eq_ignore_ascii_case(s) || event.short_code().eq_ignore_ascii_case(s)
        })
    }

    /// Apnea (complete cessation of airflow)
    pub fn is_apnea(&self) -> bool {
        matches!(
            self,
            RespiratoryEvent::ObstructiveApnea
                | RespiratoryEvent::CentralApnea
                | RespiratoryEvent::MixedApnea
        )
    }

    /// Hypopnea (partial reduction of airflow)
    pub fn is_hypopnea(&self) -> bool {
        !self.is_apnea()
    }
}

impl fmt::Display for RespiratoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Interval endpoint of a stage row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// Start time
    Start,
    /// End time
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Start => write!(f, "Start Time"),
            Endpoint::End => write!(f, "End Time"),
        }
    }
}

/// Unit adjustment of an event counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delta {
    /// +1
    Increment,
    /// -1, floored at zero
    Decrement,
}

impl Delta {
    /// Apply to a count
    pub fn apply(&self, count: u32) -> u32 {
        match self {
            Delta::Increment => count.saturating_add(1),
            Delta::Decrement => count.saturating_sub(1),
        }
    }
}

/// Per-event-type counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts([u32; RespiratoryEvent::COUNT]);

impl EventCounts {
    /// All counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for one event type
    pub fn get(&self, event: RespiratoryEvent) -> u32 {
        self.0[event.index()]
    }

    pub(crate) fn set(&mut self, event: RespiratoryEvent, count: u32) {
        self.0[event.index()] = count;
    }

    pub(crate) fn add(&mut self, other: &EventCounts) {
        for (total, count) in self.0.iter_mut().zip(other.0.iter()) {
            *total = total.saturating_add(*count);
        }
    }

    /// Iterate `(event, count)` in display order
    pub fn iter(&self) -> impl Iterator<Item = (RespiratoryEvent, u32)> + '_ {
        RespiratoryEvent::ALL
            .into_iter()
            .map(move |event| (event, self.get(event)))
    }

    /// Sum over all event types
    pub fn total(&self) -> u32 {
        self.0.iter().fold(0u32, |acc, c| acc.saturating_add(*c))
    }

    /// Sum over apnea types
    pub fn apneas(&self) -> u32 {
        self.iter()
            .filter(|(event, _)| event.is_apnea())
            .fold(0u32, |acc, (_, c)| acc.saturating_add(c))
    }

    /// Sum over hypopnea types
    pub fn hypopneas(&self) -> u32 {
        self.iter()
            .filter(|(event, _)| event.is_hypopnea())
            .fold(0u32, |acc, (_, c)| acc.saturating_add(c))
    }
}

/// One ledger row: a sleep stage with its interval and event counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRow {
    /// Stage label (fixed for the row's lifetime)
    pub stage: SleepStage,

    /// Interval start (time of day)
    pub start_time: Option<NaiveTime>,

    /// Interval end (time of day)
    pub end_time: Option<NaiveTime>,

    /// Derived interval length in hours
    pub duration: f64,

    /// Event counters
    pub events: EventCounts,

    /// Included in aggregation
    pub active: bool,
}

impl StageRow {
    /// Fresh active row with no interval and zero counts
    pub fn new(stage: SleepStage) -> Self {
        Self {
            stage,
            start_time: None,
            end_time: None,
            duration: 0.0,
            events: EventCounts::new(),
            active: true,
        }
    }

    /// Endpoint value
    pub fn endpoint(&self, which: Endpoint) -> Option<NaiveTime> {
        match which {
            Endpoint::Start => self.start_time,
            Endpoint::End => self.end_time,
        }
    }

    /// Active row whose end is not after its start
    pub fn is_inverted(&self) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => self.active && end <= start,
            _ => false,
        }
    }

    /// Sum of this row's event counters
    pub fn total_events(&self) -> u32 {
        self.events.total()
    }

    pub(crate) fn set_endpoint(&mut self, which: Endpoint, value: Option<NaiveTime>) {
        match which {
            Endpoint::Start => self.start_time = value,
            Endpoint::End => self.end_time = value,
        }
        self.duration = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => interval_hours(start, end),
            _ => 0.0,
        };
    }

    /// Clear everything except the stage label and the active flag
    pub(crate) fn reset(&mut self) {
        self.start_time = None;
        self.end_time = None;
        self.duration = 0.0;
        self.events = EventCounts::new();
    }
}

const NANOS_PER_HOUR: f64 = 3_600_000_000_000.0;

/// Length of `start..end` in hours; zero for an empty or inverted interval
pub fn interval_hours(start: NaiveTime, end: NaiveTime) -> f64 {
    if end <= start {
        return 0.0;
    }
    end.signed_duration_since(start)
        .num_nanoseconds()
        .map_or(0.0, |nanos| nanos as f64 / NANOS_PER_HOUR)
}
