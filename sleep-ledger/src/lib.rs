//! Sleep Ledger
//!
//! Per-stage sleep intervals and respiratory event counts, with the
//! Apnea-Hypopnea Index derived from them.
//!
//! # Architecture
//!
//! - **Fixed rows**: one row per sleep stage (W, N1, N2, N3, R), never added or removed
//! - **Full rebuild**: every edit rebuilds totals, AHI, warnings and errors from scratch
//! - **Single Writer**: one actor task owns the ledger; readers get snapshots
//! - **Alerts as data**: inverted intervals and missing data never fail an edit
//!
//! # Invariants
//!
//! - Event counts never go below zero
//! - Inactive rows hold no times, zero duration and zero counts
//! - W time never counts as sleep
//! - The derived view is a pure function of the rows

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod ledger;
pub mod view;
pub mod alerts;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;
pub mod command;
pub mod report;
pub mod session;

// Re-exports
pub use error::{Error, Result};
pub use types::{Delta, Endpoint, EventCounts, RespiratoryEvent, SleepStage, StageRow};
pub use ledger::{Edit, EditOutcome, StageLedger};
pub use view::{Ahi, AhiSeverity, Alert, AlertKind, DerivedView};
pub use alerts::AlertBoard;
pub use actor::{LedgerHandle, LedgerSnapshot};
pub use config::Config;
pub use session::Session;
