//! Actor-based single writer for the ledger
//!
//! One task owns the [`StageLedger`]; every edit goes through its mailbox,
//! so edits are applied strictly one at a time and each edit's rebuild
//! finishes before the next edit is looked at.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            Presentation layer (any task)             │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                   │
//! │         Sends messages to actor mailbox              │
//! └──────────┬──────────────────────────▲────────────────┘
//!            │ mpsc::channel (bounded)  │ watch::Receiver
//!            ▼                          │
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (single task)               │
//! │   StageLedger::apply() -> rebuild -> publish         │
//! │   LedgerSnapshot { revision, rows, view }            │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Readers never touch the ledger itself. They get immutable snapshots,
//! either as the reply to an edit or from the watch channel.

use crate::ledger::{Edit, EditOutcome, StageLedger};
use crate::metrics::Metrics;
use crate::types::{Delta, Endpoint, RespiratoryEvent, SleepStage, StageRow};
use crate::view::DerivedView;
use crate::{Error, Result};
use chrono::NaiveTime;
use serde::Serialize;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};

/// Consistent copy of the ledger and its derived view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    /// Number of applied edits so far
    pub revision: u64,

    /// Rows in stage order
    pub rows: Vec<StageRow>,

    /// View derived from exactly these rows
    pub view: DerivedView,
}

impl LedgerSnapshot {
    fn capture(revision: u64, ledger: &StageLedger) -> Self {
        Self {
            revision,
            rows: ledger.rows().to_vec(),
            view: ledger.derived_view().clone(),
        }
    }

    /// Row for one stage
    pub fn row(&self, stage: SleepStage) -> &StageRow {
        &self.rows[stage.index()]
    }
}

/// Reply to an edit
#[derive(Debug, Clone)]
pub struct EditReceipt {
    /// What the edit did
    pub outcome: EditOutcome,

    /// State right after the edit
    pub snapshot: LedgerSnapshot,
}

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Apply an edit
    Apply {
        /// Edit to apply
        edit: Edit,
        /// Receipt channel
        response: oneshot::Sender<EditReceipt>,
    },

    /// Get current snapshot
    GetSnapshot {
        /// Snapshot channel
        response: oneshot::Sender<LedgerSnapshot>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the ledger
#[derive(Debug)]
pub struct LedgerActor {
    /// The ledger
    ledger: StageLedger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Snapshot publisher
    publisher: watch::Sender<LedgerSnapshot>,

    /// Applied edits
    revision: u64,

    /// Metrics (if enabled)
    metrics: Option<Metrics>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        mailbox: mpsc::Receiver<LedgerMessage>,
        publisher: watch::Sender<LedgerSnapshot>,
        metrics: Option<Metrics>,
    ) -> Self {
        let ledger = StageLedger::new();
        if let Some(metrics) = &metrics {
            metrics.update_view(ledger.derived_view());
        }
        Self {
            ledger,
            mailbox,
            publisher,
            revision: 0,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        tracing::info!("Ledger actor started");

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }

        tracing::info!(revision = self.revision, "Ledger actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::Apply { edit, response } => {
                let receipt = self.apply(edit);
                if response.send(receipt).is_err() {
                    tracing::error!(operation = edit.operation(), "Edit caller went away before reply");
                }
            }

            LedgerMessage::GetSnapshot { response } => {
                let snapshot = LedgerSnapshot::capture(self.revision, &self.ledger);
                let _ = response.send(snapshot);
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn apply(&mut self, edit: Edit) -> EditReceipt {
        let started = Instant::now();
        let outcome = self.ledger.apply(edit);
        let elapsed = started.elapsed();

        if outcome == EditOutcome::Applied {
            self.revision += 1;
        }

        let snapshot = LedgerSnapshot::capture(self.revision, &self.ledger);
        self.publisher.send_replace(snapshot.clone());

        if let Some(metrics) = &self.metrics {
            metrics.record_edit(&edit, outcome);
            metrics.record_recompute(elapsed.as_secs_f64());
            metrics.update_view(&snapshot.view);
        }

        tracing::debug!(
            stage = %edit.stage(),
            operation = edit.operation(),
            ?outcome,
            revision = self.revision,
            total_events = snapshot.view.total_events,
            total_duration = snapshot.view.total_duration,
            ahi = %snapshot.view.ahi_display(),
            "Edit processed"
        );

        EditReceipt { outcome, snapshot }
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
    snapshots: watch::Receiver<LedgerSnapshot>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(
        sender: mpsc::Sender<LedgerMessage>,
        snapshots: watch::Receiver<LedgerSnapshot>,
    ) -> Self {
        Self { sender, snapshots }
    }

    /// Apply an edit
    pub async fn apply(&self, edit: Edit) -> Result<EditReceipt> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Apply { edit, response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Set or clear one endpoint of a stage's interval
    pub async fn set_time(
        &self,
        stage: SleepStage,
        endpoint: Endpoint,
        value: Option<NaiveTime>,
    ) -> Result<EditReceipt> {
        self.apply(Edit::SetTime {
            stage,
            endpoint,
            value,
        })
        .await
    }

    /// Increment or decrement an event counter
    pub async fn adjust_event_count(
        &self,
        stage: SleepStage,
        event: RespiratoryEvent,
        delta: Delta,
    ) -> Result<EditReceipt> {
        self.apply(Edit::AdjustEventCount {
            stage,
            event,
            delta,
        })
        .await
    }

    /// Flip a stage's active flag
    pub async fn toggle_active(&self, stage: SleepStage) -> Result<EditReceipt> {
        self.apply(Edit::ToggleActive { stage }).await
    }

    /// Get current snapshot through the mailbox (ordered after queued edits)
    pub async fn snapshot(&self) -> Result<LedgerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::GetSnapshot { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Latest published snapshot, without going through the mailbox
    pub fn latest(&self) -> LedgerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to snapshots published after each edit
    pub fn subscribe(&self) -> watch::Receiver<LedgerSnapshot> {
        self.snapshots.clone()
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(mailbox_capacity: usize, metrics: Option<Metrics>) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let initial = LedgerSnapshot::capture(0, &StageLedger::new());
    let (publisher, snapshots) = watch::channel(initial);
    let actor = LedgerActor::new(rx, publisher, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx, snapshots)
}
