//! Session orchestration
//!
//! Ties configuration, metrics and the ledger actor together. A session
//! lives as long as the process; nothing is persisted.
//!
//! # Example
//!
//! ```no_run
//! use sleep_ledger::{Config, Session, SleepStage};
//!
//! #[tokio::main]
//! async fn main() -> sleep_ledger::Result<()> {
//!     let session = Session::open(Config::default())?;
//!     session.handle().toggle_active(SleepStage::W).await?;
//!     session.shutdown().await
//! }
//! ```

use crate::actor::{spawn_ledger_actor, LedgerHandle};
use crate::metrics::Metrics;
use crate::{Config, Result};

/// Running ledger session
#[derive(Debug)]
pub struct Session {
    handle: LedgerHandle,
    metrics: Option<Metrics>,
    config: Config,
}

impl Session {
    /// Start a session. Must be called inside a Tokio runtime.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let metrics = if config.metrics.enabled {
            Some(Metrics::new()?)
        } else {
            None
        };

        let handle = spawn_ledger_actor(config.actor.mailbox_capacity, metrics.clone());
        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            metrics = config.metrics.enabled,
            "Session opened"
        );

        Ok(Self {
            handle,
            metrics,
            config,
        })
    }

    /// Handle for edits and snapshots
    pub fn handle(&self) -> &LedgerHandle {
        &self.handle
    }

    /// Metrics collector (if enabled)
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop the ledger actor
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down session");
        self.handle.shutdown().await
    }
}
