//! Offline mutation queue.
//!
//! Page code records non-idempotent requests it could not deliver (a journal
//! edit made on a train, say). They are persisted in enqueue order and
//! replayed when the background-sync trigger fires.
//!
//! ### Replay contract
//! - Actions are re-issued **sequentially** in enqueue order.
//! - A 2xx answer deletes the action; anything else leaves it queued.
//! - A failing action never stops the actions behind it.
//! - At most one pass runs at a time. A trigger arriving mid-pass waits for
//!   it and then sees only what is still queued.
//! - `replay` itself never fails: a total failure is logged and reported as
//!   an empty pass so the sync trigger resolves normally.

pub mod store;

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use url::Url;

use crate::Error;
use crate::cache::CacheDb;
use crate::http::{Headers, Request, canonicalize};
use crate::network::Network;

pub use store::ACTION_KEY_PREFIX;

/// A deferred mutation owned by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineAction {
    /// Caller-supplied, unique per pending action.
    pub id: String,
    /// Absolute URL, or a path relative to the origin.
    pub url: String,
    pub method: String,
    pub headers: Headers,
    pub body: Bytes,
    pub enqueued_at: DateTime<Utc>,
}

impl OfflineAction {
    pub fn new(id: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            method: method.into().to_ascii_uppercase(),
            headers: Headers::new(),
            body: Bytes::new(),
            enqueued_at: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Key the action is stored under: `/offline-action-{id}`.
    pub fn storage_key(&self) -> String {
        format!("{ACTION_KEY_PREFIX}{}", self.id)
    }

    /// The real request re-issued on replay.
    pub fn to_request(&self, origin: &Url) -> Result<Request, Error> {
        let url = canonicalize(origin, &self.url)?;
        Ok(Request {
            method: self.method.clone(),
            url,
            headers: self.headers.clone(),
            destination: Default::default(),
            body: self.body.clone(),
        })
    }
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Ids delivered and removed from the queue.
    pub delivered: Vec<String>,
    /// Ids that stay queued for the next trigger.
    pub failed: Vec<String>,
}

/// FIFO of pending mutations with replay.
#[derive(Clone)]
pub struct OfflineQueue {
    db: CacheDb,
    network: Arc<dyn Network>,
    origin: Url,
    replay_lock: Arc<Mutex<()>>,
}

impl OfflineQueue {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, origin: Url) -> Self {
        Self { db, network, origin, replay_lock: Arc::new(Mutex::new(())) }
    }

    /// Persist `action` at the back of the queue.
    pub async fn enqueue(&self, action: &OfflineAction) -> Result<(), Error> {
        if action.id.trim().is_empty() {
            return Err(Error::InvalidInput("offline action id cannot be empty".into()));
        }
        if action.method.is_empty() {
            return Err(Error::InvalidInput("offline action method cannot be empty".into()));
        }
        canonicalize(&self.origin, &action.url)?;

        self.db.insert_action(action).await?;
        tracing::debug!(id = %action.id, method = %action.method, url = %action.url, "queued offline action");
        Ok(())
    }

    /// Pending actions in enqueue order.
    pub async fn list_pending(&self) -> Result<Vec<OfflineAction>, Error> {
        self.db.pending_actions().await
    }

    /// Drop a pending action without delivering it.
    pub async fn remove(&self, id: &str) -> Result<bool, Error> {
        self.db.remove_action(&format!("{ACTION_KEY_PREFIX}{id}")).await
    }

    /// Deliver every pending action, one at a time.
    pub async fn replay(&self) -> ReplayReport {
        match self.try_replay().await {
            Ok(report) => {
                if !report.delivered.is_empty() || !report.failed.is_empty() {
                    tracing::info!(
                        delivered = report.delivered.len(),
                        failed = report.failed.len(),
                        "offline queue replay finished"
                    );
                }
                report
            }
            Err(e) => {
                tracing::warn!(error = %e, "offline queue replay aborted");
                ReplayReport::default()
            }
        }
    }

    async fn try_replay(&self) -> Result<ReplayReport, Error> {
        // Held across the whole pass; clones share it.
        let _pass = self.replay_lock.lock().await;
        let mut report = ReplayReport::default();

        for action in self.list_pending().await? {
            match self.deliver(&action).await {
                Ok(()) => report.delivered.push(action.id),
                Err(e) => {
                    tracing::warn!(id = %action.id, error = %e, "offline action stays queued");
                    report.failed.push(action.id);
                }
            }
        }

        Ok(report)
    }

    async fn deliver(&self, action: &OfflineAction) -> Result<(), Error> {
        let request = action.to_request(&self.origin)?;
        let response = self.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(Error::Network(format!("{} {} answered {}", action.method, request.url, response.status)));
        }
        self.db.remove_action(&action.storage_key()).await?;
        Ok(())
    }
}
