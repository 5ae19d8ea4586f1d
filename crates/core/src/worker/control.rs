//! Control plane: page messages, push notifications, and notification clicks.
//!
//! None of these touch an in-flight fetch; they share only the storage.

use bytes::Bytes;
use serde::Deserialize;

use super::host::{Notification, NotificationAction};
use super::{Outcome, Worker};
use crate::Error;
use crate::cache::PartitionKind;
use crate::clock::Clock;
use crate::http::{Headers, canonicalize};
use crate::queue::OfflineAction;

const NOTIFICATION_TITLE: &str = "Quill Journal";
const NOTIFICATION_TAG: &str = "quill-journal";
const DEFAULT_PUSH_BODY: &str = "New journal activity";
const OPEN_ACTION: &str = "open";
const CLOSE_ACTION: &str = "close";

/// Message posted by page code to the worker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Promote a waiting worker version now.
    SkipWaiting,
    /// Add these URLs to the static partition ("save for offline").
    CacheUrls { urls: Vec<String> },
    /// Record a deferred mutation.
    QueueAction { action: ActionPayload },
    /// Replay the queue without waiting for background sync.
    ReplayActions,
    #[serde(other)]
    Unknown,
}

/// Wire shape of a deferred mutation inside `QUEUE_ACTION`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionPayload {
    pub id: String,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: Headers,
    /// A string is sent verbatim; any other JSON value is sent serialized.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

fn default_method() -> String {
    "POST".into()
}

impl ActionPayload {
    /// Build the queued action, stamped at `now`.
    pub fn into_action(self, now: chrono::DateTime<chrono::Utc>) -> OfflineAction {
        let mut action = OfflineAction::new(self.id, self.method, self.url);
        for (name, value) in self.headers {
            action = action.with_header(&name, value);
        }
        action.body = match self.body {
            None | Some(serde_json::Value::Null) => Bytes::new(),
            Some(serde_json::Value::String(text)) => Bytes::from(text),
            Some(value) => {
                action.headers.entry("content-type".into()).or_insert_with(|| "application/json".into());
                Bytes::from(value.to_string())
            }
        };
        action.enqueued_at = now;
        action
    }
}

impl Worker {
    /// Handle a page message.
    pub async fn handle_message(&self, message: ControlMessage) -> Result<Outcome, Error> {
        match message {
            ControlMessage::SkipWaiting => {
                self.host.skip_waiting().await?;
                Ok(Outcome::Completed)
            }
            ControlMessage::CacheUrls { urls } => {
                let mut resolved = Vec::with_capacity(urls.len());
                for raw in &urls {
                    match canonicalize(&self.origin, raw) {
                        Ok(url) => resolved.push(url),
                        Err(e) => tracing::warn!(url = %raw, error = %e, "skipping uncacheable url"),
                    }
                }
                let report = self.add_all(PartitionKind::Static, &resolved).await?;
                tracing::debug!(stored = report.stored.len(), failed = report.failed.len(), "cached urls on request");
                Ok(Outcome::Completed)
            }
            ControlMessage::QueueAction { action } => {
                let action = action.into_action(self.clock.now());
                Ok(Outcome::Respond(self.strategies.store_offline_action(&action).await.response))
            }
            ControlMessage::ReplayActions => {
                self.queue.replay().await;
                Ok(Outcome::Completed)
            }
            ControlMessage::Unknown => {
                tracing::debug!("ignoring unknown control message");
                Ok(Outcome::Ignored)
            }
        }
    }

    /// The notification shown for a push payload.
    pub fn notification_for(&self, payload: Option<&str>) -> Notification {
        let body = payload.map(str::trim).filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PUSH_BODY);
        Notification {
            title: NOTIFICATION_TITLE.into(),
            body: body.into(),
            icon: self.style.icon.clone(),
            badge: self.style.badge.clone(),
            tag: NOTIFICATION_TAG.into(),
            url: "/".into(),
            actions: vec![
                NotificationAction { action: OPEN_ACTION.into(), title: "Open App".into() },
                NotificationAction { action: CLOSE_ACTION.into(), title: "Dismiss".into() },
            ],
        }
    }

    pub async fn handle_push(&self, payload: Option<&str>) -> Result<Outcome, Error> {
        self.host.show_notification(&self.notification_for(payload)).await?;
        Ok(Outcome::Completed)
    }

    /// Close the notification; the `open` action also focuses or opens the app.
    pub async fn handle_notification_click(&self, action: Option<&str>) -> Result<Outcome, Error> {
        self.host.close_notification(NOTIFICATION_TAG).await?;
        if action == Some(OPEN_ACTION) {
            let url = canonicalize(&self.origin, "/")?;
            self.host.focus_or_open(&url).await?;
        }
        Ok(Outcome::Completed)
    }
}
