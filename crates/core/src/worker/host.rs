//! The hosting runtime's side of the control plane.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// A notification button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A notification the host should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Replaces an earlier notification with the same tag.
    pub tag: String,
    /// Page opened by the `open` action.
    pub url: String,
    pub actions: Vec<NotificationAction>,
}

/// Operations only the hosting runtime can perform.
///
/// Each call is fire-and-forget relative to the fetch pipeline.
#[async_trait::async_trait]
pub trait Host: Send + Sync {
    /// Promote this worker version without waiting for old clients to close.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Take control of pages that are already open.
    async fn claim_clients(&self) -> Result<(), Error>;

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error>;

    async fn close_notification(&self, tag: &str) -> Result<(), Error>;

    /// Focus a client already showing `url`, or open a new window on it.
    async fn focus_or_open(&self, url: &Url) -> Result<(), Error>;
}
