//! Host operations emitted as command lines on stdout.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use quill_core::Error;
use quill_core::worker::{Host, Notification};

/// A command the embedding runtime is asked to perform.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "host", rename_all = "snake_case")]
pub enum HostCommand<'a> {
    SkipWaiting,
    ClaimClients,
    ShowNotification { notification: &'a Notification },
    CloseNotification { tag: &'a str },
    FocusOrOpen { url: &'a str },
}

/// [`Host`] that writes each command as a JSON line to the output stream.
pub struct StdioHost {
    out: UnboundedSender<String>,
}

impl StdioHost {
    pub fn new(out: UnboundedSender<String>) -> Self {
        Self { out }
    }

    fn send(&self, command: &HostCommand<'_>) -> Result<(), Error> {
        let line = serde_json::to_string(command)?;
        self.out.send(line).map_err(|_| Error::Host("output stream closed".into()))
    }
}

#[async_trait::async_trait]
impl Host for StdioHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.send(&HostCommand::SkipWaiting)
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.send(&HostCommand::ClaimClients)
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.send(&HostCommand::ShowNotification { notification })
    }

    async fn close_notification(&self, tag: &str) -> Result<(), Error> {
        self.send(&HostCommand::CloseNotification { tag })
    }

    async fn focus_or_open(&self, url: &Url) -> Result<(), Error> {
        self.send(&HostCommand::FocusOrOpen { url: url.as_str() })
    }
}
