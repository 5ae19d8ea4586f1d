//! Event loop for the JSON-lines transport.
//!
//! Reads envelopes, routes them to the engine, and writes one reply line per
//! event. Install and activate run inline so the next line is not read until
//! they finish; every other event runs on its own task so fetches proceed in
//! parallel. At end of input the loop waits for in-flight events.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

use quill_core::worker::{Router, Worker};

use crate::envelope::{Envelope, Reply};
use crate::error::ServerError;

/// Dispatches decoded events to a shared [`Worker`].
#[derive(Clone)]
pub struct EventLoop {
    worker: Arc<Worker>,
    router: Router,
    out: UnboundedSender<String>,
}

impl EventLoop {
    pub fn new(worker: Arc<Worker>, router: Router, out: UnboundedSender<String>) -> Self {
        Self { worker, router, out }
    }

    /// Process `input` until end of stream.
    pub async fn run<R>(self, input: R) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut in_flight = JoinSet::new();
        let mut handled = 0u64;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            handled += 1;

            let envelope = match Envelope::parse(line) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(error = %e, "rejecting malformed event line");
                    self.emit(Reply::error(Value::Null, &e));
                    continue;
                }
            };

            if envelope.event.is_lifecycle() {
                self.handle(envelope).await;
            } else {
                let this = self.clone();
                in_flight.spawn(async move { this.handle(envelope).await });
            }

            while let Some(done) = in_flight.try_join_next() {
                if let Err(e) = done {
                    tracing::error!(error = %e, "event task failed");
                }
            }
        }

        tracing::debug!(in_flight = in_flight.len(), "input closed, draining events");
        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                tracing::error!(error = %e, "event task failed");
            }
        }

        tracing::info!(handled, "event loop finished");
        Ok(())
    }

    async fn handle(&self, envelope: Envelope) {
        let id = envelope.id.clone();
        let name = envelope.event;

        let result = match envelope.into_event(self.worker.origin()) {
            Ok(event) => self.router.dispatch(self.worker.clone(), event).await.map_err(ServerError::from),
            Err(e) => Err(e),
        };

        let reply = match result {
            Ok(outcome) => Reply::outcome(id, outcome),
            Err(e) => {
                tracing::warn!(event = ?name, error = %e, "event failed");
                Reply::error(id, &e)
            }
        };
        self.emit(reply);
    }

    fn emit(&self, reply: Reply) {
        match reply.to_line() {
            Ok(line) => {
                if self.out.send(line).is_err() {
                    tracing::warn!("output stream closed, dropping reply");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to encode reply"),
        }
    }
}

/// Drain `lines` to `writer`, one per line, until every sender is dropped.
pub async fn write_lines<W>(mut lines: UnboundedReceiver<String>, mut writer: W) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
