//! quill-worker entry point.
//!
//! Hosts the offline engine behind a JSON-lines transport: events arrive on
//! stdin, replies and host commands leave on stdout.
//! Logging goes to stderr to avoid interfering with the protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{BufReader, stdin, stdout};
use tokio::sync::mpsc::unbounded_channel;
use tracing_subscriber::EnvFilter;

use quill_client::{FetchClient, FetchConfig};
use quill_core::clock::SystemClock;
use quill_core::{AppConfig, CacheDb, Router, Worker};

mod envelope;
mod error;
mod handler;
mod host;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, origin = %config.origin, "Starting quill-worker on stdio");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);

    let (out, lines) = unbounded_channel();
    let writer = tokio::spawn(handler::write_lines(lines, stdout()));

    let host = Arc::new(host::StdioHost::new(out.clone()));
    let worker = Worker::new(&config, db, network, host, Arc::new(SystemClock))?;

    handler::EventLoop::new(Arc::new(worker), Router::standard(), out)
        .run(BufReader::new(stdin()))
        .await?;

    writer.await??;

    Ok(())
}
