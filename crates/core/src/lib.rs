//! Core types and shared functionality for quill.
//!
//! This crate provides:
//! - Versioned response cache partitions with a SQLite backend
//! - Request classification and the four caching strategies
//! - The durable offline action queue and its replay
//! - The `Worker` event surface and its router
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod queue;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testing;

pub use cache::{CacheDb, CacheNamespaces, CachedEntry, PartitionKind};
pub use config::AppConfig;
pub use error::Error;
pub use http::{Request, Response};
pub use worker::{Event, Outcome, Router, Worker};
