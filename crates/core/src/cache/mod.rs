//! SQLite-backed storage for cache partitions.
//!
//! This module provides persistent, versioned response caches using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named partitions (`static-v1`, `api-v1`, ...) created on first use
//! - Entries keyed by a SHA-256 hash of method and URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Oldest-first trimming of bounded partitions

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use partitions::{CacheNamespaces, Partition, PartitionKind, PartitionSet};
