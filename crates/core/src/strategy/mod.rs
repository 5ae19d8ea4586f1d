//! Strategy executors.
//!
//! Each request moves through
//! `DISPATCHED -> (CACHE_HIT | CACHE_MISS) -> NETWORK_ATTEMPT -> (SUCCESS | FAILURE) -> RESPONSE_RETURNED`.
//! Every executor resolves to an HTTP-shaped response: network errors are
//! recovered from the cache or turned into a synthesized response, never
//! propagated to the page.
//!
//! | Class          | Executor                       | Partition |
//! |----------------|--------------------------------|-----------|
//! | Static         | cache-first                    | static    |
//! | Image          | cache-first                    | images    |
//! | Api            | stale-while-revalidate + TTL   | api       |
//! | Html, Other    | network-first                  | dynamic   |
//! | (page call)    | offline-action-store           | queue     |

mod cache_first;
mod network_first;
mod offline_store;
mod stale_while_revalidate;

use std::sync::Arc;

use chrono::Duration;
use url::Url;

use crate::cache::{CacheNamespaces, CachedEntry, PartitionKind};
use crate::classify::ResourceClass;
use crate::clock::Clock;
use crate::http::{Request, Response};
use crate::network::Network;
use crate::queue::OfflineQueue;

/// Where a returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Live network response.
    Network,
    /// Cache hit served without touching the network.
    Cache,
    /// Cached entry served because the network failed.
    CacheFallback,
    /// Root document served as the offline shell for an HTML request.
    OfflineShell,
    /// Response built by the engine (404, 503, 202).
    Synthesized,
}

/// A response together with its provenance.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ServedFrom,
}

impl Served {
    fn new(response: Response, source: ServedFrom) -> Self {
        Self { response, source }
    }
}

/// Tunables for the executors.
#[derive(Debug, Clone)]
pub struct StrategySettings {
    /// Scope used to resolve the root document.
    pub origin: Url,
    /// Freshness window of the API lane.
    pub api_ttl: Duration,
    pub dynamic_max_entries: usize,
    pub image_max_entries: usize,
}

/// The four executors sharing one set of partitions.
#[derive(Clone)]
pub struct Strategies {
    namespaces: CacheNamespaces,
    network: Arc<dyn Network>,
    clock: Arc<dyn Clock>,
    queue: OfflineQueue,
    settings: StrategySettings,
}

impl Strategies {
    pub fn new(
        namespaces: CacheNamespaces, network: Arc<dyn Network>, clock: Arc<dyn Clock>, queue: OfflineQueue,
        settings: StrategySettings,
    ) -> Self {
        Self { namespaces, network, clock, queue, settings }
    }

    /// Serve `request` through the executor for its class.
    pub async fn execute(&self, request: &Request, class: ResourceClass) -> Served {
        let served = match class {
            ResourceClass::Static => self.cache_first(request, PartitionKind::Static).await,
            ResourceClass::Image => self.cache_first(request, PartitionKind::Images).await,
            ResourceClass::Api => self.stale_while_revalidate(request).await,
            ResourceClass::Html | ResourceClass::Other => self.network_first(request, class).await,
        };
        tracing::debug!(url = %request.url, ?class, source = ?served.source, status = served.response.status, "served");
        served
    }

    /// Fetch `request`, reducing any failure to `None`.
    ///
    /// Transport failures are the offline case and log at debug; anything
    /// else (an oversized body, a malformed request) is logged as a warning.
    async fn fetch(&self, request: &Request) -> Option<Response> {
        match self.network.fetch(request).await {
            Ok(response) => Some(response),
            Err(e) if e.is_network() => {
                tracing::debug!(url = %request.url, error = %e, "network unavailable");
                None
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "fetch failed");
                None
            }
        }
    }

    /// Look up `request` in one partition. Storage errors count as a miss.
    async fn lookup(&self, kind: PartitionKind, request: &Request) -> Option<CachedEntry> {
        let result = match self.namespaces.open(kind).await {
            Ok(partition) => partition.get(&request.url).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(url = %request.url, ?kind, error = %e, "cache lookup failed");
            None
        })
    }

    /// Write `entry` through to a partition and apply its LRU bound.
    /// Storage errors are logged; the caller still gets its response.
    async fn write_through(&self, kind: PartitionKind, entry: CachedEntry) {
        let bound = match kind {
            PartitionKind::Dynamic => Some(self.settings.dynamic_max_entries),
            PartitionKind::Images => Some(self.settings.image_max_entries),
            PartitionKind::Static | PartitionKind::Api => None,
        };

        let result = async {
            let partition = self.namespaces.open(kind).await?;
            partition.put(&entry).await?;
            if let Some(max) = bound {
                let trimmed = partition.trim(max).await?;
                if trimmed > 0 {
                    tracing::debug!(partition = partition.name(), trimmed, "trimmed partition");
                }
            }
            Ok::<(), crate::Error>(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(url = %entry.url, ?kind, error = %e, "cache write failed");
        }
    }
}
