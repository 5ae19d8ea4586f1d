//! Network-first executor for HTML and everything unclassified.

use super::{Served, ServedFrom, Strategies};
use crate::cache::{CachedEntry, PartitionKind};
use crate::clock::Clock;
use crate::classify::ResourceClass;
use crate::http::{Request, Response};

impl Strategies {
    /// Try the network, writing 2xx answers through to the dynamic partition.
    ///
    /// When the network fails: any cached match for the exact request, then
    /// (HTML only) the root document as the offline shell, then an empty 404.
    pub async fn network_first(&self, request: &Request, class: ResourceClass) -> Served {
        if let Some(response) = self.fetch(request).await {
            if response.is_ok() {
                let entry = CachedEntry::from_response(&request.url, &response, self.clock.now());
                self.write_through(PartitionKind::Dynamic, entry).await;
            }
            return Served::new(response, ServedFrom::Network);
        }

        if let Some(entry) = self.match_anywhere(&request.url).await {
            return Served::new(entry.to_response(), ServedFrom::CacheFallback);
        }

        if class == ResourceClass::Html {
            match self.settings.origin.join("/") {
                Ok(root) => {
                    if let Some(shell) = self.match_anywhere(&root).await {
                        return Served::new(shell.to_response(), ServedFrom::OfflineShell);
                    }
                }
                Err(e) => tracing::warn!(origin = %self.settings.origin, error = %e, "cannot resolve root document"),
            }
        }

        Served::new(Response::not_found(), ServedFrom::Synthesized)
    }

    async fn match_anywhere(&self, url: &url::Url) -> Option<CachedEntry> {
        self.namespaces.match_any(url).await.unwrap_or_else(|e| {
            tracing::warn!(%url, error = %e, "cache lookup failed");
            None
        })
    }
}
