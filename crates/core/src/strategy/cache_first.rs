//! Cache-first executor for static assets and images.

use super::{Served, ServedFrom, Strategies};
use crate::cache::{CachedEntry, PartitionKind};
use crate::clock::Clock;
use crate::http::{Request, Response};

impl Strategies {
    /// Serve from `kind` when present; otherwise fetch, write through, and return.
    ///
    /// A network failure on a miss yields an empty 404. There is no retry.
    pub async fn cache_first(&self, request: &Request, kind: PartitionKind) -> Served {
        if let Some(entry) = self.lookup(kind, request).await {
            return Served::new(entry.to_response(), ServedFrom::Cache);
        }

        match self.fetch(request).await {
            Some(response) => {
                if response.is_ok() {
                    let entry = CachedEntry::from_response(&request.url, &response, self.clock.now());
                    self.write_through(kind, entry).await;
                }
                Served::new(response, ServedFrom::Network)
            }
            None => Served::new(Response::not_found(), ServedFrom::Synthesized),
        }
    }
}
