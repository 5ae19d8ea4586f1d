//! Stale-while-revalidate executor with a freshness window, for `/api/` calls.
//!
//! The freshness clock is the synthetic `sw-cache-time` header stamped when an
//! entry is written. An entry without a readable stamp is infinitely stale.

use chrono::{DateTime, Utc};

use super::{Served, ServedFrom, Strategies};
use crate::cache::{CachedEntry, PartitionKind};
use crate::clock::Clock;
use crate::http::{CACHE_TIME_HEADER, Request, Response, header_value};

impl Strategies {
    /// Serve fresh API data from the cache; otherwise revalidate over the network.
    ///
    /// 1. Fresh entry (`age < ttl`): return it, no network call
    /// 2. Stale or absent: fetch; on 2xx, store a stamped copy and return the live response
    /// 3. Network failure: return the cached entry regardless of age
    /// 4. Nothing cached: `503 {"error":"Network error"}`
    pub async fn stale_while_revalidate(&self, request: &Request) -> Served {
        let now = self.clock.now();
        let cached = self.lookup(PartitionKind::Api, request).await;

        if let Some(entry) = &cached
            && self.is_fresh(entry, now)
        {
            return Served::new(entry.to_response(), ServedFrom::Cache);
        }

        match self.fetch(request).await {
            Some(response) => {
                if response.is_ok() {
                    self.write_through(PartitionKind::Api, stamped(request, &response, now)).await;
                }
                Served::new(response, ServedFrom::Network)
            }
            None => match cached {
                Some(entry) => Served::new(entry.to_response(), ServedFrom::CacheFallback),
                None => Served::new(Response::network_error(), ServedFrom::Synthesized),
            },
        }
    }

    fn is_fresh(&self, entry: &CachedEntry, now: DateTime<Utc>) -> bool {
        match cache_time(entry) {
            Some(stored_at) => now - stored_at < self.settings.api_ttl,
            None => false,
        }
    }
}

/// Read the freshness stamp of an entry.
fn cache_time(entry: &CachedEntry) -> Option<DateTime<Utc>> {
    let raw = header_value(&entry.headers, CACHE_TIME_HEADER)?;
    DateTime::parse_from_rfc3339(raw).ok().map(|t| t.with_timezone(&Utc))
}

/// Copy of `response` carrying a fresh `sw-cache-time`. The live response is
/// left untouched; the stamp goes on a new header map.
fn stamped(request: &Request, response: &Response, now: DateTime<Utc>) -> CachedEntry {
    let mut headers = response.headers.clone();
    headers.insert(CACHE_TIME_HEADER.to_string(), now.to_rfc3339());
    let copy = Response { status: response.status, headers, body: response.body.clone() };
    CachedEntry::from_response(&request.url, &copy, now)
}
