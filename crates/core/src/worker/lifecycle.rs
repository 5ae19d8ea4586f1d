//! Install and activate handling.

use futures_util::future::join_all;
use url::Url;

use super::Worker;
use crate::Error;
use crate::cache::{CachedEntry, PartitionKind};
use crate::clock::Clock;
use crate::http::Request;

/// Result of a bulk population of one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheReport {
    pub stored: Vec<String>,
    pub failed: Vec<String>,
}

impl Worker {
    /// Populate the static partition with the application shell, then ask the
    /// host to promote this version right away.
    ///
    /// A precache item that fails to fetch is logged and skipped; only a
    /// failure to open the partition fails the install.
    pub async fn install(&self) -> Result<PrecacheReport, Error> {
        let report = self.add_all(PartitionKind::Static, &self.precache).await?;

        if let Err(e) = self.host.skip_waiting().await {
            tracing::warn!(error = %e, "host refused skip_waiting");
        }

        tracing::info!(
            version = self.namespaces.set().version(),
            stored = report.stored.len(),
            failed = report.failed.len(),
            "worker installed"
        );
        Ok(report)
    }

    /// Delete partitions left over from earlier versions and take control of
    /// already-open pages.
    ///
    /// Returns the names of the deleted partitions.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let evicted = self.namespaces.evict_superseded(&self.namespaces.set().current()).await?;

        if let Err(e) = self.host.claim_clients().await {
            tracing::warn!(error = %e, "host refused claim_clients");
        }

        tracing::info!(version = self.namespaces.set().version(), evicted = evicted.len(), "worker activated");
        Ok(evicted)
    }

    /// Fetch every URL and store the 2xx answers in the partition for `kind`.
    ///
    /// Items are fetched concurrently and stored independently.
    pub async fn add_all(&self, kind: PartitionKind, urls: &[Url]) -> Result<PrecacheReport, Error> {
        let partition = self.namespaces.open(kind).await?;

        let outcomes = join_all(urls.iter().map(|url| {
            let partition = &partition;
            async move {
                let response = self.network.fetch(&Request::get(url.clone())).await?;
                if !response.is_ok() {
                    return Err(Error::Network(format!("status {}", response.status)));
                }
                partition.put(&CachedEntry::from_response(url, &response, self.clock.now())).await
            }
        }))
        .await;

        let mut report = PrecacheReport::default();
        for (url, outcome) in urls.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.stored.push(url.to_string()),
                Err(e) => {
                    tracing::warn!(%url, partition = partition.name(), error = %e, "failed to cache url");
                    report.failed.push(url.to_string());
                }
            }
        }
        Ok(report)
    }
}
