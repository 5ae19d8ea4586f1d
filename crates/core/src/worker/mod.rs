//! The engine as seen by its host.
//!
//! A `Worker` is built once from `AppConfig` and shared behind an `Arc`.
//! Events reach it through the [`Router`]; every handler returns a future
//! the host must drive to completion before treating the event as done,
//! otherwise a cache write or a queue replay may be lost.

mod control;
mod events;
mod host;
mod lifecycle;
mod router;

pub use control::{ActionPayload, ControlMessage};
pub use events::{Event, EventKind, Outcome};
pub use host::{Host, Notification, NotificationAction};
pub use lifecycle::PrecacheReport;
pub use router::{Handler, Router};

use std::sync::Arc;

use chrono::Duration;
use url::Url;

use crate::Error;
use crate::cache::{CacheDb, CacheNamespaces, PartitionSet};
use crate::classify::{Route, classify};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::http::{Request, canonicalize};
use crate::network::Network;
use crate::queue::OfflineQueue;
use crate::strategy::{Strategies, StrategySettings};

/// Icon and badge used for push notifications.
#[derive(Debug, Clone)]
struct NotificationStyle {
    icon: String,
    badge: String,
}

/// The offline caching and synchronization engine.
pub struct Worker {
    namespaces: CacheNamespaces,
    strategies: Strategies,
    queue: OfflineQueue,
    network: Arc<dyn Network>,
    clock: Arc<dyn Clock>,
    host: Arc<dyn Host>,
    origin: Url,
    precache: Vec<Url>,
    sync_tag: String,
    style: NotificationStyle,
}

impl Worker {
    /// Wire the engine from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the origin or a precache entry does not resolve.
    pub fn new(
        config: &AppConfig, db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn Host>, clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let precache = config
            .precache
            .iter()
            .map(|path| canonicalize(&origin, path).map_err(Error::from))
            .collect::<Result<Vec<_>, _>>()?;

        let namespaces = CacheNamespaces::new(db.clone(), PartitionSet::new(config.cache_version.clone()));
        let queue = OfflineQueue::new(db, network.clone(), origin.clone());
        let settings = StrategySettings {
            origin: origin.clone(),
            api_ttl: Duration::seconds(config.api_ttl_secs as i64),
            dynamic_max_entries: config.dynamic_max_entries,
            image_max_entries: config.image_max_entries,
        };
        let strategies = Strategies::new(namespaces.clone(), network.clone(), clock.clone(), queue.clone(), settings);

        Ok(Self {
            namespaces,
            strategies,
            queue,
            network,
            clock,
            host,
            origin,
            precache,
            sync_tag: config.sync_tag.clone(),
            style: NotificationStyle { icon: config.notification_icon.clone(), badge: config.notification_badge.clone() },
        })
    }

    pub fn namespaces(&self) -> &CacheNamespaces {
        &self.namespaces
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Intercept one request.
    pub async fn handle_fetch(&self, request: &Request) -> Outcome {
        match classify(request) {
            Route::Bypass => Outcome::Passthrough,
            Route::Ignore => Outcome::Ignored,
            Route::Lane(class) => Outcome::Respond(self.strategies.execute(request, class).await.response),
        }
    }

    /// Background sync trigger. Only the configured tag replays the queue.
    pub async fn handle_sync(&self, tag: &str) -> Outcome {
        if tag != self.sync_tag {
            tracing::debug!(tag, "ignoring unknown sync tag");
            return Outcome::Ignored;
        }
        self.queue.replay().await;
        Outcome::Completed
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::testing::{ManualClock, RecordingHost, ScriptedNetwork};

    pub(crate) struct Rig {
        pub worker: Arc<Worker>,
        pub network: Arc<ScriptedNetwork>,
        pub host: Arc<RecordingHost>,
        pub clock: Arc<ManualClock>,
        pub db: CacheDb,
    }

    pub(crate) fn config() -> AppConfig {
        AppConfig {
            origin: "https://journal.test".into(),
            cache_version: "2".into(),
            precache: vec!["/".into(), "/js/app.js".into(), "/css/styles.css".into()],
            ..Default::default()
        }
    }

    pub(crate) async fn rig_with(config: AppConfig) -> Rig {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = ScriptedNetwork::new();
        let host = RecordingHost::new();
        let clock = ManualClock::new();
        let worker = Worker::new(&config, db.clone(), network.clone(), host.clone(), clock.clone()).unwrap();
        Rig { worker: Arc::new(worker), network, host, clock, db }
    }

    pub(crate) async fn rig() -> Rig {
        rig_with(config()).await
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::rig;
    use super::*;
    use crate::http::Response;
    use crate::queue::OfflineAction;

    fn request(method: &str, url: &str) -> Request {
        let mut req = Request::get(Url::parse(url).unwrap());
        req.method = method.into();
        req
    }

    #[tokio::test]
    async fn test_fetch_bypasses_non_get() {
        let rig = rig().await;
        let outcome = rig.worker.handle_fetch(&request("POST", "https://journal.test/api/journal")).await;
        assert_eq!(outcome, Outcome::Passthrough);
        assert!(rig.network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_ignores_extension_scheme() {
        let rig = rig().await;
        let outcome = rig.worker.handle_fetch(&request("GET", "chrome-extension://abc/inject.js")).await;
        assert_eq!(outcome, Outcome::Ignored);
    }

    #[tokio::test]
    async fn test_fetch_offline_api_is_503() {
        let rig = rig().await;
        rig.network.set_offline(true);
        let outcome = rig.worker.handle_fetch(&request("GET", "https://journal.test/api/entries")).await;
        assert_eq!(outcome, Outcome::Respond(Response::network_error()));
    }

    #[tokio::test]
    async fn test_sync_with_other_tag_is_ignored() {
        let rig = rig().await;
        rig.worker.queue().enqueue(&OfflineAction::new("1", "POST", "/api/journal")).await.unwrap();

        assert_eq!(rig.worker.handle_sync("some-other-tag").await, Outcome::Ignored);
        assert!(rig.network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_new_rejects_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = Worker::new(
            &config,
            db,
            crate::testing::ScriptedNetwork::new(),
            crate::testing::RecordingHost::new(),
            crate::testing::ManualClock::new(),
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
