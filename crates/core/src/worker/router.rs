//! Event dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use super::{Event, EventKind, Outcome, Worker};
use crate::Error;

/// A registered event handler.
pub type Handler = fn(Arc<Worker>, Event) -> BoxFuture<'static, Result<Outcome, Error>>;

/// Maps each event kind to the handler that serves it.
///
/// A kind with no handler resolves to [`Outcome::Ignored`].
#[derive(Clone, Default)]
pub struct Router {
    table: HashMap<EventKind, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any earlier registration.
    pub fn route(mut self, kind: EventKind, handler: Handler) -> Self {
        self.table.insert(kind, handler);
        self
    }

    /// Every event kind wired to its `Worker` entry point.
    pub fn standard() -> Self {
        Self::new()
            .route(EventKind::Install, on_install)
            .route(EventKind::Activate, on_activate)
            .route(EventKind::Fetch, on_fetch)
            .route(EventKind::Sync, on_sync)
            .route(EventKind::Push, on_push)
            .route(EventKind::NotificationClick, on_notification_click)
            .route(EventKind::Message, on_message)
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.table.contains_key(&kind)
    }

    /// Run the handler registered for the event's kind.
    pub async fn dispatch(&self, worker: Arc<Worker>, event: Event) -> Result<Outcome, Error> {
        let kind = event.kind();
        match self.table.get(&kind) {
            Some(handler) => handler(worker, event).await,
            None => {
                tracing::debug!(?kind, "no handler registered");
                Ok(Outcome::Ignored)
            }
        }
    }
}

fn mismatch(expected: EventKind, event: &Event) -> Error {
    Error::InvalidInput(format!("{expected:?} handler received {:?} event", event.kind()))
}

fn on_install(worker: Arc<Worker>, _event: Event) -> BoxFuture<'static, Result<Outcome, Error>> {
    async move { worker.install().await.map(|_| Outcome::Completed) }.boxed()
}

fn on_activate(worker: Arc<Worker>, _event: Event) -> BoxFuture<'static, Result<Outcome, Error>> {
    async move { worker.activate().await.map(|_| Outcome::Completed) }.boxed()
}

fn on_fetch(worker: Arc<Worker>, event: Event) -> BoxFuture<'static, Result<Outcome, Error>> {
    async move {
        match event {
            Event::Fetch(request) => Ok(worker.handle_fetch(&request).await),
            other => Err(mismatch(EventKind::Fetch, &other)),
        }
    }
    .boxed()
}

fn on_sync(worker: Arc<Worker>, event: Event) -> BoxFuture<'static, Result<Outcome, Error>> {
    async move {
        match event {
            Event::Sync { tag } => Ok(worker.handle_sync(&tag).await),
            other => Err(mismatch(EventKind::Sync, &other)),
        }
    }
    .boxed()
}

fn on_push(worker: Arc<Worker>, event: Event) -> BoxFuture<'static, Result<Outcome, Error>> {
    async move {
        match event {
            Event::Push { payload } => worker.handle_push(payload.as_deref()).await,
            other => Err(mismatch(EventKind::Push, &other)),
        }
    }
    .boxed()
}

fn on_notification_click(worker: Arc<Worker>, event: Event) -> BoxFuture<'static, Result<Outcome, Error>> {
    async move {
        match event {
            Event::NotificationClick { action } => worker.handle_notification_click(action.as_deref()).await,
            other => Err(mismatch(EventKind::NotificationClick, &other)),
        }
    }
    .boxed()
}

fn on_message(worker: Arc<Worker>, event: Event) -> BoxFuture<'static, Result<Outcome, Error>> {
    async move {
        match event {
            Event::Message(message) => worker.handle_message(message).await,
            other => Err(mismatch(EventKind::Message, &other)),
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::super::ControlMessage;
    use super::super::fixtures::rig;
    use super::*;
    use crate::http::Request;
    use url::Url;

    #[tokio::test]
    async fn test_standard_handles_every_kind() {
        let router = Router::standard();
        for kind in [
            EventKind::Install,
            EventKind::Activate,
            EventKind::Fetch,
            EventKind::Sync,
            EventKind::Push,
            EventKind::NotificationClick,
            EventKind::Message,
        ] {
            assert!(router.handles(kind), "{kind:?} not routed");
        }
    }

    #[tokio::test]
    async fn test_unrouted_kind_is_ignored() {
        let rig = rig().await;
        let router = Router::new().route(EventKind::Install, on_install);

        let outcome = router.dispatch(rig.worker.clone(), Event::Push { payload: None }).await.unwrap();

        assert_eq!(outcome, Outcome::Ignored);
        assert!(rig.host.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_misrouted_event_is_rejected() {
        let rig = rig().await;
        let router = Router::new().route(EventKind::Push, on_sync);

        let result = router.dispatch(rig.worker.clone(), Event::Push { payload: None }).await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fetch_routes_to_strategy() {
        let rig = rig().await;
        rig.network.respond("GET", "/css/styles.css", 200, "body{}");
        let request = Request::get(Url::parse("https://journal.test/css/styles.css").unwrap());

        let outcome = Router::standard().dispatch(rig.worker.clone(), Event::Fetch(request)).await.unwrap();

        let Outcome::Respond(response) = outcome else { panic!("expected a response") };
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "body{}");
    }

    #[tokio::test]
    async fn test_queued_action_is_delivered_on_sync() {
        let rig = rig().await;
        let router = Router::standard();
        rig.network.respond("POST", "/api/journal", 201, r#"{"id":1}"#);
        let message: ControlMessage = serde_json::from_str(
            r#"{"type":"QUEUE_ACTION","action":{"id":"1","method":"POST","url":"/api/journal","body":{"text":"hi"}}}"#,
        )
        .unwrap();

        router.dispatch(rig.worker.clone(), Event::Message(message)).await.unwrap();
        assert_eq!(rig.db.pending_actions().await.unwrap()[0].storage_key(), "/offline-action-1");

        let outcome = router
            .dispatch(rig.worker.clone(), Event::Sync { tag: "sync-offline-actions".into() })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(rig.network.calls(), vec!["POST /api/journal"]);
        assert!(rig.db.pending_actions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_sequence() {
        let rig = rig().await;
        let router = Router::standard();
        rig.network.respond("GET", "/", 200, "<html>shell</html>");

        router.dispatch(rig.worker.clone(), Event::Install).await.unwrap();
        router.dispatch(rig.worker.clone(), Event::Activate).await.unwrap();

        assert_eq!(rig.host.commands(), vec!["skip_waiting", "claim_clients"]);
    }
}
