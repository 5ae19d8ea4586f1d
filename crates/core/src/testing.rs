//! Test doubles for the network, clock, and host seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use url::Url;

use crate::Error;
use crate::clock::Clock;
use crate::http::{Headers, Request, Response};
use crate::network::Network;
use crate::worker::{Host, Notification};

/// Clock that only moves when told to.
pub(crate) struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())))
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

enum Reply {
    Respond(Response),
    Fail,
    TooLarge,
}

/// Network double keyed by `"METHOD /path?query"`.
///
/// Unrouted requests answer an empty 404. Every call is recorded in order.
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Reply>>,
    offline: AtomicBool,
    requests: Mutex<Vec<Request>>,
}

fn route_key(method: &str, url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{} {}?{}", method.to_ascii_uppercase(), url.path(), q),
        None => format!("{} {}", method.to_ascii_uppercase(), url.path()),
    }
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self { routes: Mutex::new(HashMap::new()), offline: AtomicBool::new(false), requests: Mutex::new(Vec::new()) })
    }

    pub(crate) fn respond(&self, method: &str, path: &str, status: u16, body: &str) {
        let key = format!("{} {}", method.to_ascii_uppercase(), path);
        let response = Response::new(status, Headers::new(), body.to_string());
        self.routes.lock().unwrap().insert(key, Reply::Respond(response));
    }

    pub(crate) fn fail(&self, method: &str, path: &str) {
        let key = format!("{} {}", method.to_ascii_uppercase(), path);
        self.routes.lock().unwrap().insert(key, Reply::Fail);
    }

    pub(crate) fn too_large(&self, method: &str, path: &str) {
        let key = format!("{} {}", method.to_ascii_uppercase(), path);
        self.routes.lock().unwrap().insert(key, Reply::TooLarge);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| route_key(&r.method, &r.url)).collect()
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(request.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        match self.routes.lock().unwrap().get(&route_key(&request.method, &request.url)) {
            Some(Reply::Respond(response)) => Ok(response.clone()),
            Some(Reply::Fail) => Err(Error::Network(format!("connection reset: {}", request.url))),
            Some(Reply::TooLarge) => Err(Error::FetchTooLarge(format!("{} exceeds the body limit", request.url))),
            None => Ok(Response::not_found()),
        }
    }
}

/// Host that records every command it receives.
#[derive(Default)]
pub(crate) struct RecordingHost {
    commands: Mutex<Vec<String>>,
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingHost {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    fn record(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }
}

#[async_trait::async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.record("skip_waiting".into());
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.record("claim_clients".into());
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.record("show_notification".into());
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self, tag: &str) -> Result<(), Error> {
        self.record(format!("close_notification {tag}"));
        Ok(())
    }

    async fn focus_or_open(&self, url: &Url) -> Result<(), Error> {
        self.record(format!("focus_or_open {url}"));
        Ok(())
    }
}
