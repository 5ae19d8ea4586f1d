//! Wire types for the JSON-lines event protocol.
//!
//! Input (one per stdin line):
//! `{"id": .., "event": "fetch", "request": {"method", "url", "headers", "destination", "body" | "body_base64"}}`,
//! `{"id": .., "event": "sync", "tag": ".."}`, `{"id": .., "event": "message", "data": {"type": ..}}`, ...
//!
//! Output (one per stdout line): `{"id": .., "outcome": "respond", "response": {..}}`
//! or `{"id": .., "error": ".."}`.
//!
//! Bodies travel as `body` when they are valid UTF-8 and as standard
//! base64 in `body_base64` otherwise, so binary payloads survive intact.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use quill_core::http::{Destination, Headers, Request, Response};
use quill_core::worker::{ControlMessage, Event, Outcome};

use crate::error::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventName {
    Install,
    Activate,
    Fetch,
    Sync,
    Push,
    NotificationClick,
    Message,
}

impl EventName {
    /// Install and activate must finish before the next line is read.
    pub fn is_lifecycle(self) -> bool {
        matches!(self, EventName::Install | EventName::Activate)
    }
}

/// A fetched request as the host describes it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Binary body; wins over `body` when both are present.
    #[serde(default)]
    pub body_base64: Option<String>,
}

impl WireRequest {
    fn body_bytes(&self) -> Result<Bytes, ServerError> {
        match (&self.body_base64, &self.body) {
            (Some(encoded), _) => BASE64
                .decode(encoded)
                .map(Bytes::from)
                .map_err(|e| ServerError::InvalidEnvelope(format!("request.body_base64: {e}"))),
            (None, Some(text)) => Ok(Bytes::from(text.clone())),
            (None, None) => Ok(Bytes::new()),
        }
    }
}

fn default_method() -> String {
    "GET".into()
}

/// One input line.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Value,
    pub event: EventName,
    #[serde(default)]
    pub request: Option<WireRequest>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn parse(line: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Build the engine event. Relative request URLs resolve against `origin`.
    pub fn into_event(self, origin: &Url) -> Result<Event, ServerError> {
        let event = match self.event {
            EventName::Install => Event::Install,
            EventName::Activate => Event::Activate,
            EventName::Fetch => {
                let wire = self.request.ok_or_else(|| missing("request"))?;
                let url = origin
                    .join(&wire.url)
                    .map_err(|e| ServerError::InvalidEnvelope(format!("request.url {:?}: {e}", wire.url)))?;
                let body = wire.body_bytes()?;
                let mut request = Request::get(url).with_destination(Destination::parse(&wire.destination));
                request.method = wire.method.to_ascii_uppercase();
                for (name, value) in wire.headers {
                    request = request.with_header(&name, value);
                }
                request.body = body;
                Event::Fetch(request)
            }
            EventName::Sync => Event::Sync { tag: self.tag.ok_or_else(|| missing("tag"))? },
            EventName::Push => Event::Push {
                payload: match self.payload {
                    None | Some(Value::Null) => None,
                    Some(Value::String(text)) => Some(text),
                    Some(other) => Some(other.to_string()),
                },
            },
            EventName::NotificationClick => Event::NotificationClick { action: self.action },
            EventName::Message => {
                let data = self.data.ok_or_else(|| missing("data"))?;
                Event::Message(serde_json::from_value::<ControlMessage>(data)?)
            }
        };
        Ok(event)
    }
}

fn missing(field: &str) -> ServerError {
    ServerError::InvalidEnvelope(format!("missing field `{field}`"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireResponse {
    pub status: u16,
    pub headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_base64: Option<String>,
}

impl From<Response> for WireResponse {
    fn from(response: Response) -> Self {
        let (body, body_base64) = match std::str::from_utf8(&response.body) {
            Ok(text) => (Some(text.to_owned()), None),
            Err(_) => (None, Some(BASE64.encode(&response.body))),
        };
        Self { status: response.status, headers: response.headers, body, body_base64 }
    }
}

/// One output line answering an event.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<WireResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn outcome(id: Value, outcome: Outcome) -> Self {
        let (name, response) = match outcome {
            Outcome::Completed => ("completed", None),
            Outcome::Respond(response) => ("respond", Some(response.into())),
            Outcome::Passthrough => ("passthrough", None),
            Outcome::Ignored => ("ignored", None),
        };
        Self { id, outcome: Some(name), response, error: None }
    }

    pub fn error(id: Value, err: &ServerError) -> Self {
        Self { id, outcome: None, response: None, error: Some(err.to_string()) }
    }

    pub fn to_line(&self) -> Result<String, ServerError> {
        serde_json::to_string(self).map_err(|e| ServerError::Task(format!("failed to encode reply: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PNG_HEADER: [u8; 10] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00];

    fn origin() -> Url {
        Url::parse("https://journal.test").unwrap()
    }

    #[test]
    fn test_fetch_envelope() {
        let line = r#"{"id":7,"event":"fetch","request":{"url":"/entries","headers":{"Accept":"text/html"},"destination":"document"}}"#;
        let envelope = Envelope::parse(line).unwrap();
        assert_eq!(envelope.id, json!(7));

        let Event::Fetch(request) = envelope.into_event(&origin()).unwrap() else { panic!("expected fetch") };
        assert_eq!(request.method, "GET");
        assert_eq!(request.url.as_str(), "https://journal.test/entries");
        assert_eq!(request.header("accept"), Some("text/html"));
        assert_eq!(request.destination, Destination::Document);
    }

    #[test]
    fn test_fetch_body_forms() {
        let line = r#"{"id":1,"event":"fetch","request":{"method":"post","url":"/api/journal","body":"{\"a\":1}"}}"#;
        let Event::Fetch(request) = Envelope::parse(line).unwrap().into_event(&origin()).unwrap() else {
            panic!("expected fetch")
        };
        assert_eq!(request.method, "POST");
        assert_eq!(request.body.as_ref(), br#"{"a":1}"#);

        let line = r#"{"id":2,"event":"fetch","request":{"method":"PUT","url":"/api/photo","body_base64":"iVBORw0KGgr/AA=="}}"#;
        let Event::Fetch(request) = Envelope::parse(line).unwrap().into_event(&origin()).unwrap() else {
            panic!("expected fetch")
        };
        assert_eq!(request.body.as_ref(), &PNG_HEADER);
    }

    #[test]
    fn test_fetch_rejects_malformed_base64() {
        let line = r#"{"id":1,"event":"fetch","request":{"method":"PUT","url":"/api/photo","body_base64":"not base64!"}}"#;
        let result = Envelope::parse(line).unwrap().into_event(&origin());
        assert!(matches!(result, Err(ServerError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_binary_response_body_is_byte_exact() {
        let response = Response::new(200, Headers::new(), Bytes::from_static(&PNG_HEADER));
        let line = Reply::outcome(json!(9), Outcome::Respond(response)).to_line().unwrap();

        let value: Value = serde_json::from_str(&line).unwrap();
        assert!(value["response"].get("body").is_none());
        let encoded = value["response"]["body_base64"].as_str().unwrap();
        assert_eq!(BASE64.decode(encoded).unwrap(), PNG_HEADER);
    }

    #[test]
    fn test_fetch_keeps_foreign_scheme() {
        let line = r#"{"id":1,"event":"fetch","request":{"url":"chrome-extension://abc/x.js"}}"#;
        let Event::Fetch(request) = Envelope::parse(line).unwrap().into_event(&origin()).unwrap() else {
            panic!("expected fetch")
        };
        assert_eq!(request.url.scheme(), "chrome-extension");
    }

    #[test]
    fn test_fetch_without_request_is_rejected() {
        let envelope = Envelope::parse(r#"{"id":1,"event":"fetch"}"#).unwrap();
        assert!(matches!(envelope.into_event(&origin()), Err(ServerError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_message_envelope() {
        let line = r#"{"id":"m1","event":"message","data":{"type":"CACHE_URLS","urls":["/a"]}}"#;
        let event = Envelope::parse(line).unwrap().into_event(&origin()).unwrap();
        assert!(matches!(event, Event::Message(ControlMessage::CacheUrls { urls }) if urls == vec!["/a"]));
    }

    #[test]
    fn test_push_payload_object_is_stringified() {
        let line = r#"{"id":2,"event":"push","payload":{"n":1}}"#;
        let event = Envelope::parse(line).unwrap().into_event(&origin()).unwrap();
        assert!(matches!(event, Event::Push { payload: Some(p) } if p == r#"{"n":1}"#));
    }

    #[test]
    fn test_notificationclick_name() {
        let envelope = Envelope::parse(r#"{"event":"notificationclick","action":"open"}"#).unwrap();
        assert_eq!(envelope.event, EventName::NotificationClick);
        assert_eq!(envelope.id, Value::Null);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(Envelope::parse(r#"{"id":1,"event":"periodicsync"}"#).is_err());
    }

    #[test]
    fn test_reply_shapes() {
        let line = Reply::outcome(json!(3), Outcome::Passthrough).to_line().unwrap();
        assert_eq!(line, r#"{"id":3,"outcome":"passthrough"}"#);

        let reply = Reply::outcome(json!(4), Outcome::Respond(Response::not_found()));
        let value: Value = serde_json::from_str(&reply.to_line().unwrap()).unwrap();
        assert_eq!(value["outcome"], "respond");
        assert_eq!(value["response"]["status"], 404);
        assert_eq!(value["response"]["body"], "");
        assert!(value["response"].get("body_base64").is_none());

        let err = ServerError::InvalidEnvelope("bad".into());
        assert_eq!(Reply::error(json!(5), &err).to_line().unwrap(), r#"{"id":5,"error":"INVALID_INPUT: bad"}"#);
    }
}
