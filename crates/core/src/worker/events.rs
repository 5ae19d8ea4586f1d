//! Event entry points and their outcomes.

use crate::http::{Request, Response};

use super::control::ControlMessage;

/// One event delivered by the host.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    /// Background sync. Carries only the registration tag; the payload lives in the queue.
    Sync { tag: String },
    Push { payload: Option<String> },
    NotificationClick { action: Option<String> },
    Message(ControlMessage),
}

/// Discriminant used as the router's table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Sync,
    Push,
    NotificationClick,
    Message,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Install => EventKind::Install,
            Event::Activate => EventKind::Activate,
            Event::Fetch(_) => EventKind::Fetch,
            Event::Sync { .. } => EventKind::Sync,
            Event::Push { .. } => EventKind::Push,
            Event::NotificationClick { .. } => EventKind::NotificationClick,
            Event::Message(_) => EventKind::Message,
        }
    }
}

/// What the host should do once a handler's future settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event's work is done.
    Completed,
    /// Answer the page with this response.
    Respond(Response),
    /// Let the request go to the network untouched.
    Passthrough,
    /// The engine does not handle this event; apply the host default.
    Ignored,
}
