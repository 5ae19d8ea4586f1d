//! Offline-action-store executor: records a deferred mutation for later replay.

use super::{Served, ServedFrom, Strategies};
use crate::Error;
use crate::http::Response;
use crate::queue::OfflineAction;

impl Strategies {
    /// Queue `action` and answer `202 {"queued":true,"id":...}`.
    ///
    /// Invalid actions answer 400; storage failures answer 500. Either way
    /// the caller gets an HTTP-shaped response.
    pub async fn store_offline_action(&self, action: &OfflineAction) -> Served {
        let response = match self.queue.enqueue(action).await {
            Ok(()) => Response::json(202, &serde_json::json!({ "queued": true, "id": action.id })),
            Err(e @ (Error::InvalidInput(_) | Error::InvalidUrl(_))) => {
                Response::json(400, &serde_json::json!({ "error": e.to_string() }))
            }
            Err(e) => {
                tracing::warn!(id = %action.id, error = %e, "failed to queue offline action");
                Response::json(500, &serde_json::json!({ "error": "Storage error" }))
            }
        };
        Served::new(response, ServedFrom::Synthesized)
    }
}
