//! The opaque backend boundary.

use crate::Error;
use crate::http::{Request, Response};

/// Performs a real network round trip.
///
/// `Ok` means the server answered, whatever the status. `Err` means the
/// request never produced an HTTP response (offline, DNS, reset, timeout).
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
