//! Request classification.
//!
//! Assigns each intercepted request to exactly one strategy lane. Rules are
//! evaluated in order and the first match wins; the path-prefix rules come
//! before the `Accept` rule so an `/api/` call asking for HTML stays on the
//! API lane.

use crate::http::{Destination, Request, is_http};

/// Strategy lane for a request the engine handles itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// `/js/` and `/css/` assets. Cache-first against the static partition.
    Static,
    /// Image destinations. Cache-first against the images partition.
    Image,
    /// `/api/` calls. Stale-while-revalidate with TTL against the api partition.
    Api,
    /// Navigations and other HTML. Network-first with the root document as offline shell.
    Html,
    /// Everything else. Network-first.
    Other,
}

/// What the interception layer should do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Non-GET: hand the request to the network untouched.
    Bypass,
    /// Non-HTTP(S) scheme (extension URLs and the like): do not intercept.
    Ignore,
    /// Serve through the strategy for this class.
    Lane(ResourceClass),
}

/// Classify an intercepted request.
pub fn classify(request: &Request) -> Route {
    if !request.is_get() {
        return Route::Bypass;
    }
    if !is_http(&request.url) {
        return Route::Ignore;
    }

    let path = request.url.path();
    if path.starts_with("/api/") {
        return Route::Lane(ResourceClass::Api);
    }
    if path.starts_with("/js/") || path.starts_with("/css/") {
        return Route::Lane(ResourceClass::Static);
    }
    if request.destination == Destination::Image {
        return Route::Lane(ResourceClass::Image);
    }
    if request.header("accept").is_some_and(|accept| accept.contains("text/html")) {
        return Route::Lane(ResourceClass::Html);
    }

    Route::Lane(ResourceClass::Other)
}
