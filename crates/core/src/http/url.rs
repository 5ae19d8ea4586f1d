//! URL canonicalization for consistent cache keys and origin-relative paths.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for crate::Error {
    fn from(err: UrlError) -> Self {
        crate::Error::InvalidUrl(err.to_string())
    }
}

/// Resolve `input` against `origin` and canonicalize it.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative paths (`/api/journal`) against the origin
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let h = host.to_lowercase();
        parsed
            .set_host(Some(h.as_str()))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// True for the schemes the engine is willing to intercept.
pub fn is_http(url: &url::Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("https://journal.test").unwrap()
    }

    #[test]
    fn test_canonicalize_relative_path() {
        let url = canonicalize(&origin(), "/api/journal").unwrap();
        assert_eq!(url.as_str(), "https://journal.test/api/journal");
    }

    #[test]
    fn test_canonicalize_absolute_keeps_other_host() {
        let url = canonicalize(&origin(), "https://CDN.example.com/font.woff2").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize(&origin(), "/entries#today").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/entries");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize(&origin(), "/api/entries?page=2&sort=desc").unwrap();
        assert_eq!(url.query(), Some("page=2&sort=desc"));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize(&origin(), "chrome-extension://abc/script.js");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_is_http() {
        assert!(is_http(&origin()));
        assert!(!is_http(&url::Url::parse("chrome-extension://abc/x.js").unwrap()));
    }
}
