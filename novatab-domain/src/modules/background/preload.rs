//! Loading an image before it is shown.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::error::{DomainError, DomainResult};
use crate::http::check_status;

/// Loads an image off-screen. Only an image that loaded successfully is made
/// visible; any failure is [`DomainError::ImageUnavailable`].
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn preload(&self, uri: &str) -> DomainResult<()>;
}

fn unavailable(uri: &str, reason: impl Into<String>) -> DomainError {
    // Data URIs can be megabytes long.
    let shown: String = uri.chars().take(64).collect();
    DomainError::ImageUnavailable { uri: shown, reason: reason.into() }
}

/// Decodes `data:image/<type>;base64,<payload>` URIs.
pub fn decode_data_uri(uri: &str) -> DomainResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| unavailable(uri, "not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| unavailable(uri, "data URI has no payload"))?;
    let media_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| unavailable(uri, "data URI is not base64 encoded"))?;
    if !media_type.starts_with("image/") {
        return Err(unavailable(uri, format!("unsupported media type '{}'", media_type)));
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| unavailable(uri, e.to_string()))?;
    if bytes.is_empty() {
        return Err(unavailable(uri, "empty image"));
    }
    Ok(bytes)
}

/// Decodes data URIs locally and fetches http(s) URIs, requiring an
/// `image/*` content type.
pub struct HttpImageLoader {
    client: reqwest::Client,
}

impl HttpImageLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn preload(&self, uri: &str) -> DomainResult<()> {
        if uri.starts_with("data:") {
            let bytes = decode_data_uri(uri)?;
            debug!(bytes = bytes.len(), "decoded data URI image");
            return Ok(());
        }
        if !(uri.starts_with("https://") || uri.starts_with("http://")) {
            return Err(unavailable(uri, "unsupported scheme"));
        }

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| unavailable(uri, e.to_string()))?;
        let response = check_status(response).map_err(|e| unavailable(uri, e.to_string()))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(unavailable(uri, format!("content type '{}' is not an image", content_type)));
        }
        let body = response.bytes().await.map_err(|e| unavailable(uri, e.to_string()))?;
        if body.is_empty() {
            return Err(unavailable(uri, "empty image"));
        }
        debug!(uri, bytes = body.len(), "preloaded image");
        Ok(())
    }
}

/// Accepts any non-empty URI without loading it. For hosts that do their own
/// loading (a browser view) and for offline use.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughImageLoader;

#[async_trait]
impl ImageLoader for PassthroughImageLoader {
    async fn preload(&self, uri: &str) -> DomainResult<()> {
        if uri.trim().is_empty() {
            return Err(unavailable(uri, "empty URI"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    #[test]
    fn test_decode_valid_data_uri() {
        let bytes = decode_data_uri(PIXEL).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_decode_rejects_bad_data_uris() {
        for uri in [
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png,rawbytes",
            "data:image/png;base64,@@@",
            "data:image/png;base64,",
            "data:image/png;base64",
        ] {
            assert!(
                matches!(decode_data_uri(uri), Err(DomainError::ImageUnavailable { .. })),
                "accepted {uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_http_loader_handles_data_uris_and_schemes() {
        let client = reqwest::Client::builder().build().unwrap();
        let loader = HttpImageLoader::new(client);
        assert!(loader.preload(PIXEL).await.is_ok());
        assert!(loader.preload("ftp://example.com/a.png").await.is_err());
    }

    #[tokio::test]
    async fn test_passthrough_loader() {
        assert!(PassthroughImageLoader.preload("https://example.com/a.jpg").await.is_ok());
        assert!(PassthroughImageLoader.preload(" ").await.is_err());
    }
}
