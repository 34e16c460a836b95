use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::NetworkError;
use crate::http::check_status;

/// Finds an icon for a page when the user did not supply one.
#[async_trait]
pub trait FaviconProbe: Send + Sync {
    /// Returns the URL of a reachable icon for `page`.
    async fn probe(&self, page: &Url) -> Result<String, NetworkError>;
}

/// `<origin>/favicon.ico` for http(s) pages.
pub fn favicon_url(page: &Url) -> Result<Url, NetworkError> {
    if !matches!(page.scheme(), "http" | "https") {
        return Err(NetworkError::Request(format!(
            "no favicon lookup for '{}' pages",
            page.scheme()
        )));
    }
    page.join("/favicon.ico").map_err(|e| NetworkError::Parse(e.to_string()))
}

/// Probes `<origin>/favicon.ico` with a HEAD request.
pub struct HttpFaviconProbe {
    client: reqwest::Client,
}

impl HttpFaviconProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FaviconProbe for HttpFaviconProbe {
    async fn probe(&self, page: &Url) -> Result<String, NetworkError> {
        let icon = favicon_url(page)?;
        let response = self.client.head(icon.clone()).send().await?;
        check_status(response)?;
        debug!(icon = %icon, "favicon found");
        Ok(icon.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favicon_url_uses_origin() {
        let page = Url::parse("https://news.example.com/world/today?x=1").unwrap();
        assert_eq!(favicon_url(&page).unwrap().as_str(), "https://news.example.com/favicon.ico");

        let with_port = Url::parse("http://localhost:8080/app").unwrap();
        assert_eq!(favicon_url(&with_port).unwrap().as_str(), "http://localhost:8080/favicon.ico");
    }

    #[test]
    fn test_favicon_url_rejects_other_schemes() {
        let page = Url::parse("chrome://extensions").unwrap();
        assert!(matches!(favicon_url(&page), Err(NetworkError::Request(_))));
    }
}
