//! Third-party image search (Unsplash, Pexels).

use async_trait::async_trait;
use novatab_core::config::ImagesConfig;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::NetworkError;
use crate::http::check_status;
use crate::settings::types::ApiSource;

/// Unsplash rejects `count` above this.
pub const UNSPLASH_MAX_COUNT: u32 = 30;

/// Fetches a batch of landscape image URLs matching `query`.
#[async_trait]
pub trait ImageSearchClient: Send + Sync {
    async fn fetch_batch(
        &self,
        source: ApiSource,
        api_key: &str,
        query: &str,
        count: u32,
    ) -> Result<Vec<String>, NetworkError>;
}

pub struct HttpImageSearchClient {
    client: reqwest::Client,
    unsplash_endpoint: String,
    pexels_endpoint: String,
}

impl HttpImageSearchClient {
    pub fn new(client: reqwest::Client, images: &ImagesConfig) -> Self {
        Self {
            client,
            unsplash_endpoint: images.unsplash_endpoint.clone(),
            pexels_endpoint: images.pexels_endpoint.clone(),
        }
    }

    async fn get_json(&self, request: reqwest::RequestBuilder) -> Result<JsonValue, NetworkError> {
        let response = check_status(request.send().await?)?;
        response
            .json::<JsonValue>()
            .await
            .map_err(|e| NetworkError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ImageSearchClient for HttpImageSearchClient {
    async fn fetch_batch(
        &self,
        source: ApiSource,
        api_key: &str,
        query: &str,
        count: u32,
    ) -> Result<Vec<String>, NetworkError> {
        if api_key.trim().is_empty() {
            return Err(NetworkError::MissingApiKey(source));
        }
        debug!(?source, query, count, "fetching background images");

        let images = match source {
            ApiSource::Unsplash => {
                let count = count.clamp(1, UNSPLASH_MAX_COUNT).to_string();
                let request = self
                    .client
                    .get(&self.unsplash_endpoint)
                    .header(reqwest::header::AUTHORIZATION, format!("Client-ID {}", api_key))
                    .query(&[("query", query), ("count", count.as_str()), ("orientation", "landscape")]);
                parse_unsplash_response(&self.get_json(request).await?)?
            }
            ApiSource::Pexels => {
                let per_page = count.max(1).to_string();
                let request = self
                    .client
                    .get(&self.pexels_endpoint)
                    .header(reqwest::header::AUTHORIZATION, api_key)
                    .query(&[("query", query), ("per_page", per_page.as_str()), ("orientation", "landscape")]);
                parse_pexels_response(&self.get_json(request).await?)?
            }
        };
        info!(?source, fetched = images.len(), "background images fetched");
        Ok(images)
    }
}

/// `[{ "urls": { "full": "..." } }, ...]`
pub fn parse_unsplash_response(body: &JsonValue) -> Result<Vec<String>, NetworkError> {
    let photos = body
        .as_array()
        .ok_or_else(|| NetworkError::Parse("expected an array of photos".to_string()))?;
    Ok(photos
        .iter()
        .filter_map(|photo| photo.pointer("/urls/full").and_then(JsonValue::as_str))
        .map(str::to_string)
        .collect())
}

/// `{ "photos": [{ "src": { "large2x": "..." } }, ...] }`
pub fn parse_pexels_response(body: &JsonValue) -> Result<Vec<String>, NetworkError> {
    let photos = body
        .get("photos")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| NetworkError::Parse("missing 'photos' array".to_string()))?;
    Ok(photos
        .iter()
        .filter_map(|photo| photo.pointer("/src/large2x").and_then(JsonValue::as_str))
        .map(str::to_string)
        .collect())
}
