//! Shared test doubles.

use async_trait::async_trait;
use mockall::mock;
use novatab_core::store::ConfigStore;
use novatab_core::StoreError;
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::{DomainResult, NetworkError};
use crate::modules::background::{ImageLoader, ImageSearchClient};
use crate::modules::pinned_apps::FaviconProbe;
use crate::settings::types::ApiSource;

mock! {
    pub Store {}

    #[async_trait]
    impl ConfigStore for Store {
        async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError>;
        async fn set(&self, key: &str, value: JsonValue) -> Result<(), StoreError>;
        async fn remove(&self, key: &str) -> Result<(), StoreError>;
    }
}

mock! {
    pub Favicon {}

    #[async_trait]
    impl FaviconProbe for Favicon {
        async fn probe(&self, page: &Url) -> Result<String, NetworkError>;
    }
}

mock! {
    pub Search {}

    #[async_trait]
    impl ImageSearchClient for Search {
        async fn fetch_batch(
            &self,
            source: ApiSource,
            api_key: &str,
            query: &str,
            count: u32,
        ) -> Result<Vec<String>, NetworkError>;
    }
}

mock! {
    pub Loader {}

    #[async_trait]
    impl ImageLoader for Loader {
        async fn preload(&self, uri: &str) -> DomainResult<()>;
    }
}
