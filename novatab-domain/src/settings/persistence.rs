//! Typed access to the persisted documents.
//!
//! [`SettingsRepository`] wraps a [`ConfigStore`] and knows the four keys the
//! dashboard uses. Reads that feed rendering (`load_*`) fail soft: a storage
//! or decode failure is logged and defaults are returned. Writes return the
//! storage error so explicit user actions can report it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use novatab_core::store::ConfigStore;
use serde_json::Value as JsonValue;
use tracing::{debug, error, warn};

use super::merge::merge_stored;
use super::types::{SettingsDocument, SettingsSection};
use crate::error::DomainResult;
use crate::modules::pinned_apps::PinnedApp;
use crate::modules::stats::StatsData;

pub const SETTINGS_KEY: &str = "settingsDocument";
pub const PINNED_APPS_KEY: &str = "pinnedApps";
pub const STATS_KEY: &str = "statsData";
pub const INSTALL_DATE_KEY: &str = "installDate";

pub struct SettingsRepository {
    store: Arc<dyn ConfigStore>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// Reads and merges the settings document, propagating storage failures.
    pub async fn try_load_document(&self) -> DomainResult<SettingsDocument> {
        let stored = self.store.get(SETTINGS_KEY).await?;
        Ok(merge_stored(stored))
    }

    /// Reads and merges the settings document; any storage failure yields
    /// the default document.
    pub async fn load_document(&self) -> SettingsDocument {
        match self.try_load_document().await {
            Ok(document) => document,
            Err(e) => {
                error!(error = %e, "failed to load settings document; using defaults");
                SettingsDocument::default()
            }
        }
    }

    /// Loads a single section, defaulting on failure.
    pub async fn load_section<S: SettingsSection>(&self) -> S {
        S::from_document(&self.load_document().await).clone()
    }

    pub async fn save_document(&self, document: &SettingsDocument) -> DomainResult<()> {
        let value = serde_json::to_value(document)?;
        self.store.set(SETTINGS_KEY, value).await?;
        debug!("settings document saved");
        Ok(())
    }

    /// Read-modify-write of the stored document without a change
    /// notification. Used for bookkeeping fields such as pool cursors.
    pub async fn update_document<F>(&self, update: F) -> DomainResult<SettingsDocument>
    where
        F: FnOnce(&mut SettingsDocument),
    {
        let mut document = self.try_load_document().await?;
        update(&mut document);
        self.save_document(&document).await?;
        Ok(document)
    }

    pub async fn load_pinned_apps(&self) -> Vec<PinnedApp> {
        let stored = match self.store.get(PINNED_APPS_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(error = %e, "failed to load pinned apps");
                return Vec::new();
            }
        };
        match stored {
            Some(JsonValue::Array(entries)) => entries
                .into_iter()
                .filter_map(|entry| match serde_json::from_value::<PinnedApp>(entry) {
                    Ok(app) => Some(app),
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable pinned app entry");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                warn!(value = %other, "pinned apps value is not a list; ignoring");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    pub async fn save_pinned_apps(&self, apps: &[PinnedApp]) -> DomainResult<()> {
        let value = serde_json::to_value(apps)?;
        self.store.set(PINNED_APPS_KEY, value).await?;
        Ok(())
    }

    pub async fn load_stats(&self) -> StatsData {
        match self.store.get(STATS_KEY).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "stored usage statistics are unreadable; starting fresh");
                StatsData::default()
            }),
            Ok(None) => StatsData::default(),
            Err(e) => {
                error!(error = %e, "failed to load usage statistics");
                StatsData::default()
            }
        }
    }

    pub async fn save_stats(&self, stats: &StatsData) -> DomainResult<()> {
        let value = serde_json::to_value(stats)?;
        self.store.set(STATS_KEY, value).await?;
        Ok(())
    }

    /// Returns the recorded install date, recording `now` on first use.
    pub async fn install_date(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.store.get(INSTALL_DATE_KEY).await {
            Ok(Some(JsonValue::String(raw))) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(date) => return date.with_timezone(&Utc),
                Err(e) => warn!(value = %raw, error = %e, "unreadable install date; resetting"),
            },
            Ok(Some(other)) => warn!(value = %other, "install date is not a string; resetting"),
            Ok(None) => debug!("no install date recorded yet"),
            Err(e) => {
                error!(error = %e, "failed to read install date");
                return now;
            }
        }
        if let Err(e) = self.store.set(INSTALL_DATE_KEY, JsonValue::String(now.to_rfc3339())).await {
            error!(error = %e, "failed to record install date");
        }
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::settings::types::{ClockSettings, TimeFormat};
    use crate::test_support::MockStore;
    use chrono::TimeZone;
    use novatab_core::store::MemoryConfigStore;
    use novatab_core::StoreError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn repository_with(entries: Vec<(&str, JsonValue)>) -> (Arc<MemoryConfigStore>, SettingsRepository) {
        let store = Arc::new(MemoryConfigStore::with_entries(entries));
        (store.clone(), SettingsRepository::new(store))
    }

    #[tokio::test]
    async fn test_load_document_fails_soft_on_storage_error() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::NotAvailable("sync backend offline".into())));
        let repository = SettingsRepository::new(Arc::new(store));

        assert_eq!(repository.load_document().await, SettingsDocument::default());
        assert!(repository.try_load_document().await.is_err());
    }

    #[tokio::test]
    async fn test_load_section_reads_stored_values() {
        let (_, repository) = repository_with(vec![(SETTINGS_KEY, json!({ "clock": { "format": "24" } }))]);
        let clock: ClockSettings = repository.load_section().await;
        assert_eq!(clock.format, TimeFormat::TwentyFourHour);
    }

    #[tokio::test]
    async fn test_update_document_normalises_and_keeps_extras() {
        let (store, repository) = repository_with(vec![(
            SETTINGS_KEY,
            json!({ "background": { "type": "upload" }, "weather": true }),
        )]);

        repository
            .update_document(|doc| doc.background.upload.current_index = 3)
            .await
            .unwrap();

        let saved = store.get(SETTINGS_KEY).await.unwrap().unwrap();
        assert_eq!(saved["background"]["type"], json!("upload"));
        assert_eq!(saved["background"]["uploadSettings"]["currentIndex"], json!(3));
        assert_eq!(saved["weather"], json!(true));
        assert_eq!(saved["clock"]["format"], json!("12"));
    }

    #[tokio::test]
    async fn test_update_document_does_not_overwrite_after_failed_read() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::NotAvailable("offline".into())));
        store.expect_set().never();
        let repository = SettingsRepository::new(Arc::new(store));

        let result = repository.update_document(|doc| doc.clock.hidden = true).await;
        assert!(matches!(result, Err(DomainError::Storage(_))));
    }

    #[tokio::test]
    async fn test_pinned_apps_skip_unreadable_entries() {
        let (_, repository) = repository_with(vec![(
            PINNED_APPS_KEY,
            json!([
                { "name": "Mail", "url": "https://mail.example.com", "icon": "" },
                { "name": 42 },
                { "name": "Docs", "url": "https://docs.example.com" }
            ]),
        )]);

        let apps = repository.load_pinned_apps().await;
        let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Mail", "Docs"]);
        assert_ne!(apps[0].id, apps[1].id);
    }

    #[tokio::test]
    async fn test_install_date_is_recorded_once() {
        let (store, repository) = repository_with(vec![]);
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap();

        assert_eq!(repository.install_date(first).await, first);
        assert_eq!(repository.install_date(later).await, first);
        assert!(store.get(INSTALL_DATE_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unreadable_stats_start_fresh() {
        let (_, repository) = repository_with(vec![(STATS_KEY, json!("corrupt"))]);
        assert_eq!(repository.load_stats().await, StatsData::default());
    }
}
