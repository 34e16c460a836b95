use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::merge::{carry_pool_state, merge_stored, validate_import};
use super::persistence::SettingsRepository;
use super::types::SettingsDocument;
use crate::bus::ChangeBus;
use crate::error::{DomainResult, ValidationError};

/// The only writer of the settings document.
///
/// Edits accumulate in a working copy. [`save`](Self::save) persists the
/// whole document and then publishes one change per section on the
/// [`ChangeBus`], unchanged sections included. If persisting fails nothing is
/// published and the working copy is kept for another attempt.
pub struct SettingsService {
    repository: Arc<SettingsRepository>,
    bus: Arc<ChangeBus>,
    persisted: RwLock<SettingsDocument>,
    working: RwLock<SettingsDocument>,
}

impl SettingsService {
    pub fn new(repository: Arc<SettingsRepository>, bus: Arc<ChangeBus>) -> Self {
        Self {
            repository,
            bus,
            persisted: RwLock::new(SettingsDocument::default()),
            working: RwLock::new(SettingsDocument::default()),
        }
    }

    /// Reloads from storage and resets the working copy. Never fails; a
    /// storage error yields defaults.
    pub async fn load(&self) -> SettingsDocument {
        let document = self.repository.load_document().await;
        *self.persisted.write().await = document.clone();
        *self.working.write().await = document.clone();
        debug!("settings loaded into service");
        document
    }

    /// The document as last loaded or saved.
    pub async fn current(&self) -> SettingsDocument {
        self.persisted.read().await.clone()
    }

    pub async fn working_copy(&self) -> SettingsDocument {
        self.working.read().await.clone()
    }

    /// Applies `edit` to the working copy. Nothing is persisted or published.
    pub async fn edit<F>(&self, edit: F)
    where
        F: FnOnce(&mut SettingsDocument),
    {
        let mut working = self.working.write().await;
        edit(&mut working);
    }

    pub async fn is_dirty(&self) -> bool {
        *self.working.read().await != *self.persisted.read().await
    }

    /// Drops unsaved edits.
    pub async fn discard(&self) {
        let persisted = self.persisted.read().await.clone();
        *self.working.write().await = persisted;
    }

    /// Persists the working copy. Background pool bookkeeping written to the
    /// store since the last load or save is carried over unless edited.
    pub async fn save(&self) -> DomainResult<()> {
        let mut document = self.working.read().await.clone();
        match self.repository.try_load_document().await {
            Ok(stored) => {
                let persisted = self.persisted.read().await;
                carry_pool_state(&mut document.background, &persisted.background, &stored.background);
            }
            Err(e) => warn!(error = %e, "could not re-read stored settings; saving the working copy as is"),
        }
        *self.working.write().await = document.clone();
        self.persist_and_publish(document).await
    }

    /// Replaces the working copy with `document` and saves it.
    pub async fn save_document(&self, document: SettingsDocument) -> DomainResult<()> {
        *self.working.write().await = document.clone();
        self.persist_and_publish(document).await
    }

    /// Saves the default document, keeping unknown top-level keys.
    pub async fn reset_to_defaults(&self) -> DomainResult<()> {
        let extra = self.persisted.read().await.extra.clone();
        info!("resetting settings to defaults");
        self.save_document(SettingsDocument { extra, ..Default::default() }).await
    }

    /// Pretty-printed JSON of the persisted document.
    pub async fn export_json(&self) -> DomainResult<String> {
        Ok(serde_json::to_string_pretty(&*self.persisted.read().await)?)
    }

    /// Validates, merges and saves an exported document. On any failure the
    /// stored document and the working copy are left as they were.
    pub async fn import_json(&self, text: &str) -> DomainResult<()> {
        let candidate: JsonValue = serde_json::from_str(text)
            .map_err(|e| ValidationError::MalformedDocument(e.to_string()))?;
        validate_import(&candidate).map_err(|e| {
            warn!(error = %e, "rejected settings import");
            e
        })?;

        let document = merge_stored(Some(candidate));
        let previous_working = self.working.read().await.clone();
        let result = self.save_document(document).await;
        if result.is_err() {
            *self.working.write().await = previous_working;
        }
        result
    }

    async fn persist_and_publish(&self, document: SettingsDocument) -> DomainResult<()> {
        self.repository.save_document(&document).await?;
        *self.persisted.write().await = document.clone();

        // No lock is held while handlers run.
        let mut delivered = 0;
        for change in document.changes() {
            delivered += self.bus.publish(change);
        }
        info!(delivered, "settings saved and published");
        Ok(())
    }
}
