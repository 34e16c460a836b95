use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use url::Url;
use uuid::Uuid;

use crate::error::ValidationError;

/// A shortcut tile. `id` is assigned once at creation and never reused;
/// entries stored without one get a fresh id on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinnedApp {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub url: String,
    /// Image URL or data URI. Empty means "use the placeholder".
    #[serde(default)]
    pub icon: String,
    /// Fields written by newer versions, kept across list writes.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// User input for adding or editing an app.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppDraft {
    pub name: String,
    pub url: String,
    pub icon: Option<String>,
}

impl AppDraft {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into(), icon: None }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Trims the fields and checks that both are present and the URL is
    /// absolute.
    pub fn validate(&self) -> Result<ValidatedDraft, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        let raw_url = self.url.trim();
        if raw_url.is_empty() {
            return Err(ValidationError::EmptyField("url"));
        }
        let url = Url::parse(raw_url).map_err(|e| ValidationError::InvalidUrl {
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;
        let icon = self
            .icon
            .as_deref()
            .map(str::trim)
            .filter(|icon| !icon.is_empty())
            .map(str::to_string);
        Ok(ValidatedDraft { name: name.to_string(), url, icon })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub name: String,
    pub url: Url,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileIcon {
    Image(String),
    Placeholder(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppTile {
    pub id: Uuid,
    /// `None` when names are hidden.
    pub label: Option<String>,
    pub url: String,
    pub icon: TileIcon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppsView {
    pub tiles: Vec<AppTile>,
    /// Apps that do not fit in `columns * rows`.
    pub overflow: usize,
    pub columns: u32,
    pub padding_px: u32,
    pub opacity: f32,
}

/// First letter or digit of `name`, upper-cased; `?` when there is none.
pub fn placeholder_glyph(name: &str) -> char {
    name.chars()
        .find(|c| c.is_alphanumeric())
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}
