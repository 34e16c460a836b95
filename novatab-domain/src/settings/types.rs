//! The persisted settings document.
//!
//! Field names follow the stored JSON (`camelCase`). Every struct is
//! `#[serde(default)]` so missing fields fall back to their defaults, and each
//! carries a flattened `extra` map so fields written by newer versions survive
//! a load/save cycle untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::bus::{SettingsChange, Topic};

/// Top-level keys every settings document must carry.
pub const SECTION_KEYS: [&str; 4] = ["clock", "apps", "background", "stats"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12")]
    TwelveHour,
    #[serde(rename = "24")]
    TwentyFourHour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Upload,
    #[default]
    Color,
    Gradient,
    Api,
}

/// When an uploaded-image pool advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CycleTrigger {
    /// Every page load, reloads included.
    Refresh,
    /// Only freshly opened tabs; a reload shows the current image again.
    #[default]
    NewTab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderPolicy {
    #[default]
    Random,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    #[default]
    Linear,
    Radial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiSource {
    #[default]
    Unsplash,
    Pexels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockSettings {
    pub format: TimeFormat,
    pub show_seconds: bool,
    pub show_date: bool,
    pub hidden: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            format: TimeFormat::TwelveHour,
            show_seconds: false,
            show_date: true,
            hidden: false,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppsSettings {
    pub show_names: bool,
    /// Tile padding in pixels.
    pub padding: u32,
    /// Tile opacity, `0.0..=1.0`.
    pub transparency: f32,
    pub grid_columns: u32,
    pub grid_rows: u32,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for AppsSettings {
    fn default() -> Self {
        Self {
            show_names: true,
            padding: 12,
            transparency: 0.95,
            grid_columns: 10,
            grid_rows: 2,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSettings {
    /// Data URIs of the uploaded images.
    pub images: Vec<String>,
    pub cycle: CycleTrigger,
    pub order: OrderPolicy,
    pub current_index: usize,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            cycle: CycleTrigger::NewTab,
            order: OrderPolicy::Random,
            current_index: 0,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorSettings {
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self { color: "#2d3436".to_string(), extra: Map::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradientSettings {
    #[serde(rename = "type")]
    pub kind: GradientType,
    pub color1: String,
    pub color2: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            kind: GradientType::Linear,
            color1: "#667eea".to_string(),
            color2: "#764ba2".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    pub source: ApiSource,
    pub api_key: String,
    pub query: String,
    /// Cached image URLs from the last successful fetch.
    pub images: Vec<String>,
    pub current_index: usize,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            source: ApiSource::Unsplash,
            api_key: String::new(),
            query: "nature".to_string(),
            images: Vec::new(),
            current_index: 0,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackgroundSettings {
    #[serde(rename = "type")]
    pub kind: BackgroundType,
    #[serde(rename = "uploadSettings")]
    pub upload: UploadSettings,
    #[serde(rename = "colorSettings")]
    pub color: ColorSettings,
    #[serde(rename = "gradientSettings")]
    pub gradient: GradientSettings,
    #[serde(rename = "apiSettings")]
    pub api: ApiSettings,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsSettings {
    pub enabled: bool,
    pub show_usage_time: bool,
    pub show_tabs_opened: bool,
    pub show_days_used: bool,
    pub show_trackers_blocked: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_usage_time: true,
            show_tabs_opened: true,
            show_days_used: true,
            show_trackers_blocked: true,
            extra: Map::new(),
        }
    }
}

/// The whole dashboard configuration as persisted under `settingsDocument`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDocument {
    pub clock: ClockSettings,
    pub apps: AppsSettings,
    pub background: BackgroundSettings,
    pub stats: StatsSettings,
    /// Unknown top-level keys, kept for forward compatibility.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SettingsDocument {
    /// One change notification per section, in section order.
    pub fn changes(&self) -> [SettingsChange; 4] {
        [
            SettingsChange::Clock(self.clock.clone()),
            SettingsChange::Apps(self.apps.clone()),
            SettingsChange::Background(self.background.clone()),
            SettingsChange::Stats(self.stats.clone()),
        ]
    }
}

/// A top-level section of [`SettingsDocument`] with its own change topic.
pub trait SettingsSection: Clone + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key of the section inside the stored document.
    const KEY: &'static str;
    const TOPIC: Topic;

    fn from_document(document: &SettingsDocument) -> &Self;
    fn into_change(self) -> SettingsChange;
    fn from_change(change: &SettingsChange) -> Option<&Self>;
}

macro_rules! impl_section {
    ($ty:ty, $key:literal, $field:ident, $variant:ident) => {
        impl SettingsSection for $ty {
            const KEY: &'static str = $key;
            const TOPIC: Topic = Topic::$variant;

            fn from_document(document: &SettingsDocument) -> &Self {
                &document.$field
            }

            fn into_change(self) -> SettingsChange {
                SettingsChange::$variant(self)
            }

            fn from_change(change: &SettingsChange) -> Option<&Self> {
                match change {
                    SettingsChange::$variant(section) => Some(section),
                    _ => None,
                }
            }
        }
    };
}

impl_section!(ClockSettings, "clock", clock, Clock);
impl_section!(AppsSettings, "apps", apps, Apps);
impl_section!(BackgroundSettings, "background", background, Background);
impl_section!(StatsSettings, "stats", stats, Stats);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_default_document_serializes_with_stored_field_names() {
        let value = serde_json::to_value(SettingsDocument::default()).unwrap();
        assert_eq!(value["clock"]["format"], json!("12"));
        assert_eq!(value["clock"]["showSeconds"], json!(false));
        assert_eq!(value["apps"]["gridColumns"], json!(10));
        assert_eq!(value["background"]["type"], json!("color"));
        assert_eq!(value["background"]["uploadSettings"]["cycle"], json!("newtab"));
        assert_eq!(value["background"]["gradientSettings"]["type"], json!("linear"));
        assert_eq!(value["background"]["apiSettings"]["source"], json!("unsplash"));
        assert_eq!(value["stats"]["showTrackersBlocked"], json!(true));
    }

    #[test]
    fn test_missing_fields_fall_back_inside_composite_subsections() {
        let background: BackgroundSettings = serde_json::from_value(json!({
            "type": "upload",
            "uploadSettings": { "images": ["data:image/png;base64,AAAA"], "order": "sequential" }
        }))
        .unwrap();

        assert_eq!(background.kind, BackgroundType::Upload);
        assert_eq!(background.upload.order, OrderPolicy::Sequential);
        assert_eq!(background.upload.cycle, CycleTrigger::NewTab);
        assert_eq!(background.upload.current_index, 0);
        assert_eq!(background.color, ColorSettings::default());
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let clock: ClockSettings = serde_json::from_value(json!({
            "format": "24",
            "timezone": "Europe/Berlin"
        }))
        .unwrap();
        assert_eq!(clock.format, TimeFormat::TwentyFourHour);
        assert_eq!(clock.extra.get("timezone"), Some(&json!("Europe/Berlin")));

        let back = serde_json::to_value(&clock).unwrap();
        assert_eq!(back["timezone"], json!("Europe/Berlin"));
    }

    #[test]
    fn test_section_trait_round_trips_change() {
        let clock = ClockSettings { show_seconds: true, ..Default::default() };
        let change = clock.clone().into_change();
        assert_eq!(change.topic(), Topic::Clock);
        assert_eq!(ClockSettings::from_change(&change), Some(&clock));
        assert_eq!(AppsSettings::from_change(&change), None);
    }

    #[test]
    fn test_changes_cover_every_section_in_order() {
        let topics: Vec<Topic> = SettingsDocument::default().changes().iter().map(|c| c.topic()).collect();
        assert_eq!(topics, vec![Topic::Clock, Topic::Apps, Topic::Background, Topic::Stats]);
    }
}
