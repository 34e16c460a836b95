//! Defaulting and merge rules for the stored settings document.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use super::types::{ApiSettings, BackgroundSettings, SettingsDocument, SettingsSection, SECTION_KEYS};
use crate::error::ValidationError;

/// Builds a full document from whatever was stored.
///
/// A present section is read over its defaults, with serde filling in any
/// fields it lacks. A field whose stored value cannot be read takes its
/// default on its own; its siblings, nested subsections and unknown keys are
/// kept. An absent section takes the default. Unknown top-level keys are kept.
pub fn merge_stored(stored: Option<JsonValue>) -> SettingsDocument {
    let mut object = match stored {
        Some(JsonValue::Object(object)) => object,
        Some(other) => {
            warn!(kind = json_kind(&other), "stored settings document is not an object; using defaults");
            return SettingsDocument::default();
        }
        None => return SettingsDocument::default(),
    };

    let clock = take_section(&mut object);
    let apps = take_section(&mut object);
    let background = take_section(&mut object);
    let stats = take_section(&mut object);

    SettingsDocument { clock, apps, background, stats, extra: object }
}

fn take_section<S: SettingsSection>(object: &mut Map<String, JsonValue>) -> S {
    match object.remove(S::KEY) {
        None | Some(JsonValue::Null) => S::default(),
        Some(JsonValue::Object(fields)) => match serde_json::from_value(JsonValue::Object(fields.clone())) {
            Ok(section) => section,
            Err(e) => {
                warn!(section = S::KEY, error = %e, "stored section has unreadable fields; defaulting them");
                salvage_section(fields)
            }
        },
        Some(other) => {
            warn!(section = S::KEY, kind = json_kind(&other), "stored section is not an object; using defaults");
            S::default()
        }
    }
}

/// Reads `stored` field by field over the section defaults, dropping only
/// the values that keep the section from deserializing.
fn salvage_section<S: SettingsSection>(stored: Map<String, JsonValue>) -> S {
    let Ok(mut root) = serde_json::to_value(S::default()) else {
        return S::default();
    };
    overlay_readable::<S>(&mut root, &mut Vec::new(), stored);
    serde_json::from_value(root).unwrap_or_default()
}

fn overlay_readable<S: DeserializeOwned>(root: &mut JsonValue, path: &mut Vec<String>, stored: Map<String, JsonValue>) {
    for (key, value) in stored {
        let Some(target) = object_at(root, path) else { return };
        let previous = target.insert(key.clone(), value.clone());
        if serde_json::from_value::<S>(root.clone()).is_ok() {
            continue;
        }

        let Some(target) = object_at(root, path) else { return };
        match &previous {
            Some(default) => target.insert(key.clone(), default.clone()),
            None => target.remove(&key),
        };
        match (value, previous) {
            (JsonValue::Object(fields), Some(JsonValue::Object(_))) => {
                path.push(key);
                overlay_readable::<S>(root, path, fields);
                path.pop();
            }
            _ => {
                path.push(key);
                warn!(field = %path.join("."), "dropping unreadable stored value");
                path.pop();
            }
        }
    }
}

fn object_at<'a>(root: &'a mut JsonValue, path: &[String]) -> Option<&'a mut Map<String, JsonValue>> {
    path.iter()
        .try_fold(root, |node, key| node.get_mut(key.as_str()))?
        .as_object_mut()
}

/// Overlays the fields of `incoming` onto `current`: fields present in
/// `incoming` win, the rest of `current` is kept.
pub fn shallow_merge<T>(current: &T, incoming: &T) -> T
where
    T: Serialize + DeserializeOwned + Clone,
{
    let (Ok(JsonValue::Object(mut base)), Ok(JsonValue::Object(overlay))) =
        (serde_json::to_value(current), serde_json::to_value(incoming))
    else {
        return incoming.clone();
    };
    base.extend(overlay);
    serde_json::from_value(JsonValue::Object(base)).unwrap_or_else(|e| {
        warn!(error = %e, "shallow merge produced an unreadable section; taking incoming value");
        incoming.clone()
    })
}

/// Carries the pool bookkeeping the background module writes straight to
/// the store (upload cursor, cached API images and their cursor) from
/// `stored` into `working`. A field the user changed since `persisted` keeps
/// the edited value. A changed image search drops the API cache instead.
pub fn carry_pool_state(working: &mut BackgroundSettings, persisted: &BackgroundSettings, stored: &BackgroundSettings) {
    if working.upload.current_index == persisted.upload.current_index {
        working.upload.current_index = stored.upload.current_index;
    }

    let api_untouched =
        working.api.images == persisted.api.images && working.api.current_index == persisted.api.current_index;
    if !api_untouched {
        return;
    }
    if same_image_search(&working.api, &stored.api) {
        working.api.images = stored.api.images.clone();
        working.api.current_index = stored.api.current_index;
    } else {
        working.api.images.clear();
        working.api.current_index = 0;
    }
}

fn same_image_search(a: &ApiSettings, b: &ApiSettings) -> bool {
    a.source == b.source && a.query == b.query && a.api_key == b.api_key
}

/// Checks an imported document: it must be an object carrying all four
/// section keys. Field values are not inspected.
pub fn validate_import(candidate: &JsonValue) -> Result<(), ValidationError> {
    let object = candidate.as_object().ok_or_else(|| {
        ValidationError::MalformedDocument(format!("expected a JSON object, found {}", json_kind(candidate)))
    })?;
    for key in SECTION_KEYS {
        if !object.contains_key(key) {
            return Err(ValidationError::MissingSection(key.to_string()));
        }
    }
    Ok(())
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
