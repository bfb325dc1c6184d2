//! Visualizer settings
//!
//! One `Settings` value per page, shared by the tracker and the renderer
//! through a [`SettingsStore`] handle. Updates are shallow merges.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Feature toggles. Each flag is independent of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Draw the focus highlight at all
    pub show_overlay: bool,
    /// Draw numbered tab-order badges
    pub show_tab_index: bool,
    /// Move the highlight to follow focus
    pub highlight_focus: bool,
    /// Whether the panel keeps key/focus history
    pub track_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_overlay: true,
            show_tab_index: true,
            highlight_focus: true,
            track_history: true,
        }
    }
}

/// Partial settings; `None` leaves a flag untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_overlay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_tab_index: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_focus: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_history: Option<bool>,
}

impl SettingsPatch {
    /// Build a patch from a loosely typed payload.
    ///
    /// Present keys are coerced with JavaScript truthiness (`0`, `""` and
    /// `null` are false), unknown keys are ignored, and a non-object payload
    /// yields an empty patch.
    pub fn from_json(payload: &Value) -> Self {
        let Some(map) = payload.as_object() else {
            return Self::default();
        };
        let flag = |key: &str| map.get(key).map(truthy);
        Self {
            show_overlay: flag("showOverlay"),
            show_tab_index: flag("showTabIndex"),
            highlight_focus: flag("highlightFocus"),
            track_history: flag("trackHistory"),
        }
    }

    /// Merge onto `base`
    pub fn apply(&self, base: Settings) -> Settings {
        Settings {
            show_overlay: self.show_overlay.unwrap_or(base.show_overlay),
            show_tab_index: self.show_tab_index.unwrap_or(base.show_tab_index),
            highlight_focus: self.highlight_focus.unwrap_or(base.highlight_focus),
            track_history: self.track_history.unwrap_or(base.track_history),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Settings> for SettingsPatch {
    fn from(s: Settings) -> Self {
        Self {
            show_overlay: Some(s.show_overlay),
            show_tab_index: Some(s.show_tab_index),
            highlight_focus: Some(s.highlight_focus),
            track_history: Some(s.track_history),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Shared, live settings handle.
///
/// Clones observe the same value. Single-threaded by construction: the
/// tracker runs on the page's event loop.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    inner: Rc<Cell<Settings>>,
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        Self { inner: Rc::new(Cell::new(initial)) }
    }

    /// Current settings
    pub fn get(&self) -> Settings {
        self.inner.get()
    }

    /// Shallow-merge `patch` into the current settings
    pub fn update(&self, patch: SettingsPatch) {
        let merged = patch.apply(self.inner.get());
        tracing::debug!("Settings updated: {:?}", merged);
        self.inner.set(merged);
    }
}
