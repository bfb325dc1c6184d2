//! Panel side of the channel
//!
//! Keeps what the inspector panel shows: recent key presses, recent focus
//! changes and the latest tab order. It also builds the messages its controls
//! send back to the page.

use std::collections::VecDeque;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::Value;

use crate::channel::{ChannelError, FocusChange, InboundMessage, KeyPress, Message, NavEvent};
use crate::scanner::TabOrderEntry;
use crate::settings::{Settings, SettingsPatch};

/// Key presses kept in history
pub const KEY_HISTORY_LIMIT: usize = 50;
/// Focus changes kept in history
pub const FOCUS_HISTORY_LIMIT: usize = 30;

/// A single toggle in the panel's settings section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ShowOverlay,
    ShowTabIndex,
    HighlightFocus,
    TrackHistory,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::ShowOverlay,
        SettingKey::ShowTabIndex,
        SettingKey::HighlightFocus,
        SettingKey::TrackHistory,
    ];

    /// Settings field this key controls
    pub fn field(self) -> &'static str {
        match self {
            Self::ShowOverlay => "showOverlay",
            Self::ShowTabIndex => "showTabIndex",
            Self::HighlightFocus => "highlightFocus",
            Self::TrackHistory => "trackHistory",
        }
    }

    fn flag(self, settings: &mut Settings) -> &mut bool {
        match self {
            Self::ShowOverlay => &mut settings.show_overlay,
            Self::ShowTabIndex => &mut settings.show_tab_index,
            Self::HighlightFocus => &mut settings.highlight_focus,
            Self::TrackHistory => &mut settings.track_history,
        }
    }
}

/// Panel state
#[derive(Debug, Clone, Default)]
pub struct NavPanel {
    settings: Settings,
    key_history: VecDeque<KeyPress>,
    focus_history: VecDeque<FocusChange>,
    tab_order: Vec<TabOrderEntry>,
}

impl NavPanel {
    pub fn new(settings: Settings) -> Self {
        Self { settings, ..Default::default() }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Key presses, newest first
    pub fn key_history(&self) -> impl Iterator<Item = &KeyPress> {
        self.key_history.iter()
    }

    /// Focus changes, newest first
    pub fn focus_history(&self) -> impl Iterator<Item = &FocusChange> {
        self.focus_history.iter()
    }

    pub fn tab_order(&self) -> &[TabOrderEntry] {
        &self.tab_order
    }

    /// Consume a message from the page
    pub fn handle(&mut self, name: &str, payload: &Value) -> Result<(), ChannelError> {
        let event = NavEvent::decode(name, payload)?;
        self.apply(event);
        Ok(())
    }

    pub fn apply(&mut self, event: NavEvent) {
        match event {
            NavEvent::KeyPressed(press) => {
                if self.settings.track_history {
                    push_capped(&mut self.key_history, press, KEY_HISTORY_LIMIT);
                }
            }
            NavEvent::FocusChanged(change) => {
                if self.settings.track_history {
                    push_capped(&mut self.focus_history, change, FOCUS_HISTORY_LIMIT);
                }
            }
            NavEvent::TabOrderUpdated(order) => self.tab_order = order.elements,
        }
    }

    /// Empty both histories. The tab order stays.
    pub fn clear_history(&mut self) {
        self.key_history.clear();
        self.focus_history.clear();
    }

    /// Flip one setting and build the `update-settings` message for the page
    pub fn toggle_setting(&mut self, key: SettingKey) -> Result<Message, ChannelError> {
        let flag = key.flag(&mut self.settings);
        *flag = !*flag;
        tracing::debug!("{} -> {}", key.field(), *flag);
        self.settings_message()
    }

    /// Full current settings as an `update-settings` message
    pub fn settings_message(&self) -> Result<Message, ChannelError> {
        InboundMessage::UpdateSettings(SettingsPatch::from(self.settings)).to_message()
    }
}

fn push_capped<T>(history: &mut VecDeque<T>, item: T, limit: usize) {
    history.push_front(item);
    history.truncate(limit);
}

/// `HH:MM:SS.mmm` in the viewer's local time for an event timestamp
pub fn format_timestamp(millis: u64) -> String {
    format_timestamp_in(millis, &Local)
}

/// `HH:MM:SS.mmm` in a given time zone
pub fn format_timestamp_in<Tz: TimeZone>(millis: u64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(tz).format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "--:--:--.---".to_string())
}

/// Toolbar button that turns tracking on and off
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toolbar {
    enabled: bool,
}

impl Toolbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip and build the `toggle` message
    pub fn toggle(&mut self) -> Result<Message, ChannelError> {
        self.enabled = !self.enabled;
        InboundMessage::Toggle { enabled: self.enabled }.to_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{events, TabOrder};
    use chrono::FixedOffset;
    use serde_json::json;

    fn press(n: u64) -> NavEvent {
        NavEvent::KeyPressed(KeyPress {
            key: "Tab".into(),
            code: "Tab".into(),
            timestamp: n,
            target: "body".into(),
        })
    }

    #[test]
    fn test_key_history_newest_first_and_capped() {
        let mut panel = NavPanel::default();
        for n in 0..60 {
            panel.apply(press(n));
        }
        let stamps: Vec<u64> = panel.key_history().map(|k| k.timestamp).collect();
        assert_eq!(stamps.len(), KEY_HISTORY_LIMIT);
        assert_eq!(stamps[0], 59);
        assert_eq!(stamps[KEY_HISTORY_LIMIT - 1], 10);
    }

    #[test]
    fn test_focus_history_capped() {
        let mut panel = NavPanel::default();
        for n in 0..40 {
            panel.apply(NavEvent::FocusChanged(FocusChange { element: format!("e{}", n), timestamp: n }));
        }
        assert_eq!(panel.focus_history().count(), FOCUS_HISTORY_LIMIT);
        assert_eq!(panel.focus_history().next().map(|f| f.element.as_str()), Some("e39"));
    }

    #[test]
    fn test_history_off_still_updates_order() {
        let mut panel = NavPanel::new(Settings { track_history: false, ..Default::default() });
        panel.apply(press(1));
        panel.apply(NavEvent::TabOrderUpdated(TabOrder {
            elements: vec![TabOrderEntry { index: 0, description: "a".into(), declared_tab_index: None }],
        }));
        assert_eq!(panel.key_history().count(), 0);
        assert_eq!(panel.tab_order().len(), 1);
    }

    #[test]
    fn test_clear_history() {
        let mut panel = NavPanel::default();
        panel.apply(press(1));
        panel.handle(events::FOCUS_CHANGED, &json!({"element": "a", "timestamp": 1})).unwrap();
        panel.clear_history();
        assert_eq!(panel.key_history().count(), 0);
        assert_eq!(panel.focus_history().count(), 0);
    }

    #[test]
    fn test_toggle_setting_sends_full_settings() {
        let mut panel = NavPanel::default();
        let message = panel.toggle_setting(SettingKey::ShowOverlay).unwrap();
        assert_eq!(message.name, events::UPDATE_SETTINGS);
        assert_eq!(
            message.payload,
            json!({"showOverlay": false, "showTabIndex": true, "highlightFocus": true, "trackHistory": true})
        );
        assert!(!panel.settings().show_overlay);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp_in(0, &Utc), "00:00:00.000");
        assert_eq!(format_timestamp_in(3_723_004, &Utc), "01:02:03.004");

        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(format_timestamp_in(3_723_004, &cet), "02:02:03.004");
    }

    #[test]
    fn test_format_timestamp_uses_local_zone() {
        let millis = 1_700_000_000_123;
        let expected = DateTime::<Utc>::from_timestamp_millis(millis as i64)
            .unwrap()
            .with_timezone(&Local)
            .format("%H:%M:%S%.3f")
            .to_string();
        assert_eq!(format_timestamp(millis), expected);
        assert!(format_timestamp(millis).ends_with(".123"));
    }

    #[test]
    fn test_toolbar_toggle() {
        let mut toolbar = Toolbar::new();
        let on = toolbar.toggle().unwrap();
        assert_eq!(on.name, events::TOGGLE);
        assert_eq!(on.payload, json!({"enabled": true}));
        assert_eq!(toolbar.toggle().unwrap().payload, json!({"enabled": false}));
        assert!(!toolbar.is_enabled());
    }

    #[test]
    fn test_rejects_inbound_names() {
        let mut panel = NavPanel::default();
        assert!(panel.handle(events::TOGGLE, &json!({"enabled": true})).is_err());
    }
}
