//! Channel between the page and the panel
//!
//! Messages are named `keyboard-nav-visualizer/<event>` and carry JSON
//! payloads. The tracker only sees the typed side: it produces [`NavEvent`]s
//! through an [`Emitter`] and consumes decoded [`InboundMessage`]s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scanner::TabOrderEntry;
use crate::settings::SettingsPatch;

/// Prefix of every event name
pub const ADDON_ID: &str = "keyboard-nav-visualizer";

/// Event names
pub mod events {
    pub const TOGGLE: &str = "keyboard-nav-visualizer/toggle";
    pub const KEY_PRESSED: &str = "keyboard-nav-visualizer/key-pressed";
    pub const FOCUS_CHANGED: &str = "keyboard-nav-visualizer/focus-changed";
    pub const TAB_ORDER: &str = "keyboard-nav-visualizer/tab-order";
    pub const UPDATE_SETTINGS: &str = "keyboard-nav-visualizer/update-settings";
}

/// Channel errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Malformed payload for {event}: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot encode {event}: {source}")]
    Encode {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A named message as it travels over the channel
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub payload: Value,
}

impl Message {
    pub fn new(name: &str, payload: Value) -> Self {
        Self { name: name.to_string(), payload }
    }
}

/// `key-pressed` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: String,
    pub code: String,
    pub timestamp: u64,
    /// Description of the event target
    pub target: String,
}

/// `focus-changed` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusChange {
    /// Description of the newly focused element
    pub element: String,
    pub timestamp: u64,
}

/// `tab-order` payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabOrder {
    pub elements: Vec<TabOrderEntry>,
}

/// Events the tracker emits. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    KeyPressed(KeyPress),
    FocusChanged(FocusChange),
    TabOrderUpdated(TabOrder),
}

impl NavEvent {
    /// Channel name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeyPressed(_) => events::KEY_PRESSED,
            Self::FocusChanged(_) => events::FOCUS_CHANGED,
            Self::TabOrderUpdated(_) => events::TAB_ORDER,
        }
    }

    /// JSON payload of this event
    pub fn payload(&self) -> Result<Value, ChannelError> {
        let encoded = match self {
            Self::KeyPressed(p) => serde_json::to_value(p),
            Self::FocusChanged(p) => serde_json::to_value(p),
            Self::TabOrderUpdated(p) => serde_json::to_value(p),
        };
        encoded.map_err(|source| ChannelError::Encode { event: self.name(), source })
    }

    pub fn to_message(&self) -> Result<Message, ChannelError> {
        Ok(Message::new(self.name(), self.payload()?))
    }

    /// Decode an outbound message (panel side)
    pub fn decode(name: &str, payload: &Value) -> Result<Self, ChannelError> {
        let malformed = |source: serde_json::Error| ChannelError::Payload { event: name.to_string(), source };
        match name {
            events::KEY_PRESSED => KeyPress::deserialize(payload).map(Self::KeyPressed).map_err(malformed),
            events::FOCUS_CHANGED => FocusChange::deserialize(payload).map(Self::FocusChanged).map_err(malformed),
            events::TAB_ORDER => TabOrder::deserialize(payload).map(Self::TabOrderUpdated).map_err(malformed),
            other => Err(ChannelError::UnknownEvent(other.to_string())),
        }
    }
}

/// Messages the tracker accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Toggle { enabled: bool },
    UpdateSettings(SettingsPatch),
}

#[derive(Deserialize)]
struct TogglePayload {
    enabled: bool,
}

impl InboundMessage {
    pub fn decode(name: &str, payload: &Value) -> Result<Self, ChannelError> {
        match name {
            events::TOGGLE => TogglePayload::deserialize(payload)
                .map(|p| Self::Toggle { enabled: p.enabled })
                .map_err(|source| ChannelError::Payload { event: name.to_string(), source }),
            events::UPDATE_SETTINGS => Ok(Self::UpdateSettings(SettingsPatch::from_json(payload))),
            other => Err(ChannelError::UnknownEvent(other.to_string())),
        }
    }

    pub fn to_message(&self) -> Result<Message, ChannelError> {
        match self {
            Self::Toggle { enabled } => Ok(Message::new(events::TOGGLE, serde_json::json!({ "enabled": enabled }))),
            Self::UpdateSettings(patch) => serde_json::to_value(patch)
                .map(|payload| Message::new(events::UPDATE_SETTINGS, payload))
                .map_err(|source| ChannelError::Encode { event: events::UPDATE_SETTINGS, source }),
        }
    }
}

/// Where the tracker sends its events
pub trait Emitter {
    fn emit(&mut self, event: NavEvent);
}

/// Collects events in order
impl Emitter for Vec<NavEvent> {
    fn emit(&mut self, event: NavEvent) {
        self.push(event);
    }
}

/// Subscription handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&Value)>;

/// In-process named publish/subscribe channel
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<String, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
    sent: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.handlers.keys().collect::<Vec<_>>())
            .field("sent", &self.sent)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event name
    pub fn on(&mut self, name: &str, handler: impl FnMut(&Value) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(name.to_string())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Unsubscribe
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for handlers in self.handlers.values_mut() {
            let before = handlers.len();
            handlers.retain(|(sub, _)| *sub != id);
            removed |= handlers.len() < before;
        }
        removed
    }

    /// Deliver a message to its subscribers, in subscription order
    pub fn publish(&mut self, message: &Message) {
        self.sent += 1;
        let Some(handlers) = self.handlers.get_mut(&message.name) else {
            tracing::trace!("No subscribers for {}", message.name);
            return;
        };
        for (_, handler) in handlers.iter_mut() {
            handler(&message.payload);
        }
    }

    /// Messages published so far
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl Emitter for EventBus {
    fn emit(&mut self, event: NavEvent) {
        match event.to_message() {
            Ok(message) => self.publish(&message),
            Err(err) => tracing::warn!("Dropping event: {}", err),
        }
    }
}
