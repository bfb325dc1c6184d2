//! Document-level event listeners
//!
//! Listeners are registered on the document itself. Whether one of them sees
//! an event fired at a descendant depends on the event's bubbling behavior
//! and the listener's capture flag, as with `document.addEventListener`.

use crate::NodeId;

/// Event types the document dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    KeyDown,
    Focus,
    Blur,
}

impl EventType {
    /// Check if this event type can bubble
    pub fn bubbles(&self) -> bool {
        !matches!(self, EventType::Focus | EventType::Blur)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::KeyDown => "keydown",
            EventType::Focus => "focus",
            EventType::Blur => "blur",
        }
    }
}

/// Listener identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Listener options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self { capture: true }
    }
}

/// Key information carried by keyboard events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardData {
    /// `KeyboardEvent.key`
    pub key: String,
    /// `KeyboardEvent.code`
    pub code: String,
}

/// A dispatched event
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub event_type: EventType,
    /// Event target; `None` for synthetic events without one
    pub target: Option<NodeId>,
    pub keyboard: Option<KeyboardData>,
}

impl DomEvent {
    pub fn key_down(target: Option<NodeId>, key: &str, code: &str) -> Self {
        Self {
            event_type: EventType::KeyDown,
            target,
            keyboard: Some(KeyboardData {
                key: key.to_string(),
                code: code.to_string(),
            }),
        }
    }

    pub fn focus(target: Option<NodeId>) -> Self {
        Self { event_type: EventType::Focus, target, keyboard: None }
    }

    pub fn blur(target: Option<NodeId>) -> Self {
        Self { event_type: EventType::Blur, target, keyboard: None }
    }
}

#[derive(Debug, Clone, Copy)]
struct Registered {
    id: ListenerId,
    event_type: EventType,
    options: ListenerOptions,
}

/// Listener table of the document
#[derive(Debug, Default)]
pub(crate) struct EventListeners {
    listeners: Vec<Registered>,
    next_id: u64,
}

impl EventListeners {
    pub fn add(&mut self, event_type: EventType, options: ListenerOptions) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Registered { id, event_type, options });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() < before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners that observe `event`, in registration order
    pub fn matching(&self, event: &DomEvent) -> Vec<ListenerId> {
        // A target-less event is fired at the document itself
        let at_document = matches!(event.target, None | Some(NodeId::ROOT));
        self.listeners
            .iter()
            .filter(|l| l.event_type == event.event_type)
            .filter(|l| l.options.capture || at_document || event.event_type.bubbles())
            .map(|l| l.id)
            .collect()
    }
}
