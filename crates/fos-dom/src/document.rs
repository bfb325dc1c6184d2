//! Document - High-level document API
//!
//! Owns the tree plus the page-level state that is not part of it: viewport
//! scroll offset, the focused element and document-level listeners.

use crate::events::EventListeners;
use crate::{DOMRect, DomError, DomEvent, DomResult, DomTree, EventType, ListenerId, ListenerOptions, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
    /// Viewport scroll offset (`window.scrollX` / `window.scrollY`)
    scroll: (f64, f64),
    /// Focused element
    active_element: Option<NodeId>,
    listeners: EventListeners,
}

impl Document {
    /// Create a new document with `<html><head/><body/></html>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes under the root cannot violate the hierarchy
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            scroll: (0.0, 0.0),
            active_element: None,
            listeners: EventListeners::default(),
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.get_element_by_id(id)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Scroll the viewport
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll = (x.max(0.0), y.max(0.0));
    }

    pub fn scroll_x(&self) -> f64 {
        self.scroll.0
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll.1
    }

    /// `getBoundingClientRect()`: layout box relative to the viewport.
    ///
    /// Rendered elements without a layout box report an empty rect at the
    /// origin, like an unlaid-out inline.
    pub fn bounding_client_rect(&self, id: NodeId) -> DomResult<DOMRect> {
        let el = self.tree.element(id).ok_or(DomError::NotAnElement)?;
        if !self.tree.is_rendered(id) {
            return Err(DomError::NotRendered);
        }
        let layout = el.layout.unwrap_or_default();
        Ok(layout.translate(-self.scroll.0, -self.scroll.1))
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Focused element
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// Move focus; returns the blur/focus events to dispatch, in order
    pub fn focus(&mut self, id: NodeId) -> DomResult<Vec<DomEvent>> {
        if self.tree.element(id).is_none() {
            return Err(DomError::NotAnElement);
        }
        if !self.tree.is_connected(id) {
            return Err(DomError::NotFound);
        }
        if self.active_element == Some(id) {
            return Ok(Vec::new());
        }
        let mut events = Vec::with_capacity(2);
        if let Some(previous) = self.active_element.take() {
            events.push(DomEvent::blur(Some(previous)));
        }
        self.active_element = Some(id);
        events.push(DomEvent::focus(Some(id)));
        Ok(events)
    }

    /// Drop focus; returns the blur event if something was focused
    pub fn blur(&mut self) -> Option<DomEvent> {
        self.active_element.take().map(|previous| DomEvent::blur(Some(previous)))
    }

    /// Key-down fired at the focused element, or `<body>` when none is
    pub fn key_down(&self, key: &str, code: &str) -> DomEvent {
        let target = self.active_element.or(self.body_element.some());
        DomEvent::key_down(target, key, code)
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// `document.addEventListener`
    pub fn add_event_listener(&mut self, event_type: EventType, options: ListenerOptions) -> ListenerId {
        self.listeners.add(event_type, options)
    }

    /// `document.removeEventListener`
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Listeners that should be invoked for `event`
    pub fn listeners_for(&self, event: &DomEvent) -> Vec<ListenerId> {
        self.listeners.matching(event)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure() {
        let doc = Document::new("https://example.com");
        assert_eq!(doc.url(), "https://example.com");
        assert_eq!(doc.tree.parent(doc.body()), Some(doc.document_element()));
        assert!(!doc.tree.is_rendered(doc.head()));
    }

    #[test]
    fn test_bounding_rect_accounts_for_scroll() {
        let mut doc = Document::default();
        let button = doc.tree.create_element("button");
        doc.tree.append_child(doc.body(), button).unwrap();
        doc.tree.set_layout(button, Some(DOMRect::from_xywh(10.0, 500.0, 80.0, 20.0))).unwrap();
        doc.scroll_to(0.0, 300.0);

        let rect = doc.bounding_client_rect(button).unwrap();
        assert_eq!(rect, DOMRect::from_xywh(10.0, 200.0, 80.0, 20.0));

        doc.tree.detach(button).unwrap();
        assert_eq!(doc.bounding_client_rect(button), Err(DomError::NotRendered));
    }

    #[test]
    fn test_focus_emits_blur_then_focus() {
        let mut doc = Document::default();
        let a = doc.tree.create_element("input");
        let b = doc.tree.create_element("input");
        doc.tree.append_child(doc.body(), a).unwrap();
        doc.tree.append_child(doc.body(), b).unwrap();

        assert_eq!(doc.focus(a).unwrap(), vec![DomEvent::focus(Some(a))]);
        assert_eq!(doc.focus(b).unwrap(), vec![DomEvent::blur(Some(a)), DomEvent::focus(Some(b))]);
        assert!(doc.focus(b).unwrap().is_empty());
        assert_eq!(doc.blur(), Some(DomEvent::blur(Some(b))));
        assert_eq!(doc.blur(), None);
    }

    #[test]
    fn test_key_down_targets_body_without_focus() {
        let doc = Document::default();
        let event = doc.key_down("a", "KeyA");
        assert_eq!(event.target, Some(doc.body()));
        assert_eq!(event.keyboard.unwrap().code, "KeyA");
    }

    #[test]
    fn test_listeners() {
        let mut doc = Document::default();
        let id = doc.add_event_listener(EventType::Blur, ListenerOptions::capture());
        let event = DomEvent::blur(Some(doc.body()));
        assert_eq!(doc.listeners_for(&event), vec![id]);
        assert!(doc.remove_event_listener(id));
        assert_eq!(doc.listener_count(), 0);
    }
}
