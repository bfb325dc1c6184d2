//! Shared page builders for integration tests

#![allow(dead_code)]

use fos_dom::{DOMRect, Document, NodeId};
use fos_keynav::{ManualClock, NavEvent, NavigationTracker, OverlayConfig, Preview, SettingsStore};

pub type TestPreview = Preview<Vec<NavEvent>, ManualClock>;

/// Append an element to `<body>` with the given attributes
pub fn add(doc: &mut Document, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let body = doc.body();
    add_to(doc, body, tag, attrs)
}

pub fn add_to(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let id = doc.tree.create_element(tag);
    for (name, value) in attrs {
        doc.tree.set_attribute(id, name, value).unwrap();
    }
    doc.tree.append_child(parent, id).unwrap();
    id
}

/// Give an element a layout box
pub fn place(doc: &mut Document, id: NodeId, x: f64, y: f64) {
    doc.tree.set_layout(id, Some(DOMRect::from_xywh(x, y, 100.0, 24.0))).unwrap();
}

/// `<a tabindex=1>`, `<input tabindex=2>`, `<button id=ok>` in reverse of
/// their tab order
pub struct Scenario {
    pub doc: Document,
    pub ok: NodeId,
    pub input: NodeId,
    pub link: NodeId,
}

pub fn scenario() -> Scenario {
    let mut doc = Document::new("https://example.com/form");
    let ok = add(&mut doc, "button", &[("id", "ok")]);
    let input = add(&mut doc, "input", &[("tabindex", "2")]);
    let link = add(&mut doc, "a", &[("href", "#top"), ("tabindex", "1")]);
    place(&mut doc, ok, 10.0, 100.0);
    place(&mut doc, input, 10.0, 60.0);
    place(&mut doc, link, 10.0, 20.0);
    Scenario { doc, ok, input, link }
}

pub fn preview_with(doc: Document, settings: SettingsStore) -> (TestPreview, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let tracker = NavigationTracker::with_clock(settings, OverlayConfig::default(), Vec::new(), clock.clone());
    (Preview::new(doc, tracker), clock)
}

pub fn preview(doc: Document) -> TestPreview {
    preview_with(doc, SettingsStore::default()).0
}

/// Events emitted so far
pub fn emitted(preview: &TestPreview) -> &[NavEvent] {
    preview.tracker().emitter()
}

pub fn tab_orders(preview: &TestPreview) -> usize {
    emitted(preview)
        .iter()
        .filter(|e| matches!(e, NavEvent::TabOrderUpdated(_)))
        .count()
}
