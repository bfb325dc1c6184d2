//! Integration tests - tracker driven through the preview host
//!
//! Covers the lifecycle, the emitted messages and the reentrancy guarantees
//! of the mutation observer.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use fos_dom::{Display, DomEvent};
use fos_keynav::channel::events;
use fos_keynav::{EventBus, NavEvent, NavPanel, NavigationTracker, Preview, SettingsStore, TrackerState};
use serde_json::json;

fn enable(preview: &mut TestPreview) {
    preview.receive(events::TOGGLE, &json!({"enabled": true})).unwrap();
}

fn disable(preview: &mut TestPreview) {
    preview.receive(events::TOGGLE, &json!({"enabled": false})).unwrap();
}

fn overlay_display(preview: &TestPreview) -> Option<Display> {
    let overlay = preview.tracker().renderer().overlay()?;
    preview.document().tree.element(overlay)?.style.display
}

fn badge_labels(preview: &TestPreview) -> Vec<String> {
    let doc = preview.document();
    let Some(layer) = preview.tracker().renderer().layer() else {
        return Vec::new();
    };
    doc.tree
        .elements_by_class_name(layer, "keyboard-nav-badge")
        .into_iter()
        .map(|badge| doc.tree.text_content(badge))
        .collect()
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_enable_emits_tab_order() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);

    let Some(NavEvent::TabOrderUpdated(order)) = emitted(&preview).last() else {
        panic!("expected a tab-order message, got {:?}", emitted(&preview));
    };
    let payload = serde_json::to_value(order).unwrap();
    assert_eq!(
        payload,
        json!({"elements": [
            {"index": 0, "element": "a", "tabIndex": 1},
            {"index": 1, "element": "input", "tabIndex": 2},
            {"index": 2, "element": "button#ok", "tabIndex": null},
        ]})
    );
    assert_eq!(badge_labels(&preview), vec!["1", "2", "3"]);
}

#[test]
fn test_badge_sits_above_left_of_element() {
    let page = scenario();
    let link = page.link;
    let mut preview = preview(page.doc);
    preview.mutate(|doc| doc.scroll_to(0.0, 15.0));
    enable(&mut preview);

    let renderer = preview.tracker().renderer();
    let first = renderer.badges()[0];
    let style = &preview.document().tree.element(first).unwrap().style;
    // Layout (10, 20) is viewport (10, 5); page coords subtract the 12px offset
    assert_eq!(style.get("top").as_deref(), Some("8px"));
    assert_eq!(style.get("left").as_deref(), Some("-2px"));
    assert!(preview.document().tree.is_connected(link));
}

#[test]
fn test_disable_leaves_nothing_behind() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    preview.focus(page.ok).unwrap();
    disable(&mut preview);

    let doc = preview.document();
    assert_eq!(preview.tracker().state(), TrackerState::Disabled);
    assert_eq!(doc.get_element_by_id("keyboard-nav-overlay"), None);
    assert_eq!(doc.get_element_by_id("keyboard-nav-layer"), None);
    assert!(doc.tree.elements_by_class_name(doc.tree.root(), "keyboard-nav-badge").is_empty());
    assert_eq!(doc.listener_count(), 0);
    assert_eq!(doc.tree.observer_count(), 0);
}

#[test]
fn test_repeated_toggles_do_not_stack() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    enable(&mut preview);
    assert_eq!(preview.document().listener_count(), 3);
    assert_eq!(tab_orders(&preview), 1);

    disable(&mut preview);
    disable(&mut preview);
    enable(&mut preview);
    assert_eq!(preview.document().listener_count(), 3);
    assert_eq!(badge_labels(&preview).len(), 3);
    assert_eq!(tab_orders(&preview), 2);
}

#[test]
fn test_no_messages_after_disable() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    disable(&mut preview);
    let before = emitted(&preview).len();

    preview.press_key("Tab", "Tab");
    preview.focus(page.input).unwrap();
    preview.blur();
    preview.mutate(|doc| {
        add(doc, "button", &[]);
    });
    assert_eq!(emitted(&preview).len(), before);
}

// ============================================================================
// KEYS AND FOCUS
// ============================================================================

#[test]
fn test_key_press_describes_target() {
    let page = scenario();
    let (mut preview, clock) = preview_with(page.doc, SettingsStore::default());
    enable(&mut preview);
    preview.focus(page.ok).unwrap();
    clock.advance(5);
    preview.press_key("Enter", "Enter");

    let Some(NavEvent::KeyPressed(press)) = emitted(&preview).last() else {
        panic!("expected key-pressed");
    };
    assert_eq!(press.key, "Enter");
    assert_eq!(press.code, "Enter");
    assert_eq!(press.target, "button#ok");
    assert_eq!(press.timestamp, 1_700_000_000_005);
}

#[test]
fn test_key_press_without_focus_targets_body() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    preview.press_key("Tab", "Tab");
    assert!(matches!(emitted(&preview).last(), Some(NavEvent::KeyPressed(p)) if p.target == "body"));
}

#[test]
fn test_focus_moves_overlay_and_blur_hides_it() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    assert_eq!(overlay_display(&preview), Some(Display::None));

    preview.focus(page.input).unwrap();
    assert!(matches!(emitted(&preview).last(), Some(NavEvent::FocusChanged(f)) if f.element == "input"));
    assert_eq!(overlay_display(&preview), Some(Display::Block));
    let state = preview.tracker().renderer().state();
    assert!(state.visible);
    assert_eq!(state.rect.map(|r| r.top()), Some(60.0));

    preview.blur();
    assert_eq!(overlay_display(&preview), Some(Display::None));
    assert!(!preview.tracker().renderer().state().visible);
}

#[test]
fn test_focus_reported_with_overlay_off() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    preview
        .receive(events::UPDATE_SETTINGS, &json!({"showOverlay": false}))
        .unwrap();

    preview.focus(page.link).unwrap();
    assert!(matches!(emitted(&preview).last(), Some(NavEvent::FocusChanged(f)) if f.element == "a"));
    assert_eq!(overlay_display(&preview), Some(Display::None));
}

#[test]
fn test_highlight_focus_off_keeps_overlay_still() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    preview.focus(page.link).unwrap();
    let placed = preview.tracker().renderer().state().rect;

    preview
        .receive(events::UPDATE_SETTINGS, &json!({"highlightFocus": 0}))
        .unwrap();
    preview.focus(page.ok).unwrap();
    assert_eq!(preview.tracker().renderer().state().rect, placed);
    assert!(matches!(emitted(&preview).last(), Some(NavEvent::FocusChanged(f)) if f.element == "button#ok"));
}

#[test]
fn test_synthetic_focus_without_target() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    preview.dispatch(&DomEvent::focus(None));
    assert!(matches!(emitted(&preview).last(), Some(NavEvent::FocusChanged(f)) if f.element == "unknown"));
}

// ============================================================================
// RESCANS AND REENTRANCY
// ============================================================================

#[test]
fn test_renderer_writes_do_not_rescan() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    let scans = preview.tracker().scan_count();

    preview.focus(page.ok).unwrap();
    preview.blur();
    preview.focus(page.link).unwrap();
    assert_eq!(preview.tracker().scan_count(), scans);
    assert_eq!(tab_orders(&preview), 1);
}

#[test]
fn test_each_external_change_rescans_once() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);

    let extra = preview.mutate(|doc| add(doc, "button", &[("class", "extra")]));
    assert_eq!(preview.tracker().scan_count(), 2);
    assert_eq!(preview.tracker().tab_order().len(), 4);

    preview.mutate(|doc| doc.tree.set_attribute(extra, "disabled", "").unwrap());
    assert_eq!(preview.tracker().scan_count(), 3);
    assert_eq!(preview.tracker().tab_order().len(), 3);

    preview.mutate(|doc| doc.tree.set_attribute(page.ok, "tabindex", "-1").unwrap());
    assert_eq!(preview.tracker().scan_count(), 4);
    assert_eq!(badge_labels(&preview), vec!["1", "2"]);
}

#[test]
fn test_batched_changes_rescan_once() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    preview.mutate(|doc| {
        for _ in 0..5 {
            add(doc, "textarea", &[]);
        }
    });
    assert_eq!(preview.tracker().scan_count(), 2);
    assert_eq!(preview.tracker().tab_order().len(), 8);
}

#[test]
fn test_unwatched_attribute_ignored() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    preview.mutate(|doc| doc.tree.set_attribute(page.ok, "class", "primary").unwrap());
    assert_eq!(preview.tracker().scan_count(), 1);
}

#[test]
fn test_page_removing_layer_is_repaired_without_rescan() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    let layer = preview.tracker().renderer().layer().unwrap();

    preview.mutate(|doc| doc.tree.detach(layer).unwrap());
    assert_eq!(preview.tracker().scan_count(), 1);

    // Next external change rebuilds badges in the same layer node
    preview.mutate(|doc| {
        add(doc, "select", &[]);
    });
    assert_eq!(preview.tracker().scan_count(), 2);
    assert_eq!(preview.tracker().renderer().layer(), Some(layer));
    assert!(preview.document().tree.is_connected(layer));
    assert_eq!(badge_labels(&preview).len(), 4);
}

#[test]
fn test_show_tab_index_off_clears_badges_on_rescan() {
    let page = scenario();
    let mut preview = preview(page.doc);
    enable(&mut preview);
    preview.focus(page.input).unwrap();
    let overlay_state = preview.tracker().renderer().state();

    preview
        .receive(events::UPDATE_SETTINGS, &json!({"showTabIndex": false}))
        .unwrap();
    // Not retroactive
    assert_eq!(badge_labels(&preview).len(), 3);

    preview.mutate(|doc| {
        add(doc, "button", &[]);
    });
    assert!(badge_labels(&preview).is_empty());
    assert_eq!(preview.tracker().renderer().state(), overlay_state);
    assert_eq!(overlay_display(&preview), Some(Display::Block));
    // Order is still reported in full
    assert_eq!(preview.tracker().tab_order().len(), 4);
}

#[test]
fn test_hidden_subtree_excluded() {
    let mut page = scenario();
    let section = add(&mut page.doc, "section", &[]);
    add_to(&mut page.doc, section, "button", &[("id", "inner")]);
    let mut preview = preview(page.doc);
    enable(&mut preview);
    assert_eq!(preview.tracker().tab_order().len(), 4);

    preview.mutate(|doc| doc.tree.update_style(section, |s| s.set("visibility", "hidden")).unwrap());
    // Style changes are not watched; the next structural change picks it up
    assert_eq!(preview.tracker().tab_order().len(), 4);
    preview.mutate(|doc| {
        add(doc, "a", &[]);
    });
    let order = preview.tracker().tab_order();
    assert_eq!(order.len(), 3);
    assert!(order.iter().all(|e| e.description != "button#inner"));
}

// ============================================================================
// CHANNEL
// ============================================================================

#[test]
fn test_bus_feeds_panel() {
    let page = scenario();
    let panel = Rc::new(RefCell::new(NavPanel::default()));
    let mut bus = EventBus::new();
    for name in [events::KEY_PRESSED, events::FOCUS_CHANGED, events::TAB_ORDER] {
        let panel = panel.clone();
        bus.on(name, move |payload| {
            panel.borrow_mut().handle(name, payload).unwrap();
        });
    }

    let tracker = NavigationTracker::new(SettingsStore::default(), bus);
    let mut preview = Preview::new(page.doc, tracker);
    preview.receive(events::TOGGLE, &json!({"enabled": true})).unwrap();
    preview.focus(page.ok).unwrap();
    preview.press_key("Tab", "Tab");

    let panel = panel.borrow();
    assert_eq!(panel.tab_order().len(), 3);
    assert_eq!(panel.focus_history().count(), 1);
    assert_eq!(panel.key_history().next().map(|k| k.target.as_str()), Some("button#ok"));
    assert_eq!(preview.tracker().emitter().sent(), 3);
}

#[test]
fn test_malformed_toggle_rejected() {
    let page = scenario();
    let mut preview = preview(page.doc);
    assert!(preview.receive(events::TOGGLE, &json!({})).is_err());
    assert!(preview.receive(events::TAB_ORDER, &json!({"elements": []})).is_err());
    assert!(!preview.tracker().is_enabled());
    assert!(emitted(&preview).is_empty());
}
