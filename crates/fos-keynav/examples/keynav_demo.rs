//! Example: Keyboard navigation visualizer on a small form
//!
//! Run with `RUST_LOG=debug` to watch scans and overlay updates.

use std::cell::RefCell;
use std::rc::Rc;

use fos_dom::{DOMRect, Document};
use fos_keynav::channel::events;
use fos_keynav::{format_timestamp, EventBus, NavPanel, NavigationTracker, Preview, SettingKey, SettingsStore, Toolbar};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Build the page
    let mut doc = Document::new("https://example.com/signup");
    let body = doc.body();
    let mut y = 20.0;
    let mut field = |doc: &mut Document, tag: &str, attrs: &[(&str, &str)]| -> anyhow::Result<_> {
        let id = doc.tree.create_element(tag);
        for (name, value) in attrs {
            doc.tree.set_attribute(id, name, value)?;
        }
        doc.tree.append_child(body, id)?;
        doc.tree.set_layout(id, Some(DOMRect::from_xywh(40.0, y, 240.0, 28.0)))?;
        y += 40.0;
        Ok(id)
    };
    let email = field(&mut doc, "input", &[("id", "email"), ("aria-label", "Email")])?;
    let submit = field(&mut doc, "button", &[("id", "submit"), ("class", "btn primary")])?;
    field(&mut doc, "a", &[("href", "/help"), ("tabindex", "1")])?;

    // Wire the panel to the channel
    let panel = Rc::new(RefCell::new(NavPanel::default()));
    let mut bus = EventBus::new();
    for name in [events::KEY_PRESSED, events::FOCUS_CHANGED, events::TAB_ORDER] {
        let panel = panel.clone();
        bus.on(name, move |payload| {
            if let Err(err) = panel.borrow_mut().handle(name, payload) {
                tracing::warn!("Panel dropped message: {}", err);
            }
        });
    }

    let tracker = NavigationTracker::new(SettingsStore::default(), bus);
    let mut preview = Preview::new(doc, tracker);
    let mut toolbar = Toolbar::new();

    let toggle = toolbar.toggle()?;
    preview.receive(&toggle.name, &toggle.payload)?;

    preview.focus(email)?;
    preview.press_key("Tab", "Tab");
    preview.focus(submit)?;
    preview.press_key("Enter", "Enter");

    // Page adds a field; one rescan follows
    preview.mutate(|doc| -> anyhow::Result<()> {
        let extra = doc.tree.create_element("textarea");
        doc.tree.append_child(doc.body(), extra)?;
        doc.tree.set_layout(extra, Some(DOMRect::from_xywh(40.0, 140.0, 240.0, 80.0)))?;
        Ok(())
    })?;

    let update = panel.borrow_mut().toggle_setting(SettingKey::ShowTabIndex)?;
    preview.receive(&update.name, &update.payload)?;

    {
        let panel = panel.borrow();
        println!("Tab order:");
        for entry in panel.tab_order() {
            println!("  {:>2}. {}", entry.ordinal(), entry.description);
        }
        println!("Keys (newest first):");
        for press in panel.key_history() {
            println!("  {} {} on {}", format_timestamp(press.timestamp), press.key, press.target);
        }
        println!("Focus (newest first):");
        for change in panel.focus_history() {
            println!("  {} {}", format_timestamp(change.timestamp), change.element);
        }
    }

    let toggle = toolbar.toggle()?;
    preview.receive(&toggle.name, &toggle.payload)?;
    println!("Scans run: {}", preview.tracker().scan_count());

    Ok(())
}
