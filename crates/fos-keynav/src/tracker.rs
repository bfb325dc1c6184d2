//! Navigation tracker
//!
//! Two states, `Disabled` and `Enabled`. While enabled the tracker holds one
//! subscription per signal source on the document: key-down, captured focus,
//! captured blur and a mutation observer on `<body>` that excludes the overlay
//! layer. Disabling drops all of them before returning.
//!
//! The host delivers signals by calling [`NavigationTracker::handle_event`]
//! for every listener id the document matched, and
//! [`NavigationTracker::handle_mutations`] with the observer's drained records.

use fos_dom::{
    Document, DomEvent, EventType, ListenerId, ListenerOptions, MutationObserverInit, MutationRecord, ObserverId,
};

use crate::channel::{Emitter, FocusChange, InboundMessage, KeyPress, NavEvent, TabOrder};
use crate::clock::{Clock, SystemClock};
use crate::config::OverlayConfig;
use crate::describe::describe;
use crate::overlay::OverlayRenderer;
use crate::scanner::{tab_order_entries, FocusableScanner, TabOrderEntry};
use crate::settings::{SettingsPatch, SettingsStore};

/// Attributes whose changes can alter the tab order
pub const WATCHED_ATTRIBUTES: [&str; 2] = ["tabindex", "disabled"];

/// Tracker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerState {
    #[default]
    Disabled,
    Enabled,
}

/// Live subscriptions of one enable cycle
#[derive(Debug, Clone, Copy)]
struct Subscription {
    key_down: ListenerId,
    focus: ListenerId,
    blur: ListenerId,
    observer: ObserverId,
}

impl Subscription {
    fn listeners(&self) -> [ListenerId; 3] {
        [self.key_down, self.focus, self.blur]
    }
}

/// The stateful tab-order / focus tracking engine
#[derive(Debug)]
pub struct NavigationTracker<E: Emitter, C: Clock = SystemClock> {
    settings: SettingsStore,
    scanner: FocusableScanner,
    renderer: OverlayRenderer,
    emitter: E,
    clock: C,
    subscription: Option<Subscription>,
    last_order: Vec<TabOrderEntry>,
    scans: u64,
}

impl<E: Emitter> NavigationTracker<E, SystemClock> {
    /// Tracker stamping events with the wall clock
    pub fn new(settings: SettingsStore, emitter: E) -> Self {
        Self::with_clock(settings, OverlayConfig::default(), emitter, SystemClock)
    }
}

impl<E: Emitter, C: Clock> NavigationTracker<E, C> {
    pub fn with_clock(settings: SettingsStore, config: OverlayConfig, emitter: E, clock: C) -> Self {
        Self {
            renderer: OverlayRenderer::new(settings.clone(), config),
            settings,
            scanner: FocusableScanner::new(),
            emitter,
            clock,
            subscription: None,
            last_order: Vec::new(),
            scans: 0,
        }
    }

    pub fn state(&self) -> TrackerState {
        if self.subscription.is_some() {
            TrackerState::Enabled
        } else {
            TrackerState::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state() == TrackerState::Enabled
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Tab order from the most recent scan
    pub fn tab_order(&self) -> &[TabOrderEntry] {
        &self.last_order
    }

    /// Number of scan-and-render passes run so far
    pub fn scan_count(&self) -> u64 {
        self.scans
    }

    /// Observer to drain while enabled
    pub fn observer(&self) -> Option<ObserverId> {
        self.subscription.map(|s| s.observer)
    }

    /// Whether a document listener belongs to this tracker
    pub fn owns_listener(&self, id: ListenerId) -> bool {
        self.subscription.is_some_and(|s| s.listeners().contains(&id))
    }

    /// Apply a message from the panel
    pub fn apply_message(&mut self, doc: &mut Document, message: InboundMessage) {
        match message {
            InboundMessage::Toggle { enabled } => self.set_enabled(doc, enabled),
            InboundMessage::UpdateSettings(patch) => self.update_settings(patch),
        }
    }

    /// Merge settings; they apply from the next relevant event on
    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.settings.update(patch);
    }

    pub fn set_enabled(&mut self, doc: &mut Document, enabled: bool) {
        if enabled {
            self.enable(doc);
        } else {
            self.disable(doc);
        }
    }

    /// `Disabled -> Enabled`. No-op when already enabled.
    pub fn enable(&mut self, doc: &mut Document) {
        if self.is_enabled() {
            return;
        }
        tracing::info!("Keyboard navigation tracking enabled on {}", doc.url());

        if let Err(err) = self.renderer.ensure_overlay(doc) {
            tracing::warn!("Cannot create focus overlay: {}", err);
        }
        self.rescan(doc);

        let key_down = doc.add_event_listener(EventType::KeyDown, ListenerOptions::default());
        let focus = doc.add_event_listener(EventType::Focus, ListenerOptions::capture());
        let blur = doc.add_event_listener(EventType::Blur, ListenerOptions::capture());

        let root = doc.body().some().unwrap_or(doc.document_element());
        let observer = doc.tree.observe(
            root,
            MutationObserverInit {
                child_list: true,
                attributes: true,
                subtree: true,
                attribute_filter: Some(WATCHED_ATTRIBUTES.iter().map(|a| a.to_string()).collect()),
                ..Default::default()
            },
        );
        if let Some(layer) = self.renderer.layer() {
            doc.tree.exclude_subtree(observer, layer);
        }

        self.subscription = Some(Subscription { key_down, focus, blur, observer });
    }

    /// `Enabled -> Disabled`. Every listener and the observer are gone when
    /// this returns. No-op when already disabled.
    pub fn disable(&mut self, doc: &mut Document) {
        let Some(sub) = self.subscription.take() else {
            return;
        };
        for id in sub.listeners() {
            doc.remove_event_listener(id);
        }
        doc.tree.disconnect(sub.observer);
        self.renderer.teardown(doc);
        tracing::info!("Keyboard navigation tracking disabled");
    }

    /// Deliver an event a document listener matched
    pub fn handle_event(&mut self, doc: &mut Document, listener: ListenerId, event: &DomEvent) {
        let Some(sub) = self.subscription else {
            return;
        };
        match event.event_type {
            EventType::KeyDown if listener == sub.key_down => self.on_key_down(doc, event),
            EventType::Focus if listener == sub.focus => self.on_focus(doc, event),
            EventType::Blur if listener == sub.blur => self.renderer.hide_overlay(doc),
            _ => tracing::trace!("Ignoring {} for listener {:?}", event.event_type.as_str(), listener),
        }
    }

    fn on_key_down(&mut self, doc: &Document, event: &DomEvent) {
        let (key, code) = event
            .keyboard
            .as_ref()
            .map(|k| (k.key.clone(), k.code.clone()))
            .unwrap_or_default();
        tracing::trace!("keydown {} ({})", key, code);
        self.emitter.emit(NavEvent::KeyPressed(KeyPress {
            key,
            code,
            timestamp: self.clock.now_millis(),
            target: describe(&doc.tree, event.target),
        }));
    }

    fn on_focus(&mut self, doc: &mut Document, event: &DomEvent) {
        if self.settings.get().highlight_focus {
            self.renderer.position_overlay(doc, event.target);
        }
        self.emitter.emit(NavEvent::FocusChanged(FocusChange {
            element: describe(&doc.tree, event.target),
            timestamp: self.clock.now_millis(),
        }));
    }

    /// One rescan per delivered batch, however many records it holds
    pub fn handle_mutations(&mut self, doc: &mut Document, records: &[MutationRecord]) {
        if !self.is_enabled() || records.is_empty() {
            return;
        }
        tracing::debug!("{} mutation records, rescanning", records.len());
        self.rescan(doc);
    }

    /// Scan, redraw badges and publish the new order
    pub fn rescan(&mut self, doc: &mut Document) {
        let elements = self.scanner.scan(doc);
        self.renderer.render_badges(doc, &elements);
        self.last_order = tab_order_entries(&elements);
        self.scans += 1;
        self.emitter.emit(NavEvent::TabOrderUpdated(TabOrder { elements: self.last_order.clone() }));
    }
}
