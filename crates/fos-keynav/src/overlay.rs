//! Overlay rendering
//!
//! Everything drawn lives under one layer element appended to `<body>`: the
//! focus highlight and one badge per focusable element. Keeping it in a
//! single subtree lets the tracker exclude the renderer's own writes from the
//! mutation observer. The layer keeps its node for the renderer's lifetime, so
//! re-attaching it after the page removed it is still an excluded mutation.

use fos_dom::{DOMRect, Document, DomResult, InlineStyle, NodeId};

use crate::config::OverlayConfig;
use crate::scanner::FocusableElement;
use crate::settings::SettingsStore;

/// What the highlight currently shows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlayState {
    pub visible: bool,
    /// Last placed box, page coordinates
    pub rect: Option<DOMRect>,
}

/// Draws the focus highlight and tab-order badges
#[derive(Debug)]
pub struct OverlayRenderer {
    settings: SettingsStore,
    config: OverlayConfig,
    layer: Option<NodeId>,
    overlay: Option<NodeId>,
    badges: Vec<NodeId>,
    state: OverlayState,
}

impl OverlayRenderer {
    pub fn new(settings: SettingsStore, config: OverlayConfig) -> Self {
        Self {
            settings,
            config,
            layer: None,
            overlay: None,
            badges: Vec::new(),
            state: OverlayState::default(),
        }
    }

    /// Container of everything this renderer draws
    pub fn layer(&self) -> Option<NodeId> {
        self.layer
    }

    /// The highlight element, once created
    pub fn overlay(&self) -> Option<NodeId> {
        self.overlay
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// Badges currently attached
    pub fn badges(&self) -> &[NodeId] {
        &self.badges
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Create the layer or put it back under `<body>`
    fn ensure_layer(&mut self, doc: &mut Document) -> DomResult<NodeId> {
        let host = doc.body().some().unwrap_or(doc.document_element());
        let layer = match self.layer {
            Some(layer) => layer,
            None => {
                let layer = doc.tree.create_element("div");
                doc.tree.set_attribute(layer, "id", &self.config.layer_id)?;
                doc.tree.set_attribute(layer, "aria-hidden", "true")?;
                self.layer = Some(layer);
                layer
            }
        };
        if doc.tree.parent(layer) != Some(host) {
            doc.tree.append_child(host, layer)?;
        }
        Ok(layer)
    }

    /// Guarantee exactly one highlight exists. Idempotent.
    pub fn ensure_overlay(&mut self, doc: &mut Document) -> DomResult<NodeId> {
        let layer = self.ensure_layer(doc)?;
        if let Some(overlay) = self.overlay {
            if doc.tree.parent(overlay) != Some(layer) {
                doc.tree.append_child(layer, overlay)?;
            }
            return Ok(overlay);
        }
        let overlay = doc.tree.create_element("div");
        doc.tree.set_attribute(overlay, "id", &self.config.overlay_id)?;
        doc.tree.set_style(overlay, InlineStyle::parse(&self.config.overlay_css()))?;
        doc.tree.append_child(layer, overlay)?;
        self.overlay = Some(overlay);
        self.state = OverlayState::default();
        tracing::debug!("Created focus overlay {:?}", overlay);
        Ok(overlay)
    }

    /// Show the highlight over `target`.
    ///
    /// Does nothing when `showOverlay` is off, there is no target, or the
    /// highlight does not exist. A target without a box leaves the highlight
    /// where it was.
    pub fn position_overlay(&mut self, doc: &mut Document, target: Option<NodeId>) {
        if !self.settings.get().show_overlay {
            return;
        }
        let (Some(target), Some(overlay)) = (target, self.overlay) else {
            return;
        };
        let rect = match doc.bounding_client_rect(target) {
            Ok(rect) => rect.translate(doc.scroll_x(), doc.scroll_y()),
            Err(err) => {
                tracing::warn!("Cannot place overlay on {:?}: {}", target, err);
                return;
            }
        };
        let placed = doc.tree.update_style(overlay, |style| {
            style.set("display", "block");
            style.set("top", &px(rect.top()));
            style.set("left", &px(rect.left()));
            style.set("width", &px(rect.width));
            style.set("height", &px(rect.height));
        });
        match placed {
            Ok(()) => self.state = OverlayState { visible: true, rect: Some(rect) },
            Err(err) => tracing::warn!("Cannot style overlay: {}", err),
        }
    }

    /// Hide the highlight without destroying it
    pub fn hide_overlay(&mut self, doc: &mut Document) {
        let Some(overlay) = self.overlay else {
            return;
        };
        if let Err(err) = doc.tree.update_style(overlay, |style| style.set("display", "none")) {
            tracing::warn!("Cannot hide overlay: {}", err);
        }
        self.state.visible = false;
    }

    /// Replace all badges with one per element, numbered by position.
    ///
    /// With `showTabIndex` off the old badges are still removed and nothing
    /// is drawn. Elements that cannot be measured get no badge.
    pub fn render_badges(&mut self, doc: &mut Document, elements: &[FocusableElement]) {
        self.clear_badges(doc);
        if !self.settings.get().show_tab_index || elements.is_empty() {
            return;
        }
        let layer = match self.ensure_layer(doc) {
            Ok(layer) => layer,
            Err(err) => {
                tracing::warn!("Cannot attach overlay layer: {}", err);
                return;
            }
        };
        for (index, element) in elements.iter().enumerate() {
            match self.create_badge(doc, layer, element.node, index) {
                Ok(badge) => self.badges.push(badge),
                Err(err) => tracing::debug!("Skipping badge for {}: {}", element.description, err),
            }
        }
        tracing::debug!("Rendered {} of {} badges", self.badges.len(), elements.len());
    }

    fn create_badge(&mut self, doc: &mut Document, layer: NodeId, target: NodeId, index: usize) -> DomResult<NodeId> {
        // Measure first so a detached target creates nothing
        let rect = doc.bounding_client_rect(target)?;
        let offset = self.config.badge_offset;
        let mut style = InlineStyle::parse(&self.config.badge_css());
        style.set("top", &px(doc.scroll_y() + rect.top() - offset));
        style.set("left", &px(doc.scroll_x() + rect.left() - offset));

        let badge = doc.tree.create_element("div");
        doc.tree.set_attribute(badge, "class", &self.config.badge_class)?;
        doc.tree.set_style(badge, style)?;
        let label = doc.tree.create_text(&(index + 1).to_string());
        doc.tree.append_child(badge, label)?;
        doc.tree.append_child(layer, badge)?;
        Ok(badge)
    }

    fn clear_badges(&mut self, doc: &mut Document) {
        for badge in self.badges.drain(..) {
            if let Err(err) = doc.tree.detach(badge) {
                tracing::warn!("Cannot remove badge {:?}: {}", badge, err);
            }
        }
    }

    /// Remove the highlight and every badge
    pub fn teardown(&mut self, doc: &mut Document) {
        self.clear_badges(doc);
        if let Some(layer) = self.layer.take() {
            if let Err(err) = doc.tree.detach(layer) {
                tracing::warn!("Cannot remove overlay layer: {}", err);
            }
        }
        self.overlay = None;
        self.state = OverlayState::default();
        tracing::debug!("Overlay torn down");
    }
}

fn px(value: f64) -> String {
    format!("{}px", value)
}
