//! Overlay configuration

/// Look and placement of the overlay layer
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// `id` of the container holding the highlight and every badge
    pub layer_id: String,
    /// `id` of the focus highlight
    pub overlay_id: String,
    /// Class put on each badge
    pub badge_class: String,
    /// Highlight and badge colour
    pub color: String,
    /// Highlight border width (px)
    pub border_width: f64,
    /// How far badges sit up and left of their element's corner (px)
    pub badge_offset: f64,
    pub overlay_z_index: u32,
    pub badge_z_index: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            layer_id: "keyboard-nav-layer".to_string(),
            overlay_id: "keyboard-nav-overlay".to_string(),
            badge_class: "keyboard-nav-badge".to_string(),
            color: "#0066cc".to_string(),
            border_width: 3.0,
            badge_offset: 12.0,
            overlay_z_index: 999_999,
            badge_z_index: 999_998,
        }
    }
}

impl OverlayConfig {
    /// Initial `cssText` of the highlight (hidden)
    pub fn overlay_css(&self) -> String {
        format!(
            "position: absolute; pointer-events: none; z-index: {}; border: {}px solid {}; \
             border-radius: 4px; box-shadow: 0 0 0 2px rgba(0, 102, 204, 0.2); \
             transition: all 0.15s ease; display: none",
            self.overlay_z_index, self.border_width, self.color
        )
    }

    /// `cssText` of a badge, before placement
    pub fn badge_css(&self) -> String {
        format!(
            "position: absolute; background: {}; color: white; font-size: 12px; font-weight: bold; \
             padding: 2px 6px; border-radius: 10px; z-index: {}; pointer-events: none; \
             font-family: system-ui, sans-serif; line-height: 1",
            self.color, self.badge_z_index
        )
    }
}
