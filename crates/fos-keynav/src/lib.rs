//! fOS Keyboard Navigation Visualizer
//!
//! In-page tool that shows how a page behaves under keyboard navigation.
//!
//! Features:
//! - Tab-order scan with numbered badges
//! - Focus highlight that follows the focused element
//! - Key press and focus change reporting to an inspector panel
//! - Automatic rescan when the page's structure changes

pub mod channel;
pub mod clock;
pub mod config;
pub mod describe;
pub mod overlay;
pub mod panel;
pub mod preview;
pub mod scanner;
pub mod settings;
pub mod tracker;

pub use channel::{ChannelError, Emitter, EventBus, InboundMessage, Message, NavEvent, ADDON_ID};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OverlayConfig;
pub use describe::describe;
pub use overlay::{OverlayRenderer, OverlayState};
pub use panel::{format_timestamp, format_timestamp_in, NavPanel, SettingKey, Toolbar};
pub use preview::Preview;
pub use scanner::{FocusableElement, FocusableScanner, TabIndex, TabOrderEntry};
pub use settings::{Settings, SettingsPatch, SettingsStore};
pub use tracker::{NavigationTracker, TrackerState};
