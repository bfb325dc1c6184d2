//! fOS DOM - Document Object Model
//!
//! Arena-backed DOM tree with the pieces an in-page tool needs to watch a
//! live page: inline style and layout boxes, focus, document-level event
//! listeners and mutation observers.

mod node;
mod tree;
mod document;
mod operations;
pub mod geometry;
pub mod style;
pub mod observer;
pub mod events;

pub use node::{Node, NodeData, ElementData, Attribute, Namespace};
pub use tree::DomTree;
pub use document::Document;
pub use operations::{DomError, DomResult};
pub use geometry::DOMRect;
pub use style::{ComputedStyle, Display, InlineStyle, Position, Visibility};
pub use observer::{MutationObserverInit, MutationRecord, MutationType, ObserverId};
pub use events::{DomEvent, EventType, KeyboardData, ListenerId, ListenerOptions};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check whether this ID points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Convert the sentinel into `None`
    #[inline]
    pub fn some(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
