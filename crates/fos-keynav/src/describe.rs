//! Element descriptions
//!
//! `tag#id.class1.class2 [aria-label]`, used in every event the tracker
//! emits so the panel can show which element was involved.

use fos_dom::{DomTree, NodeId};

/// Description used when there is no element to describe
pub const UNKNOWN: &str = "unknown";

/// Number of class tokens included in a description
const MAX_CLASSES: usize = 2;

/// Describe a node. Total: anything that is not an element is `"unknown"`.
pub fn describe(tree: &DomTree, node: Option<NodeId>) -> String {
    let Some(el) = node.and_then(|id| tree.element(id)) else {
        return UNKNOWN.to_string();
    };

    let mut desc = el.local_name();
    if let Some(id) = el.id().filter(|id| !id.is_empty()) {
        desc.push('#');
        desc.push_str(id);
    }
    // Non-string className (SVG) contributes nothing
    let classes: Vec<&str> = el.classes().take(MAX_CLASSES).collect();
    if !classes.is_empty() {
        desc.push('.');
        desc.push_str(&classes.join("."));
    }
    if let Some(label) = el.get_attr("aria-label").filter(|l| !l.is_empty()) {
        desc.push_str(" [");
        desc.push_str(label);
        desc.push(']');
    }
    desc
}
