//! Focusable element discovery
//!
//! Finds the elements sequential keyboard navigation visits and orders them
//! the way the Tab key does.

use fos_dom::{Display, Document, ElementData, NodeId, Visibility};
use serde::{Deserialize, Serialize};

use crate::describe::describe;

/// Declared `tabindex`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    /// No usable attribute (absent or unparsable)
    Unset,
    /// `tabindex` < 0: focusable by script, skipped by Tab
    NotSequential(i32),
    /// `tabindex` >= 0
    Sequential(i32),
}

impl TabIndex {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().parse::<i32>()) {
            Some(Ok(n)) if n < 0 => Self::NotSequential(n),
            Some(Ok(n)) => Self::Sequential(n),
            _ => Self::Unset,
        }
    }

    /// Parsed value, if any
    pub fn value(&self) -> Option<i32> {
        match self {
            Self::Unset => None,
            Self::NotSequential(n) | Self::Sequential(n) => Some(*n),
        }
    }

    /// Sort key: positive values first ascending, then everything else
    fn order_key(&self) -> (u8, i32) {
        match self {
            Self::Sequential(n) if *n > 0 => (0, *n),
            _ => (1, 0),
        }
    }
}

/// An element found by a scan. Only valid until the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusableElement {
    pub node: NodeId,
    pub tab_index: TabIndex,
    pub description: String,
}

/// Position of an element in the computed tab order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabOrderEntry {
    /// 0-based position
    pub index: usize,
    #[serde(rename = "element")]
    pub description: String,
    #[serde(rename = "tabIndex")]
    pub declared_tab_index: Option<i32>,
}

impl TabOrderEntry {
    /// Number shown on the badge
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }
}

/// Number the scan result
pub fn tab_order_entries(elements: &[FocusableElement]) -> Vec<TabOrderEntry> {
    elements
        .iter()
        .enumerate()
        .map(|(index, el)| TabOrderEntry {
            index,
            description: el.description.clone(),
            declared_tab_index: el.tab_index.value(),
        })
        .collect()
}

/// Interactive-role predicate
pub fn is_candidate(el: &ElementData) -> bool {
    let enabled = !el.has_attr("disabled");
    let matched = (el.is("a") && el.has_attr("href"))
        || (enabled && (el.is("button") || el.is("input") || el.is("select") || el.is("textarea")))
        || matches!(TabIndex::parse(el.get_attr("tabindex")), TabIndex::Sequential(_))
        || el
            .get_attr("contenteditable")
            .is_some_and(|v| v.is_empty() || v.eq_ignore_ascii_case("true"));
    // Negative tabindex takes the element out of sequential navigation
    matched && !matches!(TabIndex::parse(el.get_attr("tabindex")), TabIndex::NotSequential(_))
}

/// Rendered, not hidden, and laid out against a containing block
pub fn is_visible(doc: &Document, node: NodeId) -> bool {
    let Some(style) = doc.tree.computed_style(node) else {
        return false;
    };
    style.display != Display::None
        && style.visibility != Visibility::Hidden
        && doc.tree.offset_parent(node).is_some()
}

/// Tab-order scanner
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusableScanner;

impl FocusableScanner {
    pub fn new() -> Self {
        Self
    }

    /// Current focusable elements in tab order. Always a fresh sequence.
    pub fn scan(&self, doc: &Document) -> Vec<FocusableElement> {
        let tree = doc.tree();
        let mut found: Vec<FocusableElement> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|&id| tree.element(id).is_some_and(is_candidate))
            .filter(|&id| is_visible(doc, id))
            .map(|node| FocusableElement {
                node,
                tab_index: TabIndex::parse(tree.element(node).and_then(|e| e.get_attr("tabindex"))),
                description: describe(tree, Some(node)),
            })
            .collect();

        // Stable: equal keys keep document order
        found.sort_by_key(|el| el.tab_index.order_key());
        tracing::debug!("Scanned {} focusable elements", found.len());
        found
    }
}
