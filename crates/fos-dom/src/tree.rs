//! DOM Tree (arena-based allocation)
//!
//! All structural and attribute mutations go through this type so they can be
//! reported to mutation observers. Records are queued before a removal
//! detaches anything, so exclusion checks still see the old ancestry.

use crate::node::{Namespace, Node, NodeData};
use crate::observer::{MutationObserverInit, MutationRecord, MutationType, ObserverId, ObserverRegistry};
use crate::style::{ComputedStyle, Display, InlineStyle, Position, Visibility};
use crate::{DOMRect, DomError, DomResult, ElementData, NodeId};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    observers: ObserverRegistry,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            observers: ObserverRegistry::default(),
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound)
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(DomError::NotFound)
    }

    /// Element data of a node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        self.node_mut(id)?.as_element_mut().ok_or(DomError::NotAnElement)
    }

    /// Number of nodes ever allocated (detached ones included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached HTML element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_ns(tag, Namespace::Html)
    }

    /// Create a detached element in a namespace
    pub fn create_element_ns(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        self.alloc(Node::element(tag, namespace))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content.to_string()))
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.some())
    }

    /// Direct children in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// Descendants of `root` in document (pre-)order, `root` excluded
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let start = stack.len();
            stack.extend(self.children(id));
            stack[start..].reverse();
        }
        out
    }

    /// Inclusive ancestry check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is attached to the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.contains(NodeId::ROOT, id)
    }

    /// First element with the given `id` attribute, in document order
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(NodeId::ROOT)
            .into_iter()
            .find(|&n| self.element(n).and_then(ElementData::id) == Some(id))
    }

    /// Elements carrying a class token, in document order
    pub fn elements_by_class_name(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(|e| e.classes().any(|c| c == class)))
            .collect()
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = self.get(id).and_then(Node::as_text).unwrap_or_default().to_string();
        for node in self.descendants(id) {
            if let Some(t) = self.get(node).and_then(Node::as_text) {
                text.push_str(t);
            }
        }
        text
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Append a child node, moving it from its old parent if needed
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (append when `None`)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<NodeId> {
        let parent_node = self.node(parent)?;
        if matches!(parent_node.data, NodeData::Text(_)) {
            return Err(DomError::HierarchyRequest);
        }
        let child_node = self.node(child)?;
        if matches!(child_node.data, NodeData::Document) || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }
        // Inserting a node before itself leaves it where it is
        if reference == Some(child) {
            return Ok(child);
        }

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child)?;
        }

        let next = reference.unwrap_or(NodeId::NONE);
        let prev = match reference {
            Some(r) => self.node(r)?.prev_sibling,
            None => self.node(parent)?.last_child,
        };

        {
            let node = self.node_mut(child)?;
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = child;
        } else {
            self.node_mut(parent)?.first_child = child;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = child;
        } else {
            self.node_mut(parent)?.last_child = child;
        }

        self.queue_record(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(child)
    }

    /// Remove a child node; it stays in the arena, detached
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.node(parent)?;
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild);
        }

        self.queue_record(MutationRecord::child_list(parent, Vec::new(), vec![child]));

        let (prev, next) = {
            let node = self.node(child)?;
            (node.prev_sibling, node.next_sibling)
        };
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = next;
        } else {
            self.node_mut(parent)?.first_child = next;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = prev;
        } else {
            self.node_mut(parent)?.last_child = prev;
        }
        let node = self.node_mut(child)?;
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
        Ok(child)
    }

    /// Detach a node from wherever it is; no-op when already detached
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id)?;
        }
        Ok(())
    }

    /// Replace the data of a text node
    pub fn set_text(&mut self, id: NodeId, content: &str) -> DomResult<()> {
        let node = self.node_mut(id)?;
        let NodeData::Text(text) = &mut node.data else {
            return Err(DomError::NotText);
        };
        let old = std::mem::replace(text, content.to_string());
        self.queue_record(MutationRecord::character_data(id, old));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes, style, layout
    // ------------------------------------------------------------------

    /// Set an attribute
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let old = self.element_mut(id)?.set_attr(name, value);
        self.queue_record(MutationRecord::attributes(id, name, old));
        Ok(())
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<bool> {
        let old = self.element_mut(id)?.remove_attr(name);
        let removed = old.is_some();
        if removed {
            self.queue_record(MutationRecord::attributes(id, name, old));
        }
        Ok(removed)
    }

    /// Replace the inline style; reported as a `style` attribute change
    pub fn set_style(&mut self, id: NodeId, style: InlineStyle) -> DomResult<()> {
        let el = self.element_mut(id)?;
        let old = std::mem::replace(&mut el.style, style).css_text();
        self.queue_record(MutationRecord::attributes(id, "style", Some(old)));
        Ok(())
    }

    /// Edit the inline style in place
    pub fn update_style(&mut self, id: NodeId, edit: impl FnOnce(&mut InlineStyle)) -> DomResult<()> {
        let mut style = self.element(id).ok_or(DomError::NotAnElement)?.style.clone();
        edit(&mut style);
        self.set_style(id, style)
    }

    /// Record the layout box of an element (document coordinates)
    pub fn set_layout(&mut self, id: NodeId, rect: Option<DOMRect>) -> DomResult<()> {
        self.element_mut(id)?.layout = rect;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Style resolution
    // ------------------------------------------------------------------

    /// Resolved display / visibility / position of an element.
    ///
    /// `display` and `position` are not inherited. `visibility` inherits from
    /// the nearest ancestor that sets it.
    pub fn computed_style(&self, id: NodeId) -> Option<ComputedStyle> {
        let el = self.element(id)?;
        let display = el.style.display.unwrap_or_else(|| user_agent_display(el));
        let position = el.style.position.unwrap_or_default();
        let visibility = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|n| self.element(n))
            .find_map(|e| e.style.visibility)
            .unwrap_or(Visibility::Visible);
        Some(ComputedStyle { display, visibility, position })
    }

    /// Whether the element and all its ancestors generate boxes
    pub fn is_rendered(&self, id: NodeId) -> bool {
        self.is_connected(id)
            && std::iter::once(id)
                .chain(self.ancestors(id))
                .filter(|&n| self.element(n).is_some())
                .all(|n| self.computed_style(n).is_some_and(|s| s.display != Display::None))
    }

    /// `offsetParent`: the containing block an element is laid out against.
    ///
    /// `None` when the element is detached, not rendered, fixed-positioned,
    /// or is `<body>` / `<html>`.
    pub fn offset_parent(&self, id: NodeId) -> Option<NodeId> {
        let el = self.element(id)?;
        if el.is("body") || el.is("html") || !self.is_rendered(id) {
            return None;
        }
        let own = self.computed_style(id)?;
        if own.position == Position::Fixed {
            return None;
        }
        self.ancestors(id).find(|&anc| {
            let Some(anc_el) = self.element(anc) else {
                return false;
            };
            let positioned = self
                .computed_style(anc)
                .is_some_and(|s| s.position != Position::Static);
            let table_like = own.position == Position::Static
                && (anc_el.is("td") || anc_el.is("th") || anc_el.is("table"));
            anc_el.is("body") || positioned || table_like
        })
    }

    // ------------------------------------------------------------------
    // Mutation observers
    // ------------------------------------------------------------------

    /// Start observing `root`
    pub fn observe(&mut self, root: NodeId, init: MutationObserverInit) -> ObserverId {
        let id = self.observers.register(root, init);
        tracing::debug!("Observer {:?} watching {:?}", id, root);
        id
    }

    /// Never report mutations inside `subtree` to `observer`
    pub fn exclude_subtree(&mut self, observer: ObserverId, subtree: NodeId) -> bool {
        match self.observers.get_mut(observer) {
            Some(reg) => {
                if !reg.excluded.contains(&subtree) {
                    reg.excluded.push(subtree);
                }
                true
            }
            None => false,
        }
    }

    /// Drain pending records of an observer
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(observer)
            .map(|reg| std::mem::take(&mut reg.records))
            .unwrap_or_default()
    }

    /// Whether an observer has queued records
    pub fn has_pending_records(&self, observer: ObserverId) -> bool {
        self.observers.get(observer).is_some_and(|reg| !reg.records.is_empty())
    }

    /// Stop an observer; pending records are discarded
    pub fn disconnect(&mut self, observer: ObserverId) -> bool {
        let removed = self.observers.remove(observer);
        if removed {
            tracing::debug!("Observer {:?} disconnected", observer);
        }
        removed
    }

    /// Number of live observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn queue_record(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let interested: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|reg| self.wants(reg.root, &reg.init, &reg.excluded, &record))
            .map(|reg| reg.id)
            .collect();
        for id in interested {
            if let Some(reg) = self.observers.get_mut(id) {
                reg.records.push(record.clone());
            }
        }
    }

    fn wants(&self, root: NodeId, init: &MutationObserverInit, excluded: &[NodeId], record: &MutationRecord) -> bool {
        let in_scope = record.target == root || (init.subtree && self.contains(root, record.target));
        if !in_scope {
            return false;
        }
        let kind_matches = match record.mutation_type {
            MutationType::ChildList => init.child_list,
            MutationType::CharacterData => init.character_data,
            MutationType::Attributes => record
                .attribute_name
                .as_deref()
                .is_some_and(|name| init.wants_attribute(name)),
        };
        if !kind_matches {
            return false;
        }
        let is_excluded = |node: NodeId| excluded.iter().any(|&ex| self.contains(ex, node));
        if is_excluded(record.target) {
            return false;
        }
        if record.mutation_type == MutationType::ChildList {
            let mut changed = record.changed_nodes().peekable();
            if changed.peek().is_some() && changed.all(is_excluded) {
                return false;
            }
        }
        true
    }
}

/// Display from the user-agent stylesheet: `[hidden]` and
/// `input[type=hidden]` generate no box, everything else by tag
fn user_agent_display(el: &ElementData) -> Display {
    let hidden_input = el.is("input") && el.get_attr("type").is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden"));
    if el.has_attr("hidden") || hidden_input {
        Display::None
    } else {
        Display::default_for(&el.tag)
    }
}

/// Iterator over children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.some()?;
        self.next = self.tree.get(current).map_or(NodeId::NONE, |n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over ancestors
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
