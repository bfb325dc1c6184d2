//! DOM Observers
//!
//! MutationObserver registrations live on the tree so every mutation can be
//! matched against them as it happens. Records are queued per observer and
//! drained by the host with [`DomTree::take_records`](crate::DomTree::take_records).

use crate::NodeId;

/// Observer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Whether an attribute change passes `attributes` + `attribute_filter`
    pub fn wants_attribute(&self, name: &str) -> bool {
        self.attributes
            && self
                .attribute_filter
                .as_ref()
                .is_none_or(|filter| filter.iter().any(|f| f.eq_ignore_ascii_case(name)))
    }
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attributes(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_ascii_lowercase()),
            old_value,
        }
    }

    pub fn character_data(target: NodeId, old_value: String) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: None,
            old_value: Some(old_value),
        }
    }

    /// Nodes added or removed by a child-list record
    pub fn changed_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.added_nodes.iter().chain(self.removed_nodes.iter()).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// One `observe()` call
#[derive(Debug)]
pub(crate) struct Registration {
    pub id: ObserverId,
    pub root: NodeId,
    pub init: MutationObserverInit,
    /// Subtrees whose mutations are never reported
    pub excluded: Vec<NodeId>,
    pub records: Vec<MutationRecord>,
}

/// All live observer registrations
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    registrations: Vec<Registration>,
    next_id: u32,
}

impl ObserverRegistry {
    pub fn register(&mut self, root: NodeId, init: MutationObserverInit) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration {
            id,
            root,
            init,
            excluded: Vec::new(),
            records: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: ObserverId) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: ObserverId) -> Option<&mut Registration> {
        self.registrations.iter_mut().find(|r| r.id == id)
    }

    /// Drop a registration and its pending records
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() < before
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }
}
