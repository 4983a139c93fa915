//! Field registry and the scan/evict walks that feed it.

use std::collections::HashMap;

use crate::field::{NodeDescriptor, classify};
use crate::platform::PlatformError;
use crate::types::{FieldId, FieldKind, RequestId};

/// Controller-side state for one registered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHandle {
    pub id: FieldId,
    pub kind: FieldKind,
    /// Last text submitted for analysis; suppresses duplicate requests.
    pub last_checked_text: Option<String>,
    /// Outstanding request for this field, if any.
    pub in_flight: Option<RequestId>,
}

impl FieldHandle {
    fn new(id: FieldId, kind: FieldKind) -> Self {
        Self {
            id,
            kind,
            last_checked_text: None,
            in_flight: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: HashMap<FieldId, FieldHandle>,
    next_id: u64,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: FieldKind) -> FieldId {
        self.next_id += 1;
        let id = FieldId::new(self.next_id);
        self.fields.insert(id, FieldHandle::new(id, kind));
        id
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldHandle> {
        self.fields.get(&id)
    }

    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut FieldHandle> {
        self.fields.get_mut(&id)
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.fields.contains_key(&id)
    }

    pub fn remove(&mut self, id: FieldId) -> Option<FieldHandle> {
        self.fields.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A DOM-like tree the registry can walk and tag.
///
/// The browser implementation walks real elements and keeps the node/id
/// association in a weak map; tests use an index-based tree.
pub trait FieldTree {
    type Node: Clone;

    /// `root` followed by its descendants, in document order.
    fn subtree(&self, root: &Self::Node) -> Vec<Self::Node>;

    fn describe(&self, node: &Self::Node) -> NodeDescriptor;

    /// Id previously attached to `node`, if any.
    fn field_id(&self, node: &Self::Node) -> Option<FieldId>;

    /// Whether `node` is still part of the live document.
    fn is_attached(&self, node: &Self::Node) -> bool;

    /// Associate `node` with `id` and wire its listeners and marker.
    fn attach(&self, node: &Self::Node, id: FieldId, kind: FieldKind)
    -> Result<(), PlatformError>;

    /// Undo `attach`. Must tolerate ids that were never attached.
    fn detach(&self, id: FieldId);
}

/// One batch of structural changes, as delivered by a mutation observer.
#[derive(Debug, Clone)]
pub struct MutationBatch<N> {
    pub added: Vec<N>,
    pub removed: Vec<N>,
}

impl<N> Default for MutationBatch<N> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// Register every editable node under `root`, `root` included.
///
/// Nodes that already carry a live registration are left alone, so
/// overlapping or repeated scans register each node once. Returns the newly
/// registered ids.
pub fn scan<T: FieldTree>(
    tree: &T,
    registry: &mut FieldRegistry,
    root: &T::Node,
) -> Vec<FieldId> {
    let mut added = Vec::new();
    for node in tree.subtree(root) {
        if tree
            .field_id(&node)
            .is_some_and(|id| registry.contains(id))
        {
            continue;
        }
        let Some(kind) = classify(&tree.describe(&node)) else {
            continue;
        };
        let id = registry.register(kind);
        if let Err(e) = tree.attach(&node, id, kind) {
            tracing::warn!(target: "tonepro::registry", field = %id, error = %e, "failed to wire field");
            registry.remove(id);
            continue;
        }
        tracing::debug!(target: "tonepro::registry", field = %id, ?kind, "registered field");
        added.push(id);
    }
    added
}

/// Drop registrations for every field under a removed `root`.
///
/// Nodes that are still attached were moved rather than removed and keep
/// their registration. Returns the evicted ids.
pub fn evict<T: FieldTree>(
    tree: &T,
    registry: &mut FieldRegistry,
    root: &T::Node,
) -> Vec<FieldId> {
    let mut evicted = Vec::new();
    for node in tree.subtree(root) {
        let Some(id) = tree.field_id(&node) else {
            continue;
        };
        if tree.is_attached(&node) {
            continue;
        }
        tree.detach(id);
        if registry.remove(id).is_some() {
            tracing::debug!(target: "tonepro::registry", field = %id, "evicted field");
            evicted.push(id);
        }
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTree;

    fn sample_tree() -> (MockTree, usize, usize, usize) {
        let tree = MockTree::new();
        let root = tree.root();
        let form = tree.append(root, NodeDescriptor::element("form"));
        let input = tree.append(form, NodeDescriptor::element("input").with_type("email"));
        let _password = tree.append(form, NodeDescriptor::element("input").with_type("password"));
        let area = tree.append(root, NodeDescriptor::element("textarea"));
        let editor = tree.append(root, NodeDescriptor::element("div").with_content_editable("true"));
        // Paragraphs inside an editable host are not separate fields.
        tree.append(editor, NodeDescriptor::element("p").with_content_editable("true"));
        (tree, form, input, area)
    }

    #[test]
    fn test_scan_registers_matching_nodes() {
        let (tree, _, input, area) = sample_tree();
        let mut registry = FieldRegistry::new();
        let added = scan(&tree, &mut registry, &tree.root());

        assert_eq!(added.len(), 3);
        assert_eq!(registry.len(), 3);
        let input_id = tree.field_id(&input).unwrap();
        assert_eq!(registry.get(input_id).unwrap().kind, FieldKind::PlainInput);
        let area_id = tree.field_id(&area).unwrap();
        assert_eq!(registry.get(area_id).unwrap().kind, FieldKind::TextArea);
    }

    #[test]
    fn test_overlapping_scans_register_once() {
        let (tree, form, input, _) = sample_tree();
        let mut registry = FieldRegistry::new();
        scan(&tree, &mut registry, &form);
        let again = scan(&tree, &mut registry, &tree.root());
        let third = scan(&tree, &mut registry, &tree.root());

        assert_eq!(registry.len(), 3);
        assert_eq!(again.len(), 2);
        assert!(third.is_empty());
        assert_eq!(tree.attach_count(input), 1);
    }

    #[test]
    fn test_attach_failure_leaves_no_handle() {
        let tree = MockTree::new();
        let area = tree.append(tree.root(), NodeDescriptor::element("textarea"));
        tree.fail_attach(area);
        let mut registry = FieldRegistry::new();
        assert!(scan(&tree, &mut registry, &tree.root()).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_evict_removed_subtree() {
        let (tree, form, input, area) = sample_tree();
        let mut registry = FieldRegistry::new();
        scan(&tree, &mut registry, &tree.root());
        let input_id = tree.field_id(&input).unwrap();

        tree.remove(form);
        let evicted = evict(&tree, &mut registry, &form);
        assert_eq!(evicted, vec![input_id]);
        assert!(!registry.contains(input_id));
        assert_eq!(tree.field_id(&input), None);
        assert!(tree.field_id(&area).is_some());
    }

    #[test]
    fn test_moved_node_keeps_registration() {
        let (tree, form, input, _) = sample_tree();
        let mut registry = FieldRegistry::new();
        scan(&tree, &mut registry, &tree.root());
        let input_id = tree.field_id(&input).unwrap();

        // Removed and re-inserted before the batch is processed.
        tree.remove(form);
        tree.reattach(tree.root(), form);
        assert!(evict(&tree, &mut registry, &form).is_empty());
        assert!(scan(&tree, &mut registry, &form).is_empty());
        assert!(registry.contains(input_id));
    }

    #[test]
    fn test_removed_then_readded_registers_fresh() {
        let (tree, form, input, _) = sample_tree();
        let mut registry = FieldRegistry::new();
        scan(&tree, &mut registry, &tree.root());
        let first = tree.field_id(&input).unwrap();

        tree.remove(form);
        evict(&tree, &mut registry, &form);
        tree.reattach(tree.root(), form);
        let added = scan(&tree, &mut registry, &form);

        assert_eq!(added.len(), 1);
        assert_ne!(added[0], first);
        assert_eq!(tree.field_id(&input), Some(added[0]));
    }
}
