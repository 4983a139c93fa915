//! In-memory tree and host used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use tonepro_common::{AnalysisResult, Suggestion};

use crate::field::NodeDescriptor;
use crate::gateway::AnalysisGateway;
use crate::overlay::{OverlayView, Placement};
use crate::platform::{FieldPlatform, Notice, Notifier, OverlaySurface, PlatformError};
use crate::registry::FieldTree;
use crate::types::{FieldId, FieldKind, Rect, Size, Viewport};

pub fn issues(suggestion: &str) -> AnalysisResult {
    AnalysisResult::Issues(Suggestion {
        issues: vec!["Demanding tone".to_string()],
        suggestion: suggestion.to_string(),
        explanation: "Softer phrasing reads as more collaborative".to_string(),
    })
}

struct MockNode {
    desc: NodeDescriptor,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Index-based tree. Node 0 is the document body.
pub struct MockTree {
    nodes: RefCell<Vec<MockNode>>,
    tags: RefCell<HashMap<usize, FieldId>>,
    attach_counts: RefCell<HashMap<usize, usize>>,
    failing: RefCell<HashSet<usize>>,
}

impl MockTree {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![MockNode {
                desc: NodeDescriptor::element("body"),
                parent: None,
                children: Vec::new(),
            }]),
            tags: RefCell::new(HashMap::new()),
            attach_counts: RefCell::new(HashMap::new()),
            failing: RefCell::new(HashSet::new()),
        }
    }

    pub fn root(&self) -> usize {
        0
    }

    /// Create a node that is not yet in the tree.
    pub fn detached(&self, desc: NodeDescriptor) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(MockNode {
            desc,
            parent: None,
            children: Vec::new(),
        });
        nodes.len() - 1
    }

    pub fn append(&self, parent: usize, desc: NodeDescriptor) -> usize {
        let node = self.detached(desc);
        self.reattach(parent, node);
        node
    }

    pub fn remove(&self, node: usize) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node].parent.take() {
            nodes[parent].children.retain(|&c| c != node);
        }
    }

    pub fn reattach(&self, parent: usize, node: usize) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[node].parent = Some(parent);
        nodes[parent].children.push(node);
    }

    pub fn fail_attach(&self, node: usize) {
        self.failing.borrow_mut().insert(node);
    }

    pub fn attach_count(&self, node: usize) -> usize {
        self.attach_counts.borrow().get(&node).copied().unwrap_or(0)
    }

    pub fn node_for(&self, id: FieldId) -> Option<usize> {
        self.tags
            .borrow()
            .iter()
            .find(|(_, tagged)| **tagged == id)
            .map(|(node, _)| *node)
    }
}

impl FieldTree for MockTree {
    type Node = usize;

    fn subtree(&self, root: &usize) -> Vec<usize> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack = vec![*root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(nodes[node].children.iter().rev());
        }
        out
    }

    fn describe(&self, node: &usize) -> NodeDescriptor {
        let nodes = self.nodes.borrow();
        let mut desc = nodes[*node].desc.clone();
        let mut ancestor = nodes[*node].parent;
        while let Some(a) = ancestor {
            if nodes[a].desc.is_editable_host() {
                desc.inside_editable_host = true;
                break;
            }
            ancestor = nodes[a].parent;
        }
        desc
    }

    fn field_id(&self, node: &usize) -> Option<FieldId> {
        self.tags.borrow().get(node).copied()
    }

    fn is_attached(&self, node: &usize) -> bool {
        let nodes = self.nodes.borrow();
        let mut cursor = *node;
        loop {
            if cursor == 0 {
                return true;
            }
            match nodes[cursor].parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    fn attach(&self, node: &usize, id: FieldId, _kind: FieldKind) -> Result<(), PlatformError> {
        if self.failing.borrow().contains(node) {
            return Err("listener registration failed".into());
        }
        self.tags.borrow_mut().insert(*node, id);
        *self.attach_counts.borrow_mut().entry(*node).or_default() += 1;
        Ok(())
    }

    fn detach(&self, id: FieldId) {
        self.tags.borrow_mut().retain(|_, tagged| *tagged != id);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Loading,
    Suggestion(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Render(FieldId, Rendered),
    Place(Placement),
    Teardown,
    Notify(Notice),
    Write(FieldId, String),
    Changed(FieldId),
    Focus(FieldId),
}

/// Host double that records every call.
pub struct MockHost {
    texts: RefCell<HashMap<FieldId, String>>,
    rects: RefCell<HashMap<FieldId, Rect>>,
    events: RefCell<Vec<HostEvent>>,
    hovered: Cell<bool>,
    fail_render: Cell<bool>,
    fail_write: Cell<bool>,
    measured: Cell<Option<Size>>,
    reposition_requests: Cell<usize>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            texts: RefCell::new(HashMap::new()),
            rects: RefCell::new(HashMap::new()),
            events: RefCell::new(Vec::new()),
            hovered: Cell::new(false),
            fail_render: Cell::new(false),
            fail_write: Cell::new(false),
            measured: Cell::new(None),
            reposition_requests: Cell::new(0),
        }
    }

    pub fn set_text(&self, field: FieldId, text: &str) {
        self.texts.borrow_mut().insert(field, text.to_string());
    }

    pub fn text(&self, field: FieldId) -> Option<String> {
        self.texts.borrow().get(&field).cloned()
    }

    pub fn set_rect(&self, field: FieldId, rect: Rect) {
        self.rects.borrow_mut().insert(field, rect);
    }

    pub fn set_hovered(&self, hovered: bool) {
        self.hovered.set(hovered);
    }

    pub fn set_fail_render(&self, fail: bool) {
        self.fail_render.set(fail);
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.fail_write.set(fail);
    }

    pub fn set_measured(&self, size: Size) {
        self.measured.set(Some(size));
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&HostEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                HostEvent::Notify(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn reposition_requests(&self) -> usize {
        self.reposition_requests.get()
    }

    fn record(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl FieldPlatform for MockHost {
    fn read_text(&self, field: FieldId) -> Option<String> {
        Some(self.text(field).unwrap_or_default())
    }

    fn write_text(&self, field: FieldId, text: &str) -> Result<(), PlatformError> {
        if self.fail_write.get() {
            return Err("field rejected write".into());
        }
        self.set_text(field, text);
        self.record(HostEvent::Write(field, text.to_string()));
        Ok(())
    }

    fn notify_changed(&self, field: FieldId) {
        self.record(HostEvent::Changed(field));
    }

    fn focus(&self, field: FieldId) {
        self.record(HostEvent::Focus(field));
    }

    fn bounding_rect(&self, field: FieldId) -> Option<Rect> {
        self.rects.borrow().get(&field).copied()
    }
}

impl OverlaySurface for MockHost {
    fn render(&self, field: FieldId, view: OverlayView<'_>) -> Result<(), PlatformError> {
        if self.fail_render.get() {
            return Err("overlay root missing".into());
        }
        let rendered = match view {
            OverlayView::Loading => Rendered::Loading,
            OverlayView::Suggestion(s) => Rendered::Suggestion(s.suggestion.clone()),
        };
        self.record(HostEvent::Render(field, rendered));
        Ok(())
    }

    fn measure(&self) -> Option<Size> {
        self.measured.get()
    }

    fn place(&self, placement: Placement) {
        self.record(HostEvent::Place(placement));
    }

    fn teardown(&self) {
        self.record(HostEvent::Teardown);
    }

    fn is_hovered(&self) -> bool {
        self.hovered.get()
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(1024.0, 768.0)
    }

    fn schedule_reposition(&self) {
        self.reposition_requests.set(self.reposition_requests.get() + 1);
    }
}

impl Notifier for MockHost {
    fn notify(&self, notice: Notice) {
        self.record(HostEvent::Notify(notice));
    }
}

/// Gateway that answers every request with the same result.
pub struct CannedGateway {
    pub result: AnalysisResult,
    pub seen: RefCell<Vec<String>>,
}

impl CannedGateway {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            result,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl AnalysisGateway for CannedGateway {
    async fn analyze(&self, text: &str) -> AnalysisResult {
        self.seen.borrow_mut().push(text.to_string());
        self.result.clone()
    }
}
