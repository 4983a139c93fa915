//! The live DOM as a [`FieldTree`].
//!
//! Registered elements are tagged through a `WeakMap`, so the page's nodes
//! never carry our state and a detached node can be collected as soon as it
//! is evicted. [`FieldElements`] is the strong side: the element, its
//! listeners and its marker badge, keyed by id. Dropping an entry removes
//! its listeners.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_events::EventListener;
use tonepro_core::{FieldId, FieldKind, FieldTree, NodeDescriptor, PlatformError, Size, marker_position};
use wasm_bindgen::JsValue;

use crate::dom;

const MARKER_SIZE: f64 = 16.0;

/// Field-level DOM events, forwarded to whoever drives the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    Input(FieldId),
    Focus(FieldId),
    Blur(FieldId),
}

pub type FieldEventSink = Rc<dyn Fn(FieldEvent)>;

struct FieldEntry {
    element: web_sys::Element,
    kind: FieldKind,
    marker: Option<web_sys::HtmlElement>,
    _listeners: Vec<EventListener>,
}

/// Registered elements, shared by the tree and the host.
pub struct FieldElements {
    tags: js_sys::WeakMap,
    entries: RefCell<HashMap<FieldId, FieldEntry>>,
}

impl Default for FieldElements {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldElements {
    pub fn new() -> Self {
        Self {
            tags: js_sys::WeakMap::new(),
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn element(&self, id: FieldId) -> Option<(web_sys::Element, FieldKind)> {
        self.entries
            .borrow()
            .get(&id)
            .map(|e| (e.element.clone(), e.kind))
    }

    pub fn id_of(&self, element: &web_sys::Element) -> Option<FieldId> {
        self.tags
            .get(element.as_ref())
            .as_f64()
            .map(|raw| FieldId::new(raw as u64))
    }

    /// Registered field that is `target` or contains it.
    pub fn field_containing(&self, target: &web_sys::Node) -> Option<FieldId> {
        self.entries
            .borrow()
            .iter()
            .find(|(_, entry)| entry.element.contains(Some(target)))
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Move every marker badge back onto its field.
    pub fn reposition_markers(&self) {
        let viewport = dom::viewport();
        for entry in self.entries.borrow().values() {
            let Some(marker) = &entry.marker else {
                continue;
            };
            let anchor = dom::bounding_rect(&entry.element);
            let (left, top) = marker_position(anchor, Size::new(MARKER_SIZE, MARKER_SIZE), viewport);
            dom::set_style(marker, "left", &format!("{left}px"));
            dom::set_style(marker, "top", &format!("{top}px"));
        }
    }

    /// Drop every entry, with its listeners and marker.
    pub fn clear(&self) {
        let ids: Vec<FieldId> = self.entries.borrow().keys().copied().collect();
        for id in ids {
            self.remove(id);
        }
    }

    fn insert(&self, id: FieldId, entry: FieldEntry) {
        self.tags
            .set(entry.element.as_ref(), &JsValue::from_f64(id.get() as f64));
        self.entries.borrow_mut().insert(id, entry);
    }

    fn remove(&self, id: FieldId) {
        let removed = self.entries.borrow_mut().remove(&id);
        if let Some(entry) = removed {
            self.tags.delete(entry.element.as_ref());
            if let Some(marker) = entry.marker {
                marker.remove();
            }
        }
    }
}

pub struct DomFieldTree {
    fields: Rc<FieldElements>,
    sink: FieldEventSink,
    show_markers: bool,
}

impl DomFieldTree {
    pub fn new(fields: Rc<FieldElements>, sink: FieldEventSink) -> Self {
        Self {
            fields,
            sink,
            show_markers: true,
        }
    }

    pub fn without_markers(mut self) -> Self {
        self.show_markers = false;
        self
    }

    pub fn fields(&self) -> &Rc<FieldElements> {
        &self.fields
    }

    fn listen(&self, element: &web_sys::Element, id: FieldId) -> Vec<EventListener> {
        let wire = |event: &'static str, make: fn(FieldId) -> FieldEvent| {
            let sink = self.sink.clone();
            EventListener::new(element, event, move |_| sink(make(id)))
        };
        vec![
            wire("input", FieldEvent::Input),
            wire("focus", FieldEvent::Focus),
            wire("blur", FieldEvent::Blur),
        ]
    }

    fn create_marker(&self, element: &web_sys::Element) -> Result<web_sys::HtmlElement, PlatformError> {
        let marker = dom::create_text("div", "tone-marker", "T")?;
        marker
            .set_attribute("aria-hidden", "true")
            .map_err(|e| format!("set_attribute failed: {:?}", e))?;
        dom::set_style(&marker, "position", "absolute");
        dom::set_style(&marker, "pointer-events", "none");
        dom::set_style(&marker, "width", &format!("{MARKER_SIZE}px"));
        dom::set_style(&marker, "height", &format!("{MARKER_SIZE}px"));
        dom::set_style(&marker, "z-index", "2147483646");

        let anchor = dom::bounding_rect(element);
        let (left, top) = marker_position(anchor, Size::new(MARKER_SIZE, MARKER_SIZE), dom::viewport());
        dom::set_style(&marker, "left", &format!("{left}px"));
        dom::set_style(&marker, "top", &format!("{top}px"));

        dom::body()?
            .append_child(&marker)
            .map_err(|e| format!("append_child failed: {:?}", e))?;
        Ok(marker)
    }
}

impl FieldTree for DomFieldTree {
    type Node = web_sys::Element;

    fn subtree(&self, root: &web_sys::Element) -> Vec<web_sys::Element> {
        dom::subtree(root)
    }

    fn describe(&self, node: &web_sys::Element) -> NodeDescriptor {
        dom::describe(node)
    }

    fn field_id(&self, node: &web_sys::Element) -> Option<FieldId> {
        self.fields.id_of(node)
    }

    fn is_attached(&self, node: &web_sys::Element) -> bool {
        node.is_connected()
    }

    fn attach(&self, node: &web_sys::Element, id: FieldId, kind: FieldKind) -> Result<(), PlatformError> {
        let marker = if self.show_markers {
            Some(self.create_marker(node)?)
        } else {
            None
        };
        let entry = FieldEntry {
            element: node.clone(),
            kind,
            marker,
            _listeners: self.listen(node, id),
        };
        self.fields.insert(id, entry);
        Ok(())
    }

    fn detach(&self, id: FieldId) {
        self.fields.remove(id);
    }
}
