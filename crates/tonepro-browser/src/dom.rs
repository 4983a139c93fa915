//! Small DOM helpers shared by the field tree, the host and the popup.

use tonepro_core::{FieldKind, NodeDescriptor, PlatformError, Rect, SmolStr, Viewport};
use wasm_bindgen::JsCast;

/// Matches any ancestor that makes its descendants part of one editable host.
pub const EDITABLE_HOST_SELECTOR: &str = concat!(
    r#"[contenteditable=""], [contenteditable="true" i], [contenteditable="plaintext-only" i], "#,
    r#"[role="textbox" i], .ql-editor, .public-DraftEditor-content, .ProseMirror"#
);

pub fn window() -> Result<web_sys::Window, PlatformError> {
    web_sys::window().ok_or_else(|| PlatformError::from("no window"))
}

pub fn document() -> Result<web_sys::Document, PlatformError> {
    window()?
        .document()
        .ok_or_else(|| PlatformError::from("no document"))
}

pub fn body() -> Result<web_sys::HtmlElement, PlatformError> {
    document()?
        .body()
        .ok_or_else(|| PlatformError::from("no body"))
}

/// The `<html>` element. Survives `document.body` being replaced.
pub fn root() -> Result<web_sys::Element, PlatformError> {
    document()?
        .document_element()
        .ok_or_else(|| PlatformError::from("no document element"))
}

pub fn create(tag: &str) -> Result<web_sys::HtmlElement, PlatformError> {
    let element = document()?
        .create_element(tag)
        .map_err(|e| format!("create_element({tag}) failed: {:?}", e))?;
    element
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|_| PlatformError::from("created element is not an HtmlElement"))
}

/// Create an element with a class and text content.
pub fn create_text(tag: &str, class: &str, text: &str) -> Result<web_sys::HtmlElement, PlatformError> {
    let element = create(tag)?;
    element.set_class_name(class);
    element.set_text_content(Some(text));
    Ok(element)
}

pub fn set_style(element: &web_sys::HtmlElement, property: &str, value: &str) {
    if let Err(e) = element.style().set_property(property, value) {
        tracing::trace!(target: "tonepro::dom", property, error = ?e, "set_property failed");
    }
}

/// Snapshot the attributes the field predicate needs.
pub fn describe(element: &web_sys::Element) -> NodeDescriptor {
    let classes = element.class_list();
    let classes = (0..classes.length())
        .filter_map(|i| classes.item(i))
        .map(SmolStr::from)
        .collect();

    let inside_editable_host = element
        .parent_element()
        .and_then(|parent| parent.closest(EDITABLE_HOST_SELECTOR).ok().flatten())
        .is_some();

    NodeDescriptor {
        tag: SmolStr::new(element.tag_name().to_ascii_lowercase()),
        input_type: element.get_attribute("type").map(SmolStr::from),
        content_editable: element.get_attribute("contenteditable").map(SmolStr::from),
        role: element.get_attribute("role").map(SmolStr::from),
        classes,
        disabled: element.has_attribute("disabled"),
        read_only: element.has_attribute("readonly"),
        inside_editable_host,
    }
}

pub fn read_text(element: &web_sys::Element, kind: FieldKind) -> String {
    if kind.uses_value() {
        if let Some(input) = element.dyn_ref::<web_sys::HtmlInputElement>() {
            return input.value();
        }
        if let Some(area) = element.dyn_ref::<web_sys::HtmlTextAreaElement>() {
            return area.value();
        }
    }
    element.text_content().unwrap_or_default()
}

pub fn write_text(element: &web_sys::Element, kind: FieldKind, text: &str) -> Result<(), PlatformError> {
    match kind {
        FieldKind::PlainInput => element
            .dyn_ref::<web_sys::HtmlInputElement>()
            .ok_or_else(|| PlatformError::from("field is not an input"))?
            .set_value(text),
        FieldKind::TextArea => element
            .dyn_ref::<web_sys::HtmlTextAreaElement>()
            .ok_or_else(|| PlatformError::from("field is not a textarea"))?
            .set_value(text),
        FieldKind::ContentEditable => element.set_text_content(Some(text)),
    }
    Ok(())
}

/// Fire a bubbling `input` event so page scripts see a programmatic write.
pub fn dispatch_input(element: &web_sys::Element) -> Result<(), PlatformError> {
    let init = web_sys::EventInit::new();
    init.set_bubbles(true);
    let event = web_sys::Event::new_with_event_init_dict("input", &init)
        .map_err(|e| format!("Event::new failed: {:?}", e))?;
    element
        .dispatch_event(&event)
        .map_err(|e| format!("dispatch_event failed: {:?}", e))?;
    Ok(())
}

pub fn focus(element: &web_sys::Element) -> Result<(), PlatformError> {
    element
        .dyn_ref::<web_sys::HtmlElement>()
        .ok_or_else(|| PlatformError::from("field is not focusable"))?
        .focus()
        .map_err(|e| format!("focus failed: {:?}", e))?;
    Ok(())
}

pub fn bounding_rect(element: &web_sys::Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

pub fn viewport() -> Viewport {
    let Ok(window) = window() else {
        return Viewport::default();
    };
    let number = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    Viewport::new(number(window.inner_width()), number(window.inner_height()))
        .scrolled(window.scroll_x().unwrap_or(0.0), window.scroll_y().unwrap_or(0.0))
}

/// Elements in `root`'s subtree, `root` first, in document order.
pub fn subtree(root: &web_sys::Element) -> Vec<web_sys::Element> {
    let mut out = vec![root.clone()];
    if let Ok(descendants) = root.query_selector_all("*") {
        out.extend(
            (0..descendants.length())
                .filter_map(|i| descendants.item(i))
                .filter_map(|node| node.dyn_into::<web_sys::Element>().ok()),
        );
    }
    out
}
