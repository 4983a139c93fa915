//! The suggestion overlay element.
//!
//! One absolutely positioned `div` appended to the body once and reused.
//! Contents are built with `textContent` only; model output never reaches
//! `innerHTML`.

use tonepro_core::{OverlayView, Placement, PlatformError, Size, Suggestion};
use wasm_bindgen::JsCast;

use crate::dom;

pub const OVERLAY_ID: &str = "tone-professional-suggestion";

/// Button actions, carried in `data-action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Accept,
    Dismiss,
    Close,
}

impl OverlayAction {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayAction::Accept => "accept",
            OverlayAction::Dismiss => "dismiss",
            OverlayAction::Close => "close",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(OverlayAction::Accept),
            "dismiss" => Some(OverlayAction::Dismiss),
            "close" => Some(OverlayAction::Close),
            _ => None,
        }
    }

    /// Action of the button an event landed on, if any.
    pub fn from_event_target(target: &web_sys::EventTarget) -> Option<Self> {
        let element = target.dyn_ref::<web_sys::Element>()?;
        let button = element.closest("[data-action]").ok().flatten()?;
        Self::parse(&button.get_attribute("data-action")?)
    }
}

pub struct OverlayElement {
    root: web_sys::HtmlElement,
}

impl OverlayElement {
    /// Create the hidden overlay and attach it to the body.
    pub fn install() -> Result<Self, PlatformError> {
        let root = dom::create("div")?;
        root.set_id(OVERLAY_ID);
        root.set_class_name("tone-suggestion-box");
        dom::set_style(&root, "position", "absolute");
        dom::set_style(&root, "z-index", "2147483647");
        dom::set_style(&root, "display", "none");
        dom::body()?
            .append_child(&root)
            .map_err(|e| format!("append_child failed: {:?}", e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &web_sys::HtmlElement {
        &self.root
    }

    pub fn contains(&self, target: &web_sys::Node) -> bool {
        self.root.contains(Some(target))
    }

    pub fn render(&self, view: OverlayView<'_>) -> Result<(), PlatformError> {
        self.root.set_text_content(None);
        match view {
            OverlayView::Loading => self.render_loading()?,
            OverlayView::Suggestion(suggestion) => self.render_suggestion(suggestion)?,
        }
        dom::set_style(&self.root, "display", "block");
        Ok(())
    }

    fn render_loading(&self) -> Result<(), PlatformError> {
        let wrapper = dom::create_text("div", "tone-suggestion-loading", "")?;
        wrapper.append_child(&dom::create_text("div", "loading-spinner", "")?.into()).map_err(append_err)?;
        wrapper
            .append_child(&dom::create_text("span", "", "Analyzing tone...")?.into())
            .map_err(append_err)?;
        self.root.append_child(&wrapper).map_err(append_err)?;
        Ok(())
    }

    fn render_suggestion(&self, suggestion: &Suggestion) -> Result<(), PlatformError> {
        let header = dom::create_text("div", "tone-suggestion-header", "")?;
        header
            .append_child(&dom::create_text("span", "tone-title", "Tone Suggestion")?.into())
            .map_err(append_err)?;
        header.append_child(&button("tone-close", "\u{00d7}", OverlayAction::Close)?.into()).map_err(append_err)?;

        let content = dom::create_text("div", "tone-suggestion-content", "")?;

        if !suggestion.issues.is_empty() {
            let issues = dom::create_text("div", "tone-issues", "")?;
            issues
                .append_child(&dom::create_text("strong", "", "Issues found:")?.into())
                .map_err(append_err)?;
            let list = dom::create("ul")?;
            for issue in &suggestion.issues {
                list.append_child(&dom::create_text("li", "", issue)?.into()).map_err(append_err)?;
            }
            issues.append_child(&list).map_err(append_err)?;
            content.append_child(&issues).map_err(append_err)?;
        }

        let revision = dom::create_text("div", "tone-suggestion-text", "")?;
        revision
            .append_child(&dom::create_text("strong", "", "Suggested revision:")?.into())
            .map_err(append_err)?;
        revision
            .append_child(&dom::create_text("p", "suggestion-text", &suggestion.suggestion)?.into())
            .map_err(append_err)?;
        content.append_child(&revision).map_err(append_err)?;

        if !suggestion.explanation.is_empty() {
            let explanation = dom::create_text("div", "tone-explanation", "")?;
            explanation
                .append_child(&dom::create_text("small", "", &suggestion.explanation)?.into())
                .map_err(append_err)?;
            content.append_child(&explanation).map_err(append_err)?;
        }

        let actions = dom::create_text("div", "tone-actions", "")?;
        actions
            .append_child(&button("tone-accept-btn", "Accept Suggestion", OverlayAction::Accept)?.into())
            .map_err(append_err)?;
        actions
            .append_child(&button("tone-dismiss-btn", "Dismiss", OverlayAction::Dismiss)?.into())
            .map_err(append_err)?;
        content.append_child(&actions).map_err(append_err)?;

        self.root.append_child(&header).map_err(append_err)?;
        self.root.append_child(&content).map_err(append_err)?;
        Ok(())
    }

    pub fn measure(&self) -> Option<Size> {
        let rect = self.root.get_bounding_client_rect();
        (rect.width() > 0.0 && rect.height() > 0.0).then(|| Size::new(rect.width(), rect.height()))
    }

    pub fn place(&self, placement: Placement) {
        dom::set_style(&self.root, "left", &format!("{}px", placement.left));
        dom::set_style(&self.root, "top", &format!("{}px", placement.top));
        let flipped = if placement.flipped { "true" } else { "false" };
        if let Err(e) = self.root.set_attribute("data-flipped", flipped) {
            tracing::trace!(target: "tonepro::overlay", error = ?e, "set_attribute failed");
        }
    }

    pub fn hide(&self) {
        dom::set_style(&self.root, "display", "none");
        self.root.set_text_content(None);
    }

    pub fn is_visible(&self) -> bool {
        self.root
            .style()
            .get_property_value("display")
            .map(|d| d != "none")
            .unwrap_or(false)
    }

    pub fn is_hovered(&self) -> bool {
        self.root.matches(":hover").unwrap_or(false)
    }
}

fn button(class: &str, label: &str, action: OverlayAction) -> Result<web_sys::HtmlElement, PlatformError> {
    let button = dom::create_text("button", class, label)?;
    button
        .set_attribute("type", "button")
        .map_err(|e| format!("set_attribute failed: {:?}", e))?;
    button
        .set_attribute("data-action", action.as_str())
        .map_err(|e| format!("set_attribute failed: {:?}", e))?;
    Ok(button)
}

fn append_err(e: wasm_bindgen::JsValue) -> PlatformError {
    PlatformError(format!("append_child failed: {:?}", e))
}
