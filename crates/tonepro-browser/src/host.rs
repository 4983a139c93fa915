//! Browser implementation of the controller host traits.
//!
//! Calls that would re-enter page scripts (synthetic `input` events and
//! programmatic focus) are queued as [`Effect`]s instead of run in place.
//! The driver drains the queue with [`DomHost::take_effects`] once it has
//! released its borrow of the controller.

use std::cell::RefCell;
use std::rc::Rc;

use tonepro_core::{
    FieldId, FieldPlatform, Notice, Notifier, OverlaySurface, OverlayView, Placement,
    PlatformError, Rect, Size, Viewport,
};

use crate::dom;
use crate::overlay::OverlayElement;
use crate::toast;
use crate::tree::FieldElements;

/// Deferred host work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    NotifyChanged(FieldId),
    Focus(FieldId),
    /// Re-run placement after the next layout.
    Reposition,
}

pub struct DomHost {
    fields: Rc<FieldElements>,
    overlay: OverlayElement,
    effects: RefCell<Vec<Effect>>,
}

impl DomHost {
    pub fn new(fields: Rc<FieldElements>, overlay: OverlayElement) -> Self {
        Self {
            fields,
            overlay,
            effects: RefCell::new(Vec::new()),
        }
    }

    pub fn fields(&self) -> &Rc<FieldElements> {
        &self.fields
    }

    pub fn overlay(&self) -> &OverlayElement {
        &self.overlay
    }

    pub fn take_effects(&self) -> Vec<Effect> {
        std::mem::take(&mut *self.effects.borrow_mut())
    }

    fn push(&self, effect: Effect) {
        let mut effects = self.effects.borrow_mut();
        if !effects.contains(&effect) {
            effects.push(effect);
        }
    }
}

impl FieldPlatform for DomHost {
    fn read_text(&self, field: FieldId) -> Option<String> {
        let (element, kind) = self.fields.element(field)?;
        Some(dom::read_text(&element, kind))
    }

    fn write_text(&self, field: FieldId, text: &str) -> Result<(), PlatformError> {
        let (element, kind) = self
            .fields
            .element(field)
            .ok_or_else(|| PlatformError(format!("{field} is no longer registered")))?;
        dom::write_text(&element, kind, text)
    }

    fn notify_changed(&self, field: FieldId) {
        self.push(Effect::NotifyChanged(field));
    }

    fn focus(&self, field: FieldId) {
        self.push(Effect::Focus(field));
    }

    fn bounding_rect(&self, field: FieldId) -> Option<Rect> {
        let (element, _) = self.fields.element(field)?;
        Some(dom::bounding_rect(&element))
    }
}

impl OverlaySurface for DomHost {
    fn render(&self, _field: FieldId, view: OverlayView<'_>) -> Result<(), PlatformError> {
        self.overlay.render(view)
    }

    fn measure(&self) -> Option<Size> {
        self.overlay.measure()
    }

    fn place(&self, placement: Placement) {
        self.overlay.place(placement);
    }

    fn teardown(&self) {
        self.overlay.hide();
    }

    fn is_hovered(&self) -> bool {
        self.overlay.is_hovered()
    }

    fn viewport(&self) -> Viewport {
        dom::viewport()
    }

    fn schedule_reposition(&self) {
        self.push(Effect::Reposition);
    }
}

impl Notifier for DomHost {
    fn notify(&self, notice: Notice) {
        if let Err(e) = toast::show(&notice) {
            tracing::warn!(target: "tonepro::content", error = %e, message = %notice.message, "failed to show notice");
        }
    }
}
