//! Platform abstraction traits for the page controller.
//!
//! These traits are the boundary between the controller logic and whatever
//! actually owns the page (the browser DOM, or an in-memory double in tests).
//! The controller never touches nodes directly; it talks to fields by
//! [`FieldId`] and to the overlay as a single surface.

use std::time::Duration;

use crate::overlay::{OverlayView, Placement};
use crate::types::{FieldId, Rect, Size, Viewport};

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Text access and host notifications for registered fields.
pub trait FieldPlatform {
    /// Current text of the field: `value` for native controls, text content otherwise.
    ///
    /// Returns None if the field is no longer attached.
    fn read_text(&self, field: FieldId) -> Option<String>;

    /// Replace the whole text of the field.
    fn write_text(&self, field: FieldId, text: &str) -> Result<(), PlatformError>;

    /// Tell page scripts the field changed (a bubbling synthetic `input` event).
    ///
    /// Implementations may defer delivery until the controller has finished
    /// its current transition, and the browser host does.
    fn notify_changed(&self, field: FieldId);

    /// Move focus back to the field. Same deferral rules as `notify_changed`.
    fn focus(&self, field: FieldId);

    /// Bounding rectangle of the field in viewport coordinates.
    fn bounding_rect(&self, field: FieldId) -> Option<Rect>;
}

/// The singleton suggestion overlay.
pub trait OverlaySurface {
    /// Replace the overlay contents and make it visible.
    fn render(&self, field: FieldId, view: OverlayView<'_>) -> Result<(), PlatformError>;

    /// Rendered size, once laid out.
    fn measure(&self) -> Option<Size>;

    /// Move the overlay (page coordinates).
    fn place(&self, placement: Placement);

    /// Hide the overlay and drop its contents.
    fn teardown(&self);

    /// Whether the pointer is currently over the overlay.
    fn is_hovered(&self) -> bool;

    fn viewport(&self) -> Viewport;

    /// Ask for [`Controller::reposition`](crate::Controller::reposition) to be
    /// called once the rendered overlay has been laid out.
    fn schedule_reposition(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient page notification ("toast").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// How long the notice stays up before it removes itself.
    pub ttl: Duration,
}

impl Notice {
    pub fn error(message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            ttl,
        }
    }
}

pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Everything a [`Controller`](crate::Controller) needs from its host.
pub trait ControllerHost: FieldPlatform + OverlaySurface + Notifier {}

impl<T: FieldPlatform + OverlaySurface + Notifier> ControllerHost for T {}
