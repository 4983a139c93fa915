//! Suggestion overlay lifecycle and placement.

use crate::types::{FieldId, Rect, RequestId, Size, Viewport};
use tonepro_common::Suggestion;

/// State of the singleton overlay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Hidden,
    /// A request is outstanding for `field`.
    Loading { field: FieldId, request: RequestId },
    /// A suggestion is on screen for `field`.
    Showing {
        field: FieldId,
        suggestion: Suggestion,
    },
}

/// Data-free view of [`OverlayState`] for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Hidden,
    Loading,
    Showing,
}

impl OverlayState {
    pub fn phase(&self) -> OverlayPhase {
        match self {
            OverlayState::Hidden => OverlayPhase::Hidden,
            OverlayState::Loading { .. } => OverlayPhase::Loading,
            OverlayState::Showing { .. } => OverlayPhase::Showing,
        }
    }

    /// Field the overlay is attached to, if visible.
    pub fn target(&self) -> Option<FieldId> {
        match self {
            OverlayState::Hidden => None,
            OverlayState::Loading { field, .. } | OverlayState::Showing { field, .. } => {
                Some(*field)
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, OverlayState::Hidden)
    }
}

/// What the surface should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayView<'a> {
    /// Indeterminate progress next to the field.
    Loading,
    /// Issues, rewrite, rationale and the Accept/Dismiss/Close controls.
    Suggestion(&'a Suggestion),
}

/// Overlay position in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    /// Placed above the field because there was no room below.
    pub flipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementConfig {
    /// Distance between the field and the overlay.
    pub gap: f64,
    /// Minimum distance from the viewport edges.
    pub margin: f64,
    /// Size assumed before the overlay has been measured.
    pub estimated: Size,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            gap: 5.0,
            margin: 10.0,
            estimated: Size::new(350.0, 200.0),
        }
    }
}

/// Position an overlay of `size` next to `anchor`.
///
/// Below the anchor by default, pulled left to stay inside the right edge,
/// flipped above the anchor when it would run past the bottom edge, and never
/// closer than `margin` to the top-left corner.
pub fn place_overlay(
    anchor: Rect,
    size: Size,
    viewport: Viewport,
    config: &PlacementConfig,
) -> Placement {
    let mut left = anchor.x;
    let mut top = anchor.bottom() + config.gap;
    let mut flipped = false;

    if left + size.width > viewport.width {
        left = viewport.width - size.width - config.margin;
    }
    if top + size.height > viewport.height {
        top = anchor.y - size.height - config.gap;
        flipped = true;
    }

    Placement {
        left: left.max(config.margin) + viewport.scroll_x,
        top: top.max(config.margin) + viewport.scroll_y,
        flipped,
    }
}

/// Page position for a field's marker badge: inside the top-right corner.
pub fn marker_position(anchor: Rect, badge: Size, viewport: Viewport) -> (f64, f64) {
    const INSET: f64 = 4.0;
    let left = (anchor.right() - badge.width - INSET).max(anchor.x);
    let top = anchor.y + INSET;
    (left + viewport.scroll_x, top + viewport.scroll_y)
}
