//! tonepro-core: the page-side interaction engine, without framework dependencies.
//!
//! This crate provides:
//! - `FieldRegistry` and the `FieldTree` scan/evict walk for discovering editable fields
//! - `Debouncer` - the single global quiet-period slot
//! - `OverlayState` and `place_overlay` - the suggestion overlay lifecycle and geometry
//! - `Controller<H>` - ties it together, generic over a `ControllerHost`
//!
//! Everything that touches a real page goes through the traits in `platform`,
//! so the whole lifecycle can be driven from tests with an in-memory tree.

pub mod controller;
pub mod debounce;
pub mod field;
pub mod gateway;
pub mod overlay;
pub mod platform;
pub mod registry;
pub mod text;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{
    AnalysisRequest, BlurTicket, Controller, ControllerConfig, PointerTarget, Resolution,
};
pub use debounce::{DebounceTicket, Debouncer};
pub use field::{NodeDescriptor, RICH_EDITOR_CLASSES, TEXT_INPUT_TYPES, classify};
pub use gateway::{AnalysisGateway, run_analysis};
pub use overlay::{
    OverlayPhase, OverlayState, OverlayView, Placement, PlacementConfig, marker_position,
    place_overlay,
};
pub use platform::{
    ControllerHost, FieldPlatform, Notice, NoticeLevel, Notifier, OverlaySurface, PlatformError,
};
pub use registry::{FieldHandle, FieldRegistry, FieldTree, MutationBatch, evict, scan};
pub use smol_str::SmolStr;
pub use text::{meets_word_gate, word_count};
pub use tonepro_common::{AnalysisResult, Settings, Suggestion};
pub use types::{FieldId, FieldKind, Rect, RequestId, Size, Viewport};
