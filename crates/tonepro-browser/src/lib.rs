//! Browser layer for the tone extension.
//!
//! Implements the `tonepro-core` platform traits on top of `web-sys`:
//! - [`tree`] - the live DOM as a `FieldTree`, with per-field listeners and marker badges
//! - [`host`] - `DomHost`, the controller's view of fields, overlay and notices
//! - [`overlay`] and [`toast`] - the suggestion box and transient notices
//! - [`chrome`] - `chrome.runtime` messaging and `chrome.storage.sync`
//!
//! [`content::ContentScript`] and [`popup::Popup`] wire these into the two
//! extension pages that have a document.

pub mod chrome;
pub mod content;
pub mod dom;
pub mod host;
pub mod overlay;
pub mod popup;
pub mod toast;
pub mod tree;

pub use chrome::{ChromeStorage, RuntimeGateway};
pub use content::ContentScript;
pub use host::{DomHost, Effect};
pub use overlay::{OVERLAY_ID, OverlayAction, OverlayElement};
pub use popup::Popup;
pub use tree::{DomFieldTree, FieldElements, FieldEvent, FieldEventSink};

// Re-export core for convenience
pub use tonepro_core;
