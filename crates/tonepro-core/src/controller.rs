//! The page controller: field tracking, debounced analysis and the overlay
//! state machine.
//!
//! `Controller` owns every piece of mutable page state (registry, debounce
//! slot, overlay, current field). It is driven entirely by its public
//! methods, each of which corresponds to one host event, and reaches the page
//! only through its [`ControllerHost`]. Timers are not owned here: methods
//! that need one return a ticket and the host hands it back when it fires.

use std::time::Duration;

use tonepro_common::{AnalysisResult, Settings};

use crate::debounce::{DebounceTicket, Debouncer};
use crate::overlay::{OverlayState, OverlayView, PlacementConfig, place_overlay};
use crate::platform::{ControllerHost, Notice};
use crate::registry::{self, FieldRegistry, FieldTree, MutationBatch};
use crate::text::{meets_word_gate, word_count};
use crate::types::{FieldId, RequestId, Size};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Quiet period after the last input before analysis runs.
    pub debounce: Duration,
    /// Delay between a blur and the overlay being dismissed.
    pub blur_dismiss_delay: Duration,
    /// Lifetime of failure notices.
    pub notice_ttl: Duration,
    pub placement: PlacementConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            blur_dismiss_delay: Duration::from_millis(150),
            notice_ttl: Duration::from_secs(3),
            placement: PlacementConfig::default(),
        }
    }
}

/// Text submitted to the gateway for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub id: RequestId,
    pub field: FieldId,
    pub text: String,
}

/// What [`Controller::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Suggestion is on screen.
    Shown,
    /// Text was clean; overlay hidden.
    Cleared,
    /// Analysis or rendering failed; overlay hidden and a notice raised.
    Failed,
    /// The overlay had moved on; result dropped.
    Discarded,
}

/// Pending blur dismissal, handed back through [`Controller::on_blur_elapsed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurTicket {
    pub field: FieldId,
    generation: u64,
    pub delay: Duration,
}

/// Where a pointer-down landed, as far as the controller cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerTarget {
    pub in_overlay: bool,
    /// Registered field containing the target, if any.
    pub field: Option<FieldId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckMode {
    /// Debounce expiry: honours duplicate suppression.
    Auto,
    /// Keyboard shortcut: re-analyzes identical text.
    Manual,
}

pub struct Controller<H> {
    host: H,
    config: ControllerConfig,
    settings: Settings,
    registry: FieldRegistry,
    debouncer: Debouncer,
    overlay: OverlayState,
    current: Option<FieldId>,
    pending_blur: Option<BlurTicket>,
    blur_generation: u64,
    next_request: u64,
}

impl<H: ControllerHost> Controller<H> {
    pub fn new(host: H, settings: Settings, config: ControllerConfig) -> Self {
        Self {
            host,
            debouncer: Debouncer::new(config.debounce),
            config,
            settings: settings.sanitized(),
            registry: FieldRegistry::new(),
            overlay: OverlayState::Hidden,
            current: None,
            pending_blur: None,
            blur_generation: 0,
            next_request: 0,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn current_field(&self) -> Option<FieldId> {
        self.current
    }

    pub fn pending_debounce(&self) -> Option<DebounceTicket> {
        self.debouncer.pending()
    }

    // --- structure -------------------------------------------------------

    /// Register the editable nodes under `root`.
    pub fn scan<T: FieldTree>(&mut self, tree: &T, root: &T::Node) -> Vec<FieldId> {
        registry::scan(tree, &mut self.registry, root)
    }

    /// Apply one mutation batch: evict removed subtrees, then scan added ones.
    pub fn apply_mutations<T: FieldTree>(
        &mut self,
        tree: &T,
        batch: &MutationBatch<T::Node>,
    ) -> Vec<FieldId> {
        for root in &batch.removed {
            for id in registry::evict(tree, &mut self.registry, root) {
                self.release(id);
            }
        }
        let mut added = Vec::new();
        for root in &batch.added {
            added.extend(registry::scan(tree, &mut self.registry, root));
        }
        added
    }

    /// Drop everything held for a field that left the page.
    fn release(&mut self, field: FieldId) {
        if self.current == Some(field) {
            self.current = None;
        }
        if self.pending_blur.is_some_and(|t| t.field == field) {
            self.pending_blur = None;
        }
        self.debouncer.cancel_field(field);
        self.hide_for(field);
    }

    // --- focus and input -------------------------------------------------

    pub fn on_focus(&mut self, field: FieldId) {
        if !self.registry.contains(field) {
            return;
        }
        self.current = Some(field);
        if self.pending_blur.is_some_and(|t| t.field == field) {
            self.pending_blur = None;
        }
    }

    /// Start the delayed blur dismissal. The host calls
    /// [`on_blur_elapsed`](Self::on_blur_elapsed) after `ticket.delay`.
    pub fn on_blur(&mut self, field: FieldId) -> Option<BlurTicket> {
        if !self.registry.contains(field) {
            return None;
        }
        self.blur_generation += 1;
        let ticket = BlurTicket {
            field,
            generation: self.blur_generation,
            delay: self.config.blur_dismiss_delay,
        };
        self.pending_blur = Some(ticket);
        Some(ticket)
    }

    pub fn on_blur_elapsed(&mut self, ticket: BlurTicket) {
        if self.pending_blur != Some(ticket) {
            return;
        }
        self.pending_blur = None;
        if self.host.is_hovered() {
            tracing::trace!(target: "tonepro::controller", field = %ticket.field, "blur ignored, overlay hovered");
            return;
        }
        self.hide_for(ticket.field);
    }

    /// Record an edit. Returns the debounce ticket the host should schedule.
    pub fn on_input(&mut self, field: FieldId) -> Option<DebounceTicket> {
        if !self.registry.contains(field) {
            return None;
        }
        self.current = Some(field);
        if !self.settings.auto_check {
            return None;
        }
        Some(self.debouncer.arm(field))
    }

    /// The debounce timer fired.
    pub fn on_debounce_elapsed(&mut self, ticket: DebounceTicket) -> Option<AnalysisRequest> {
        if !self.debouncer.take_if_current(ticket) {
            return None;
        }
        self.check(ticket.field, CheckMode::Auto)
    }

    /// Analyze the current field now.
    pub fn manual_check(&mut self) -> Option<AnalysisRequest> {
        let field = self.current?;
        self.debouncer.cancel();
        self.check(field, CheckMode::Manual)
    }

    fn check(&mut self, field: FieldId, mode: CheckMode) -> Option<AnalysisRequest> {
        let handle = self.registry.get(field)?;
        if let Some(request) = handle.in_flight {
            tracing::debug!(target: "tonepro::controller", %field, %request, "request already in flight");
            return None;
        }
        let text = self.host.read_text(field)?;

        if !meets_word_gate(&text, self.settings.min_word_count) {
            tracing::trace!(target: "tonepro::controller", %field, words = word_count(&text), "below word gate");
            self.hide_for(field);
            return None;
        }
        if mode == CheckMode::Auto && handle.last_checked_text.as_deref() == Some(text.as_str()) {
            self.hide_for(field);
            return None;
        }

        self.next_request += 1;
        let id = RequestId::new(self.next_request);
        if let Some(handle) = self.registry.get_mut(field) {
            handle.last_checked_text = Some(text.clone());
            handle.in_flight = Some(id);
        }

        if self.overlay.target().is_some_and(|previous| previous != field) {
            self.host.teardown();
        }
        self.overlay = OverlayState::Loading { field, request: id };
        if let Err(e) = self.host.render(field, OverlayView::Loading) {
            tracing::warn!(target: "tonepro::controller", %field, error = %e, "failed to render loading overlay");
            if let Some(handle) = self.registry.get_mut(field) {
                handle.in_flight = None;
                handle.last_checked_text = None;
            }
            self.hide();
            self.raise_failure("Could not show the tone checker here");
            return None;
        }
        self.position(None);
        self.host.schedule_reposition();

        tracing::debug!(target: "tonepro::controller", %field, request = %id, words = word_count(&text), "analysis requested");
        Some(AnalysisRequest { id, field, text })
    }

    // --- results ---------------------------------------------------------

    /// Apply a gateway result. Each request must be completed exactly once.
    pub fn complete(&mut self, request: &AnalysisRequest, result: AnalysisResult) -> Resolution {
        if let Some(handle) = self.registry.get_mut(request.field) {
            if handle.in_flight == Some(request.id) {
                handle.in_flight = None;
                if result.is_failed() {
                    handle.last_checked_text = None;
                }
            }
        }

        let awaited = matches!(
            self.overlay,
            OverlayState::Loading { field, request: id } if field == request.field && id == request.id
        );
        if !awaited {
            tracing::debug!(target: "tonepro::controller", field = %request.field, request = %request.id, "discarding stale result");
            return Resolution::Discarded;
        }

        match result {
            AnalysisResult::Clean => {
                self.hide();
                Resolution::Cleared
            }
            AnalysisResult::Failed { reason } => {
                tracing::warn!(target: "tonepro::controller", field = %request.field, request = %request.id, %reason, "analysis failed");
                self.hide();
                self.raise_failure(format!("Tone analysis failed: {reason}"));
                Resolution::Failed
            }
            AnalysisResult::Issues(suggestion) => {
                self.overlay = OverlayState::Showing {
                    field: request.field,
                    suggestion,
                };
                let rendered = match &self.overlay {
                    OverlayState::Showing { field, suggestion } => self
                        .host
                        .render(*field, OverlayView::Suggestion(suggestion)),
                    _ => Ok(()),
                };
                if let Err(e) = rendered {
                    tracing::warn!(target: "tonepro::controller", field = %request.field, error = %e, "failed to render suggestion");
                    self.hide();
                    self.raise_failure("Could not show the suggestion");
                    return Resolution::Failed;
                }
                self.position(None);
                self.host.schedule_reposition();
                Resolution::Shown
            }
        }
    }

    // --- overlay actions -------------------------------------------------

    /// Replace the target field's text with the suggestion.
    ///
    /// Returns false if nothing was showing or the write failed.
    pub fn accept(&mut self) -> bool {
        let OverlayState::Showing { field, suggestion } = &self.overlay else {
            return false;
        };
        let field = *field;
        let text = suggestion.suggestion.clone();

        if let Err(e) = self.host.write_text(field, &text) {
            tracing::warn!(target: "tonepro::controller", %field, error = %e, "failed to write suggestion");
            self.hide();
            self.raise_failure("Could not update the field");
            return false;
        }
        if let Some(handle) = self.registry.get_mut(field) {
            handle.last_checked_text = Some(text);
        }
        self.current = Some(field);
        self.hide();

        // State is settled; the host may now deliver these to page scripts.
        self.host.notify_changed(field);
        self.host.focus(field);
        tracing::debug!(target: "tonepro::controller", %field, "suggestion accepted");
        true
    }

    pub fn dismiss(&mut self) {
        self.hide();
    }

    pub fn close(&mut self) {
        self.hide();
    }

    /// A pointer-down somewhere on the page.
    pub fn on_outside_pointer(&mut self, target: PointerTarget) {
        let OverlayState::Showing { field, .. } = &self.overlay else {
            return;
        };
        if target.in_overlay || target.field == Some(*field) {
            return;
        }
        self.hide();
    }

    /// Re-run placement, with the measured size when available.
    pub fn reposition(&mut self) {
        let measured = self.host.measure();
        self.position(measured);
    }

    fn position(&self, measured: Option<Size>) {
        let Some(field) = self.overlay.target() else {
            return;
        };
        let Some(anchor) = self.host.bounding_rect(field) else {
            return;
        };
        let size = measured.unwrap_or(self.config.placement.estimated);
        let placement = place_overlay(anchor, size, self.host.viewport(), &self.config.placement);
        self.host.place(placement);
    }

    fn hide(&mut self) {
        if self.overlay.is_visible() {
            self.host.teardown();
            self.overlay = OverlayState::Hidden;
        }
    }

    fn hide_for(&mut self, field: FieldId) {
        if self.overlay.target() == Some(field) {
            self.hide();
        }
    }

    fn raise_failure(&self, message: impl Into<String>) {
        self.host
            .notify(Notice::error(message, self.config.notice_ttl));
    }
}
