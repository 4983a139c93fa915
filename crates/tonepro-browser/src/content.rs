//! Content script driver.
//!
//! Owns the controller and everything the page hands it: field listeners,
//! the mutation observer, document listeners and the two timers. Every DOM
//! callback borrows the controller once, collects what it needs to schedule
//! and then runs the host's deferred effects with the borrow released.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use tonepro_common::{Settings, ToneError};
use tonepro_core::{
    AnalysisRequest, BlurTicket, Controller, ControllerConfig, DebounceTicket, MutationBatch,
    Notice, Notifier, PlatformError, PointerTarget, run_analysis,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::chrome::{ChromeStorage, RuntimeGateway};
use crate::dom;
use crate::host::{DomHost, Effect};
use crate::overlay::{OverlayAction, OverlayElement};
use crate::tree::{DomFieldTree, FieldElements, FieldEvent};

/// Ctrl/Cmd+Shift+T.
pub fn is_manual_check_shortcut(event: &web_sys::KeyboardEvent) -> bool {
    (event.ctrl_key() || event.meta_key()) && event.shift_key() && event.key().eq_ignore_ascii_case("t")
}

pub struct ContentScript {
    controller: RefCell<Controller<DomHost>>,
    tree: DomFieldTree,
    gateway: RuntimeGateway,
    debounce_timer: RefCell<Option<Timeout>>,
    blur_timer: RefCell<Option<Timeout>>,
    listeners: RefCell<Vec<EventListener>>,
    observer: RefCell<Option<(web_sys::MutationObserver, Closure<dyn FnMut(js_sys::Array)>)>>,
}

impl ContentScript {
    /// Load settings and start watching the page.
    pub async fn start() -> Result<Rc<Self>, PlatformError> {
        let loaded = Settings::load(&ChromeStorage).await;
        let script = Self::with_loaded(loaded, ControllerConfig::default())?;
        script.attach()?;
        Ok(script)
    }

    /// Build the driver from a settings load, falling back to defaults with a
    /// notice when the store could not be read.
    pub fn with_loaded(
        loaded: Result<Settings, ToneError>,
        config: ControllerConfig,
    ) -> Result<Rc<Self>, PlatformError> {
        match loaded {
            Ok(settings) => Self::with_settings(settings, config),
            Err(e) => {
                tracing::warn!(target: "tonepro::content", error = %e, "failed to load settings, using defaults");
                let script = Self::with_settings(Settings::default(), config)?;
                script.controller.borrow().host().notify(Notice::error(e.user_message(), config.notice_ttl));
                Ok(script)
            }
        }
    }

    /// Build the driver without touching the document beyond the overlay.
    pub fn with_settings(settings: Settings, config: ControllerConfig) -> Result<Rc<Self>, PlatformError> {
        let overlay = OverlayElement::install()?;
        let fields = Rc::new(FieldElements::new());
        let host = DomHost::new(fields.clone(), overlay);

        Ok(Rc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let sink = Rc::new(move |event: FieldEvent| {
                if let Some(script) = weak.upgrade() {
                    script.on_field_event(event);
                }
            });
            Self {
                controller: RefCell::new(Controller::new(host, settings, config)),
                tree: DomFieldTree::new(fields, sink),
                gateway: RuntimeGateway,
                debounce_timer: RefCell::new(None),
                blur_timer: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                observer: RefCell::new(None),
            }
        }))
    }

    pub fn controller(&self) -> &RefCell<Controller<DomHost>> {
        &self.controller
    }

    pub fn fields(&self) -> &Rc<FieldElements> {
        self.tree.fields()
    }

    /// Scan the document, observe it for changes and install document
    /// listeners.
    pub fn attach(self: &Rc<Self>) -> Result<(), PlatformError> {
        let root = dom::root()?;
        let registered = self.controller.borrow_mut().scan(&self.tree, &root);
        tracing::info!(target: "tonepro::content", fields = registered.len(), "initial scan");

        self.observe(&root)?;
        self.listen_document()?;
        Ok(())
    }

    /// Stop observing and drop every listener, field listeners and markers
    /// included. The overlay element stays in the page.
    pub fn detach(&self) {
        if let Some((observer, _closure)) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
        self.listeners.borrow_mut().clear();
        self.fields().clear();
        self.debounce_timer.borrow_mut().take();
        self.blur_timer.borrow_mut().take();
    }

    fn observe(self: &Rc<Self>, root: &web_sys::Element) -> Result<(), PlatformError> {
        let weak = Rc::downgrade(self);
        let closure = Closure::wrap(Box::new(move |records: js_sys::Array| {
            if let Some(script) = weak.upgrade() {
                script.on_mutations(&records);
            }
        }) as Box<dyn FnMut(js_sys::Array)>);

        let observer = web_sys::MutationObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|e| format!("MutationObserver::new failed: {:?}", e))?;
        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(root, &init)
            .map_err(|e| format!("observe failed: {:?}", e))?;

        *self.observer.borrow_mut() = Some((observer, closure));
        Ok(())
    }

    fn listen_document(self: &Rc<Self>) -> Result<(), PlatformError> {
        let document = dom::document()?;
        let window = dom::window()?;
        let mut listeners = Vec::new();

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &document,
            "keydown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(key) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                if !is_manual_check_shortcut(key) {
                    return;
                }
                event.prevent_default();
                if let Some(script) = weak.upgrade() {
                    script.manual_check();
                }
            },
        ));

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new(&document, "mousedown", move |event| {
            if let Some(script) = weak.upgrade() {
                script.on_pointer_down(event);
            }
        }));

        let weak = Rc::downgrade(self);
        let overlay_root = self.controller.borrow().host().overlay().root().clone();
        listeners.push(EventListener::new(&overlay_root, "click", move |event| {
            let Some(action) = event.target().and_then(|t| OverlayAction::from_event_target(&t)) else {
                return;
            };
            if let Some(script) = weak.upgrade() {
                script.on_overlay_action(action);
            }
        }));

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &document,
            "scroll",
            EventListenerOptions {
                phase: gloo_events::EventListenerPhase::Capture,
                passive: true,
            },
            move |_| {
                if let Some(script) = weak.upgrade() {
                    script.on_layout_change();
                }
            },
        ));

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "resize", move |_| {
            if let Some(script) = weak.upgrade() {
                script.on_layout_change();
            }
        }));

        self.listeners.borrow_mut().extend(listeners);
        Ok(())
    }

    fn on_field_event(self: &Rc<Self>, event: FieldEvent) {
        match event {
            FieldEvent::Input(field) => {
                let ticket = self.controller.borrow_mut().on_input(field);
                if let Some(ticket) = ticket {
                    self.schedule_debounce(ticket);
                }
            }
            FieldEvent::Focus(field) => self.controller.borrow_mut().on_focus(field),
            FieldEvent::Blur(field) => {
                let ticket = self.controller.borrow_mut().on_blur(field);
                if let Some(ticket) = ticket {
                    self.schedule_blur(ticket);
                }
            }
        }
        self.flush();
    }

    fn schedule_debounce(self: &Rc<Self>, ticket: DebounceTicket) {
        let weak = Rc::downgrade(self);
        let timer = Timeout::new(millis(ticket.delay), move || {
            if let Some(script) = weak.upgrade() {
                let request = script.controller.borrow_mut().on_debounce_elapsed(ticket);
                script.flush();
                if let Some(request) = request {
                    script.spawn_analysis(request);
                }
            }
        });
        // Replacing the slot cancels the previous timer.
        *self.debounce_timer.borrow_mut() = Some(timer);
    }

    fn schedule_blur(self: &Rc<Self>, ticket: BlurTicket) {
        let weak = Rc::downgrade(self);
        let timer = Timeout::new(millis(ticket.delay), move || {
            if let Some(script) = weak.upgrade() {
                script.controller.borrow_mut().on_blur_elapsed(ticket);
                script.flush();
            }
        });
        *self.blur_timer.borrow_mut() = Some(timer);
    }

    pub fn manual_check(self: &Rc<Self>) {
        let request = self.controller.borrow_mut().manual_check();
        self.flush();
        if let Some(request) = request {
            self.spawn_analysis(request);
        }
    }

    fn spawn_analysis(self: &Rc<Self>, request: AnalysisRequest) {
        let script = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let id = request.id;
            let resolution = run_analysis(&script.controller, &script.gateway, request).await;
            tracing::debug!(target: "tonepro::content", request = %id, ?resolution, "analysis resolved");
            script.flush();
        });
    }

    fn on_pointer_down(self: &Rc<Self>, event: &web_sys::Event) {
        let Some(node) = event.target().and_then(|t| t.dyn_into::<web_sys::Node>().ok()) else {
            return;
        };
        let target = {
            let controller = self.controller.borrow();
            PointerTarget {
                in_overlay: controller.host().overlay().contains(&node),
                field: self.fields().field_containing(&node),
            }
        };
        self.controller.borrow_mut().on_outside_pointer(target);
        self.flush();
    }

    fn on_overlay_action(self: &Rc<Self>, action: OverlayAction) {
        {
            let mut controller = self.controller.borrow_mut();
            match action {
                OverlayAction::Accept => {
                    controller.accept();
                }
                OverlayAction::Dismiss => controller.dismiss(),
                OverlayAction::Close => controller.close(),
            }
        }
        self.flush();
    }

    fn on_layout_change(self: &Rc<Self>) {
        self.fields().reposition_markers();
        self.controller.borrow_mut().reposition();
        self.flush();
    }

    fn on_mutations(self: &Rc<Self>, records: &js_sys::Array) {
        let mut batch = MutationBatch::default();
        for record in records.iter() {
            let Ok(record) = record.dyn_into::<web_sys::MutationRecord>() else {
                continue;
            };
            batch.added.extend(elements(&record.added_nodes()));
            batch.removed.extend(elements(&record.removed_nodes()));
        }
        if batch.added.is_empty() && batch.removed.is_empty() {
            return;
        }
        let added = self.controller.borrow_mut().apply_mutations(&self.tree, &batch);
        if !added.is_empty() {
            tracing::debug!(target: "tonepro::content", added = added.len(), "fields registered from mutations");
        }
        self.flush();
    }

    /// Run the host work queued while the controller was borrowed.
    fn flush(self: &Rc<Self>) {
        let effects = self.controller.borrow().host().take_effects();
        for effect in effects {
            match effect {
                Effect::NotifyChanged(field) => {
                    if let Some((element, _)) = self.fields().element(field) {
                        if let Err(e) = dom::dispatch_input(&element) {
                            tracing::warn!(target: "tonepro::content", %field, error = %e, "input event not dispatched");
                        }
                    }
                }
                Effect::Focus(field) => {
                    if let Some((element, _)) = self.fields().element(field) {
                        if let Err(e) = dom::focus(&element) {
                            tracing::debug!(target: "tonepro::content", %field, error = %e, "focus failed");
                        }
                    }
                }
                Effect::Reposition => self.request_reposition(),
            }
        }
    }

    /// Measure and place the overlay once the new contents are laid out.
    fn request_reposition(self: &Rc<Self>) {
        let Ok(window) = dom::window() else {
            return;
        };
        let weak = Rc::downgrade(self);
        let callback = Closure::once_into_js(move || {
            if let Some(script) = weak.upgrade() {
                script.controller.borrow_mut().reposition();
                script.flush();
            }
        });
        if let Err(e) = window.request_animation_frame(callback.unchecked_ref()) {
            tracing::debug!(target: "tonepro::content", error = ?e, "requestAnimationFrame failed");
        }
    }
}

fn millis(duration: std::time::Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

fn elements(nodes: &web_sys::NodeList) -> Vec<web_sys::Element> {
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .collect()
}
