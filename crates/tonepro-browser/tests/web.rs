//! WASM browser tests for tonepro-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gloo_events::EventListener;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use tonepro_browser::dom;
use tonepro_browser::host::{DomHost, Effect};
use tonepro_browser::{
    ContentScript, DomFieldTree, FieldElements, FieldEvent, OverlayAction, OverlayElement,
};
use tonepro_common::ToneError;
use tonepro_core::{
    AnalysisResult, ControllerConfig, FieldKind, FieldPlatform, FieldRegistry, FieldTree, Notice,
    NoticeLevel, OverlayPhase, OverlayView, Placement, Resolution, Settings, Suggestion, classify,
    evict, scan,
};

fn element(html: &str) -> web_sys::Element {
    let container = dom::create("div").unwrap();
    container.set_inner_html(html);
    dom::body().unwrap().append_child(&container).unwrap();
    container.first_element_child().unwrap()
}

fn recording_tree() -> (DomFieldTree, Rc<RefCell<Vec<FieldEvent>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink_seen = seen.clone();
    let tree = DomFieldTree::new(
        Rc::new(FieldElements::new()),
        Rc::new(move |event: FieldEvent| sink_seen.borrow_mut().push(event)),
    )
    .without_markers();
    (tree, seen)
}

// === Field classification ===

#[wasm_bindgen_test]
fn test_classify_real_elements() {
    let cases = [
        (r#"<textarea></textarea>"#, Some(FieldKind::TextArea)),
        (r#"<input type="text">"#, Some(FieldKind::PlainInput)),
        (r#"<input type="email">"#, Some(FieldKind::PlainInput)),
        (r#"<input>"#, Some(FieldKind::PlainInput)),
        (r#"<input type="checkbox">"#, None),
        (r#"<input type="text" disabled>"#, None),
        (r#"<textarea readonly></textarea>"#, None),
        (r#"<div contenteditable="true"></div>"#, Some(FieldKind::ContentEditable)),
        (r#"<div contenteditable="false"></div>"#, None),
        (r#"<div role="textbox"></div>"#, Some(FieldKind::ContentEditable)),
        (r#"<div class="ProseMirror"></div>"#, Some(FieldKind::ContentEditable)),
        (r#"<p>static</p>"#, None),
    ];
    for (html, expected) in cases {
        assert_eq!(classify(&dom::describe(&element(html))), expected, "{html}");
    }
}

#[wasm_bindgen_test]
fn test_nested_editable_is_not_a_field() {
    let host = element(r#"<div contenteditable="true"><p contenteditable="true">inner</p></div>"#);
    let inner = host.first_element_child().unwrap();
    assert!(dom::describe(&inner).inside_editable_host);
    assert_eq!(classify(&dom::describe(&inner)), None);
    assert_eq!(classify(&dom::describe(&host)), Some(FieldKind::ContentEditable));
}

// === Field tree ===

#[wasm_bindgen_test]
fn test_scan_registers_each_field_once() {
    let root = element(r#"<form><textarea></textarea><input type="text"><div contenteditable="true"></div><input type="radio"></form>"#);
    let (tree, _) = recording_tree();
    let mut registry = FieldRegistry::new();

    let first = scan(&tree, &mut registry, &root);
    assert_eq!(first.len(), 3);
    let again = scan(&tree, &mut registry, &root);
    assert!(again.is_empty());
    assert_eq!(registry.len(), 3);
    assert_eq!(tree.fields().len(), 3);
}

#[wasm_bindgen_test]
fn test_field_events_reach_sink() {
    let area = element("<textarea></textarea>");
    let (tree, seen) = recording_tree();
    let mut registry = FieldRegistry::new();
    let ids = scan(&tree, &mut registry, &area);
    let id = ids[0];

    dom::dispatch_input(&area).unwrap();
    area.dispatch_event(&web_sys::Event::new("focus").unwrap()).unwrap();
    area.dispatch_event(&web_sys::Event::new("blur").unwrap()).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![FieldEvent::Input(id), FieldEvent::Focus(id), FieldEvent::Blur(id)]
    );
}

#[wasm_bindgen_test]
fn test_evict_drops_removed_fields_and_listeners() {
    let area = element("<textarea></textarea>");
    let (tree, seen) = recording_tree();
    let mut registry = FieldRegistry::new();
    scan(&tree, &mut registry, &area);

    area.remove();
    let evicted = evict(&tree, &mut registry, &area);
    assert_eq!(evicted.len(), 1);
    assert!(registry.is_empty());
    assert!(tree.fields().is_empty());
    assert_eq!(tree.field_id(&area), None);

    dom::dispatch_input(&area).unwrap();
    assert!(seen.borrow().is_empty());
}

#[wasm_bindgen_test]
fn test_evict_keeps_moved_field() {
    let area = element("<textarea></textarea>");
    let (tree, _) = recording_tree();
    let mut registry = FieldRegistry::new();
    scan(&tree, &mut registry, &area);

    // Re-parented before the mutation batch is processed.
    let elsewhere = dom::create("section").unwrap();
    dom::body().unwrap().append_child(&elsewhere).unwrap();
    elsewhere.append_child(&area).unwrap();

    assert!(evict(&tree, &mut registry, &area).is_empty());
    assert_eq!(registry.len(), 1);
}

#[wasm_bindgen_test]
fn test_field_containing_target() {
    let host = element(r#"<div contenteditable="true"><span>hello</span></div>"#);
    let (tree, _) = recording_tree();
    let mut registry = FieldRegistry::new();
    let ids = scan(&tree, &mut registry, &host);
    let span = host.first_element_child().unwrap();
    assert_eq!(tree.fields().field_containing(&span), Some(ids[0]));
    assert_eq!(tree.fields().field_containing(&dom::body().unwrap()), None);
}

// === Text access ===

#[wasm_bindgen_test]
fn test_read_and_write_text() {
    let input = element(r#"<input type="text" value="hi there">"#);
    assert_eq!(dom::read_text(&input, FieldKind::PlainInput), "hi there");
    dom::write_text(&input, FieldKind::PlainInput, "good day").unwrap();
    assert_eq!(
        input.dyn_ref::<web_sys::HtmlInputElement>().unwrap().value(),
        "good day"
    );

    let editable = element(r#"<div contenteditable="true"><b>bold</b> words</div>"#);
    assert_eq!(dom::read_text(&editable, FieldKind::ContentEditable), "bold words");
    dom::write_text(&editable, FieldKind::ContentEditable, "<i>plain</i>").unwrap();
    assert_eq!(editable.text_content().unwrap(), "<i>plain</i>");
    assert!(editable.first_element_child().is_none());
}

#[wasm_bindgen_test]
fn test_write_text_rejects_wrong_element() {
    let div = element("<div></div>");
    assert!(dom::write_text(&div, FieldKind::TextArea, "x").is_err());
}

// === Host ===

#[wasm_bindgen_test]
fn test_host_defers_page_notifications() {
    let area = element("<textarea></textarea>");
    let (tree, seen) = recording_tree();
    let mut registry = FieldRegistry::new();
    let id = scan(&tree, &mut registry, &area)[0];

    let host = DomHost::new(tree.fields().clone(), OverlayElement::install().unwrap());
    host.write_text(id, "Thanks for the update").unwrap();
    host.notify_changed(id);
    host.notify_changed(id);
    host.focus(id);

    assert_eq!(host.read_text(id).as_deref(), Some("Thanks for the update"));
    // Nothing reaches the page until the queue is drained.
    assert!(seen.borrow().is_empty());
    assert_eq!(
        host.take_effects(),
        vec![Effect::NotifyChanged(id), Effect::Focus(id)]
    );
    assert!(host.take_effects().is_empty());
}

// === Overlay ===

fn suggestion(issue: &str) -> Suggestion {
    Suggestion {
        issues: vec![issue.to_string()],
        suggestion: "Could you take another look?".to_string(),
        explanation: "Softer phrasing".to_string(),
    }
}

#[wasm_bindgen_test]
fn test_overlay_renders_text_only() {
    let overlay = OverlayElement::install().unwrap();
    assert!(!overlay.is_visible());

    overlay
        .render(OverlayView::Suggestion(&suggestion(r#"<img src=x onerror="alert(1)">"#)))
        .unwrap();
    assert!(overlay.is_visible());
    let root = overlay.root();
    assert!(root.query_selector("img").unwrap().is_none());
    assert!(root.text_content().unwrap().contains("<img src=x"));
    assert!(root.text_content().unwrap().contains("Could you take another look?"));

    let buttons = root.query_selector_all("[data-action]").unwrap();
    assert_eq!(buttons.length(), 3);
}

#[wasm_bindgen_test]
fn test_overlay_loading_then_hide() {
    let overlay = OverlayElement::install().unwrap();
    overlay.render(OverlayView::Loading).unwrap();
    assert!(overlay.root().text_content().unwrap().contains("Analyzing tone..."));

    overlay.place(Placement {
        left: 40.0,
        top: 120.0,
        flipped: true,
    });
    let style = overlay.root().style();
    assert_eq!(style.get_property_value("left").unwrap(), "40px");
    assert_eq!(style.get_property_value("top").unwrap(), "120px");
    assert_eq!(overlay.root().get_attribute("data-flipped").as_deref(), Some("true"));

    overlay.hide();
    assert!(!overlay.is_visible());
    assert_eq!(overlay.root().child_element_count(), 0);
}

#[wasm_bindgen_test]
fn test_overlay_action_from_click_target() {
    let overlay = OverlayElement::install().unwrap();
    overlay
        .render(OverlayView::Suggestion(&suggestion("Too blunt")))
        .unwrap();

    let accept = overlay.root().query_selector(".tone-accept-btn").unwrap().unwrap();
    assert_eq!(OverlayAction::from_event_target(&accept), Some(OverlayAction::Accept));
    let close = overlay.root().query_selector(".tone-close").unwrap().unwrap();
    assert_eq!(OverlayAction::from_event_target(&close), Some(OverlayAction::Close));
    let text = overlay.root().query_selector(".suggestion-text").unwrap().unwrap();
    assert_eq!(OverlayAction::from_event_target(&text), None);
}

#[wasm_bindgen_test]
fn test_overlay_action_names() {
    for action in [OverlayAction::Accept, OverlayAction::Dismiss, OverlayAction::Close] {
        assert_eq!(OverlayAction::parse(action.as_str()), Some(action));
    }
    assert_eq!(OverlayAction::parse("submit"), None);
}

// === Notices ===

#[wasm_bindgen_test]
fn test_toast_is_added_to_page() {
    let notice = Notice {
        level: NoticeLevel::Error,
        message: "Tone analysis failed: timeout".to_string(),
        ttl: std::time::Duration::from_secs(3),
    };
    tonepro_browser::toast::show(&notice).unwrap();
    let toast = dom::document()
        .unwrap()
        .query_selector(".tone-toast.error")
        .unwrap()
        .unwrap();
    assert_eq!(toast.text_content().unwrap(), "Tone analysis failed: timeout");
}

// === Content script ===

const SEVEN: &str = "I need this report done right now";

fn quick_config() -> ControllerConfig {
    ControllerConfig {
        debounce: Duration::from_millis(20),
        blur_dismiss_delay: Duration::from_millis(10),
        ..ControllerConfig::default()
    }
}

fn attached_script() -> Rc<ContentScript> {
    let script = ContentScript::with_settings(Settings::default(), quick_config()).unwrap();
    script.attach().unwrap();
    script
}

fn set_area_value(area: &web_sys::Element, text: &str) {
    area.dyn_ref::<web_sys::HtmlTextAreaElement>().unwrap().set_value(text);
}

#[wasm_bindgen_test]
async fn test_content_script_tracks_inserted_and_removed_fields() {
    let script = attached_script();
    let before = script.controller().borrow().registry().len();

    let area = element("<textarea></textarea>");
    // Mutation records are delivered as a microtask.
    TimeoutFuture::new(0).await;
    let id = script.fields().field_containing(&area).expect("inserted field registered");
    assert_eq!(script.controller().borrow().registry().len(), before + 1);
    assert!(script.controller().borrow().registry().get(id).is_some());

    area.parent_element().unwrap().remove();
    TimeoutFuture::new(0).await;
    assert_eq!(script.fields().field_containing(&area), None);
    assert_eq!(script.controller().borrow().registry().len(), before);

    script.detach();
    assert!(script.fields().is_empty());
    // Detached: new fields are no longer picked up.
    let late = element("<textarea></textarea>");
    TimeoutFuture::new(0).await;
    assert_eq!(script.fields().field_containing(&late), None);
}

#[wasm_bindgen_test]
async fn test_content_script_watches_outside_body() {
    let script = attached_script();
    let stray = dom::create("textarea").unwrap();
    dom::root().unwrap().append_child(&stray).unwrap();
    TimeoutFuture::new(0).await;
    assert!(script.fields().field_containing(&stray).is_some());

    stray.remove();
    script.detach();
}

#[wasm_bindgen_test]
async fn test_accept_click_is_seen_by_page_listeners() {
    let script = attached_script();
    let area = element("<textarea></textarea>");
    TimeoutFuture::new(0).await;
    let id = script.fields().field_containing(&area).unwrap();

    let page_inputs = Rc::new(RefCell::new(Vec::new()));
    let seen = page_inputs.clone();
    let _page_listener = EventListener::new(&area, "input", move |event| {
        let value = event
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
            .map(|a| a.value())
            .unwrap_or_default();
        seen.borrow_mut().push(value);
    });

    set_area_value(&area, SEVEN);
    let rewrite = "Could you share the report when you have a moment?";
    {
        let mut controller = script.controller().borrow_mut();
        let ticket = controller.on_input(id).unwrap();
        let request = controller.on_debounce_elapsed(ticket).unwrap();
        let resolution = controller.complete(
            &request,
            AnalysisResult::Issues(Suggestion {
                issues: vec!["Demanding tone".to_string()],
                suggestion: rewrite.to_string(),
                explanation: "Softer phrasing".to_string(),
            }),
        );
        assert_eq!(resolution, Resolution::Shown);
    }

    let accept = script
        .controller()
        .borrow()
        .host()
        .overlay()
        .root()
        .query_selector("[data-action=accept]")
        .unwrap()
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap();
    accept.click();

    assert_eq!(*page_inputs.borrow(), vec![rewrite.to_string()]);
    assert_eq!(area.dyn_ref::<web_sys::HtmlTextAreaElement>().unwrap().value(), rewrite);
    assert_eq!(script.controller().borrow().overlay().phase(), OverlayPhase::Hidden);

    // The synthetic input arms a debounce that must not re-analyze the rewrite.
    TimeoutFuture::new(60).await;
    let controller = script.controller().borrow();
    assert_eq!(controller.overlay().phase(), OverlayPhase::Hidden);
    assert_eq!(controller.registry().get(id).unwrap().in_flight, None);
    drop(controller);

    script.detach();
}

#[wasm_bindgen_test]
async fn test_debounce_timer_sends_request_and_resolves() {
    let script = attached_script();
    let area = element("<textarea></textarea>");
    TimeoutFuture::new(0).await;
    let id = script.fields().field_containing(&area).unwrap();

    set_area_value(&area, SEVEN);
    dom::dispatch_input(&area).unwrap();
    assert!(script.controller().borrow().pending_debounce().is_some());

    // No extension runtime behind the test page, so the request fails.
    TimeoutFuture::new(150).await;
    let controller = script.controller().borrow();
    assert!(controller.pending_debounce().is_none());
    assert_eq!(controller.overlay().phase(), OverlayPhase::Hidden);
    let handle = controller.registry().get(id).unwrap();
    assert_eq!(handle.in_flight, None);
    assert_eq!(handle.last_checked_text, None);
    drop(controller);

    script.detach();
}

#[wasm_bindgen_test]
fn test_unreadable_settings_fall_back_with_notice() {
    let script = ContentScript::with_loaded(
        Err(ToneError::SettingsUnavailable("sync storage disabled".into())),
        quick_config(),
    )
    .unwrap();
    assert_eq!(*script.controller().borrow().settings(), Settings::default());

    let toasts = dom::document()
        .unwrap()
        .query_selector_all(".tone-toast.error")
        .unwrap();
    let texts: Vec<String> = (0..toasts.length())
        .filter_map(|i| toasts.item(i))
        .filter_map(|node| node.text_content())
        .collect();
    assert!(
        texts.iter().any(|t| t == "Could not access extension settings"),
        "{texts:?}"
    );
}
