//! WASM entry points for the Tone Professional extension.
//!
//! One module serves all three extension contexts. Each page's boot script
//! imports it and calls the matching entry point:
//! - `startContentScript()` in every page the content script is injected into
//! - `handleMessage()` and `installDefaults()` from the service worker's
//!   listeners
//! - `startPopup()` in the settings popup

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tonepro_browser::chrome::{self, ChromeStorage};
use tonepro_browser::{ContentScript, Popup};
use tonepro_common::{ANALYZE_TONE, GET_LOGS, LogsReply, RuntimeResponse, get_logs, telemetry};
use tonepro_gateway::Dispatcher;
use wasm_bindgen::prelude::*;

/// Actions the service worker answers.
pub const BACKGROUND_ACTIONS: [&str; 2] = [ANALYZE_TONE, GET_LOGS];

thread_local! {
    static CONTENT: RefCell<Option<Rc<ContentScript>>> = const { RefCell::new(None) };
    static POPUP: RefCell<Option<Rc<Popup>>> = const { RefCell::new(None) };
    static DISPATCHER: Rc<Dispatcher<ChromeStorage>> = Rc::new(Dispatcher::new(ChromeStorage));
}

/// Install the panic hook and the tracing subscriber.
#[wasm_bindgen(start)]
pub fn init() {
    telemetry::init("tonepro");
}

/// Start watching the page's editable fields.
#[wasm_bindgen(js_name = startContentScript)]
pub async fn start_content_script() -> Result<(), JsError> {
    if CONTENT.with(|slot| slot.borrow().is_some()) {
        return Ok(());
    }
    let script = ContentScript::start()
        .await
        .map_err(|e| JsError::new(&e.to_string()))?;
    tracing::info!(target: "tonepro::content", "content script initialized");
    CONTENT.with(|slot| *slot.borrow_mut() = Some(script));
    Ok(())
}

/// Answer one runtime message in the service worker.
///
/// `background.js` registers the listener synchronously and forwards only
/// [`BACKGROUND_ACTIONS`] here once the module has loaded.
#[wasm_bindgen(js_name = handleMessage)]
pub async fn handle_message(message: JsValue) -> Result<JsValue, JsError> {
    let message: Value = chrome::from_js(message).map_err(|e| JsError::new(&e.to_string()))?;
    if message.get("action").and_then(Value::as_str) == Some(GET_LOGS) {
        let reply = LogsReply { logs: get_logs() };
        return chrome::to_js(&reply).map_err(|e| JsError::new(&e.to_string()));
    }
    let dispatcher = DISPATCHER.with(Rc::clone);
    let reply = dispatcher
        .handle_message(message)
        .await
        .unwrap_or_else(|| RuntimeResponse::err("unsupported action"));
    chrome::to_js(&reply).map_err(|e| JsError::new(&e.to_string()))
}

/// Write the default settings after a fresh install.
#[wasm_bindgen(js_name = installDefaults)]
pub async fn install_defaults() -> Result<(), JsError> {
    match ChromeStorage.install_defaults().await {
        Ok(()) => {
            tracing::info!(target: "tonepro::dispatcher", "Tone Professional installed, defaults written");
            Ok(())
        }
        Err(e) => {
            tracing::error!(target: "tonepro::dispatcher", error = %e, "failed to write default settings");
            Err(JsError::new(&e.to_string()))
        }
    }
}

/// Bind the settings form in the popup page.
#[wasm_bindgen(js_name = startPopup)]
pub async fn start_popup() -> Result<(), JsError> {
    let popup = Popup::start()
        .await
        .map_err(|e| JsError::new(&e.to_string()))?;
    POPUP.with(|slot| *slot.borrow_mut() = Some(popup));
    Ok(())
}
