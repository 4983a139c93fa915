//! Settings popup.
//!
//! Binds the form in the extension's popup page to [`Settings`]: loads it on
//! open, saves on the button, on Ctrl/Cmd+S and one second after the last
//! change, and runs a connectivity probe through the background dispatcher.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use tonepro_common::{
    DiagnosticsRequest, LogsReply, Provider, RuntimeResponse, Settings, ToneError, get_logs,
};
use tonepro_core::PlatformError;
use tonepro_gateway::PROBE_TEXT;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::chrome::{ChromeStorage, RuntimeGateway, send_message};
use crate::dom;

/// Quiet period before a changed form is saved.
pub const AUTOSAVE_DELAY_MS: u32 = 1000;
/// Lifetime of the temporary status message.
pub const MESSAGE_TTL_MS: u32 = 3000;

/// Form controls, by element id.
pub const AUTO_CHECK_ID: &str = "autoCheck";
pub const MIN_WORD_COUNT_ID: &str = "minWordCount";
pub const USE_MOCK_API_ID: &str = "useMockApi";
pub const API_PROVIDER_ID: &str = "apiProvider";
pub const OPENAI_KEY_ID: &str = "openaiKey";
pub const DEEPSEEK_KEY_ID: &str = "deepseekKey";
pub const FALLBACK_TO_MOCK_ID: &str = "fallbackToMock";
pub const SAVE_BUTTON_ID: &str = "saveSettings";
pub const TEST_BUTTON_ID: &str = "testApi";
pub const COPY_LOGS_BUTTON_ID: &str = "copyLogs";
pub const STATUS_ID: &str = "status-indicator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

impl MessageKind {
    pub fn class_name(self) -> &'static str {
        match self {
            MessageKind::Info => "temp-message info",
            MessageKind::Success => "temp-message success",
            MessageKind::Error => "temp-message error",
        }
    }
}

/// Contents of the mode indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub class_name: &'static str,
    pub label: &'static str,
    pub detail: String,
}

pub fn status_line(settings: &Settings) -> StatusLine {
    if settings.use_mock_api {
        StatusLine {
            class_name: "status development",
            label: "Development Mode:",
            detail: "Using mock API responses for testing".to_string(),
        }
    } else {
        StatusLine {
            class_name: "status production",
            label: "Production Mode:",
            detail: format!("Using real {} API", settings.api_provider.display_name()),
        }
    }
}

/// Parse the word threshold field. Blank or unparseable input keeps the default.
pub fn parse_min_word_count(raw: &str) -> u32 {
    raw.trim()
        .parse::<u32>()
        .unwrap_or_else(|_| Settings::default().min_word_count)
}

pub fn provider_value(provider: Provider) -> &'static str {
    match provider {
        Provider::DeepSeek => "deepseek",
        Provider::OpenAi => "openai",
    }
}

pub fn parse_provider(raw: &str) -> Provider {
    match raw {
        "openai" => Provider::OpenAi,
        _ => Provider::DeepSeek,
    }
}

/// Message for the outcome of the connectivity probe.
pub fn probe_message(outcome: &Result<RuntimeResponse, ToneError>) -> (String, MessageKind) {
    match outcome {
        Ok(response) if response.success => ("API connection successful!".to_string(), MessageKind::Success),
        Ok(response) => (
            format!(
                "API test failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            ),
            MessageKind::Error,
        ),
        Err(_) => ("API test failed: Could not connect".to_string(), MessageKind::Error),
    }
}

/// Diagnostics dump: popup log lines first, then the service worker's.
///
/// Content scripts keep their own buffers per tab and are not included.
pub fn diagnostics(popup_logs: &str, background: &Result<String, ToneError>) -> String {
    let background = match background {
        Ok(logs) => logs.clone(),
        Err(e) => format!("(unavailable: {e})"),
    };
    format!("== popup ==\n{popup_logs}\n\n== background ==\n{background}")
}

fn input(id: &str) -> Result<web_sys::HtmlInputElement, PlatformError> {
    by_id(id)
}

fn by_id<T: JsCast>(id: &str) -> Result<T, PlatformError> {
    dom::document()?
        .get_element_by_id(id)
        .ok_or_else(|| PlatformError(format!("missing #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| PlatformError(format!("#{id} has an unexpected element type")))
}

/// The popup's form elements.
pub struct SettingsForm {
    auto_check: web_sys::HtmlInputElement,
    min_word_count: web_sys::HtmlInputElement,
    use_mock_api: web_sys::HtmlInputElement,
    api_provider: web_sys::HtmlSelectElement,
    openai_key: web_sys::HtmlInputElement,
    deepseek_key: web_sys::HtmlInputElement,
    fallback_to_mock: web_sys::HtmlInputElement,
    save_button: web_sys::HtmlButtonElement,
    test_button: web_sys::HtmlButtonElement,
    status: web_sys::HtmlElement,
}

impl SettingsForm {
    /// Look up every control in the current document.
    pub fn find() -> Result<Self, PlatformError> {
        Ok(Self {
            auto_check: input(AUTO_CHECK_ID)?,
            min_word_count: input(MIN_WORD_COUNT_ID)?,
            use_mock_api: input(USE_MOCK_API_ID)?,
            api_provider: by_id(API_PROVIDER_ID)?,
            openai_key: input(OPENAI_KEY_ID)?,
            deepseek_key: input(DEEPSEEK_KEY_ID)?,
            fallback_to_mock: input(FALLBACK_TO_MOCK_ID)?,
            save_button: by_id(SAVE_BUTTON_ID)?,
            test_button: by_id(TEST_BUTTON_ID)?,
            status: by_id(STATUS_ID)?,
        })
    }

    pub fn fill(&self, settings: &Settings) {
        self.auto_check.set_checked(settings.auto_check);
        self.min_word_count
            .set_value(&settings.min_word_count.to_string());
        self.use_mock_api.set_checked(settings.use_mock_api);
        self.api_provider
            .set_value(provider_value(settings.api_provider));
        self.openai_key
            .set_value(settings.openai_key.as_deref().unwrap_or_default());
        self.deepseek_key
            .set_value(settings.deepseek_key.as_deref().unwrap_or_default());
        self.fallback_to_mock.set_checked(settings.fallback_to_mock);
    }

    pub fn read(&self) -> Settings {
        let key = |element: &web_sys::HtmlInputElement| {
            let value = element.value();
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        Settings {
            auto_check: self.auto_check.checked(),
            min_word_count: parse_min_word_count(&self.min_word_count.value()),
            use_mock_api: self.use_mock_api.checked(),
            api_provider: parse_provider(&self.api_provider.value()),
            openai_key: key(&self.openai_key),
            deepseek_key: key(&self.deepseek_key),
            fallback_to_mock: self.fallback_to_mock.checked(),
        }
        .sanitized()
    }

    /// Redraw the mode indicator from the form's current state.
    pub fn update_status(&self) -> Result<(), PlatformError> {
        let line = status_line(&self.read());
        self.status.set_class_name(line.class_name);
        self.status.set_text_content(None);
        let label = dom::create_text("strong", "", line.label)?;
        self.status
            .append_child(&label)
            .map_err(|e| format!("append_child failed: {:?}", e))?;
        let detail = dom::document()?.create_text_node(&format!(" {}", line.detail));
        self.status
            .append_child(&detail)
            .map_err(|e| format!("append_child failed: {:?}", e))?;
        Ok(())
    }

    fn controls(&self) -> Vec<web_sys::EventTarget> {
        vec![
            self.auto_check.clone().into(),
            self.min_word_count.clone().into(),
            self.use_mock_api.clone().into(),
            self.api_provider.clone().into(),
            self.openai_key.clone().into(),
            self.deepseek_key.clone().into(),
            self.fallback_to_mock.clone().into(),
        ]
    }
}

pub struct Popup {
    form: SettingsForm,
    store: ChromeStorage,
    autosave: RefCell<Option<Timeout>>,
    message: RefCell<Option<(web_sys::HtmlElement, Timeout)>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl Popup {
    /// Load the stored settings into the form and wire up its controls.
    pub async fn start() -> Result<Rc<Self>, PlatformError> {
        let form = SettingsForm::find()?;
        let store = ChromeStorage;
        let settings = Settings::load_or_default(&store).await;
        form.fill(&settings);
        form.update_status()?;

        let popup = Rc::new(Self {
            form,
            store,
            autosave: RefCell::new(None),
            message: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        });
        popup.listen()?;
        tracing::debug!(target: "tonepro::popup", "popup ready");
        Ok(popup)
    }

    pub fn form(&self) -> &SettingsForm {
        &self.form
    }

    fn listen(self: &Rc<Self>) -> Result<(), PlatformError> {
        let mut listeners = Vec::new();

        for control in self.form.controls() {
            let weak = Rc::downgrade(self);
            listeners.push(EventListener::new(&control, "change", move |_| {
                if let Some(popup) = weak.upgrade() {
                    popup.on_change();
                }
            }));
        }

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.form.save_button, "click", move |_| {
            if let Some(popup) = weak.upgrade() {
                popup.save_now();
            }
        }));

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.form.test_button, "click", move |_| {
            if let Some(popup) = weak.upgrade() {
                popup.test_api();
            }
        }));

        if let Ok(copy) = by_id::<web_sys::HtmlButtonElement>(COPY_LOGS_BUTTON_ID) {
            let weak = Rc::downgrade(self);
            listeners.push(EventListener::new(&copy, "click", move |_| {
                if let Some(popup) = weak.upgrade() {
                    popup.copy_logs();
                }
            }));
        }

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &dom::document()?.into(),
            "keydown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(key) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                if key.key() == "Escape" {
                    if let Ok(window) = dom::window() {
                        let _ = window.close();
                    }
                    return;
                }
                if (key.ctrl_key() || key.meta_key()) && key.key().eq_ignore_ascii_case("s") {
                    event.prevent_default();
                    if let Some(popup) = weak.upgrade() {
                        popup.save_now();
                    }
                }
            },
        ));

        self.listeners.borrow_mut().extend(listeners);
        Ok(())
    }

    fn on_change(self: &Rc<Self>) {
        if let Err(e) = self.form.update_status() {
            tracing::warn!(target: "tonepro::popup", error = %e, "status indicator not updated");
        }
        let weak = Rc::downgrade(self);
        let timer = Timeout::new(AUTOSAVE_DELAY_MS, move || {
            if let Some(popup) = weak.upgrade() {
                popup.save();
            }
        });
        *self.autosave.borrow_mut() = Some(timer);
    }

    /// Save the form immediately, cancelling any pending auto-save.
    pub fn save_now(self: &Rc<Self>) {
        self.autosave.borrow_mut().take();
        self.save();
    }

    fn save(self: &Rc<Self>) {
        let popup = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let settings = popup.form.read();
            match settings.save(&popup.store).await {
                Ok(()) => {
                    tracing::info!(target: "tonepro::popup", auto_check = settings.auto_check, min_word_count = settings.min_word_count, use_mock_api = settings.use_mock_api, "settings saved");
                    popup.show_message("Settings saved successfully!", MessageKind::Success);
                }
                Err(e) => {
                    tracing::error!(target: "tonepro::popup", error = %e, "failed to save settings");
                    popup.show_message("Failed to save settings", MessageKind::Error);
                }
            }
        });
    }

    /// Send the probe sentence through the dispatcher.
    pub fn test_api(self: &Rc<Self>) {
        let button = self.form.test_button.clone();
        let label = button.text_content().unwrap_or_default();
        button.set_text_content(Some("Testing..."));
        button.set_disabled(true);

        let popup = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = RuntimeGateway.request(PROBE_TEXT).await;
            if let Err(e) = &outcome {
                tracing::warn!(target: "tonepro::popup", error = %e, "API test failed");
            }
            let (message, kind) = probe_message(&outcome);
            popup.show_message(&message, kind);
            button.set_text_content(Some(&label));
            button.set_disabled(false);
        });
    }

    /// Copy this page's log lines and the service worker's to the clipboard.
    fn copy_logs(self: &Rc<Self>) {
        let popup = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let background = send_message::<_, LogsReply>(&DiagnosticsRequest::GetLogs)
                .await
                .map(|reply| reply.logs);
            let text = diagnostics(&get_logs(), &background);
            match write_clipboard(&text).await {
                Ok(()) => popup.show_message("Diagnostics copied", MessageKind::Info),
                Err(e) => {
                    tracing::warn!(target: "tonepro::popup", error = %e, "clipboard write failed");
                    popup.show_message("Could not copy diagnostics", MessageKind::Error);
                }
            }
        });
    }

    /// Show `text` under the save button for a few seconds, replacing any
    /// message already there.
    pub fn show_message(&self, text: &str, kind: MessageKind) {
        if let Some((previous, _timer)) = self.message.borrow_mut().take() {
            previous.remove();
        }
        let element = match dom::create_text("div", kind.class_name(), text) {
            Ok(element) => element,
            Err(e) => {
                tracing::warn!(target: "tonepro::popup", error = %e, "message not shown");
                return;
            }
        };
        let save = &self.form.save_button;
        if let Some(parent) = save.parent_node() {
            if let Err(e) = parent.insert_before(&element, save.next_sibling().as_ref()) {
                tracing::warn!(target: "tonepro::popup", error = ?e, "message not inserted");
                return;
            }
        }
        let expired = element.clone();
        let timer = Timeout::new(MESSAGE_TTL_MS, move || expired.remove());
        *self.message.borrow_mut() = Some((element, timer));
    }
}

async fn write_clipboard(text: &str) -> Result<(), PlatformError> {
    let navigator = dom::window()?.navigator();
    let clipboard = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))
        .map_err(|e| format!("navigator.clipboard failed: {:?}", e))?;
    let write = js_sys::Reflect::get(&clipboard, &JsValue::from_str("writeText"))
        .map_err(|e| format!("clipboard.writeText failed: {:?}", e))?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| PlatformError::from("clipboard.writeText is not a function"))?;
    let promise = write
        .call1(&clipboard, &JsValue::from_str(text))
        .map_err(|e| format!("clipboard.writeText failed: {:?}", e))?
        .dyn_into::<js_sys::Promise>()
        .map_err(|_| PlatformError::from("clipboard.writeText returned no promise"))?;
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| format!("clipboard.writeText rejected: {:?}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_development() {
        let settings = Settings {
            use_mock_api: true,
            ..Settings::default()
        };
        let line = status_line(&settings);
        assert_eq!(line.class_name, "status development");
        assert_eq!(line.label, "Development Mode:");
        assert_eq!(line.detail, "Using mock API responses for testing");
    }

    #[test]
    fn test_status_line_names_provider() {
        let settings = Settings {
            api_provider: Provider::OpenAi,
            ..Settings::default()
        };
        let line = status_line(&settings);
        assert_eq!(line.class_name, "status production");
        assert_eq!(line.detail, "Using real OpenAI API");
        assert_eq!(status_line(&Settings::default()).detail, "Using real DeepSeek API");
    }

    #[test]
    fn test_diagnostics_includes_background_logs() {
        let text = diagnostics(
            "[INFO] tonepro::popup: opened",
            &Ok("[DEBUG] tonepro::dispatcher: mock response".to_string()),
        );
        assert_eq!(
            text,
            "== popup ==\n[INFO] tonepro::popup: opened\n\n== background ==\n[DEBUG] tonepro::dispatcher: mock response"
        );

        let text = diagnostics("", &Err(ToneError::GatewayUnreachable("no worker".into())));
        assert!(text.ends_with("== background ==\n(unavailable: analysis gateway unreachable: no worker)"), "{text}");
    }

    #[test]
    fn test_parse_min_word_count() {
        assert_eq!(parse_min_word_count("12"), 12);
        assert_eq!(parse_min_word_count(" 0 "), 0);
        assert_eq!(parse_min_word_count(""), 5);
        assert_eq!(parse_min_word_count("-3"), 5);
        assert_eq!(parse_min_word_count("many"), 5);
    }

    #[test]
    fn test_provider_values() {
        for provider in [Provider::DeepSeek, Provider::OpenAi] {
            assert_eq!(parse_provider(provider_value(provider)), provider);
        }
        assert_eq!(parse_provider(""), Provider::DeepSeek);
    }

    #[test]
    fn test_connection_test_messages() {
        let ok = Ok(RuntimeResponse::ok(tonepro_common::ToneAnalysis::clean(PROBE_TEXT)));
        assert_eq!(probe_message(&ok), ("API connection successful!".to_string(), MessageKind::Success));

        let refused = Ok(RuntimeResponse::err("No API key configured for DeepSeek"));
        assert_eq!(
            probe_message(&refused).0,
            "API test failed: No API key configured for DeepSeek"
        );

        let down = Err(ToneError::GatewayUnreachable("no response from background".into()));
        assert_eq!(probe_message(&down), ("API test failed: Could not connect".to_string(), MessageKind::Error));
    }
}
