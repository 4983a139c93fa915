//! `chrome.*` extension API bindings.
//!
//! Only the handful of calls the extension uses: `runtime.sendMessage` and
//! `storage.sync`. The worker's listeners live in `background.js`, which
//! registers them before the module loads. Values cross the boundary through
//! `serde-wasm-bindgen` in JSON-compatible mode so maps arrive as plain
//! objects.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tonepro_common::settings::SETTINGS_KEYS;
use tonepro_common::{
    RuntimeRequest, RuntimeResponse, Settings, SettingsLoader, SettingsSaver, ToneError,
};
use tonepro_core::{AnalysisGateway, AnalysisResult};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = sendMessage, catch)]
    fn runtime_send_message(message: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = get, catch)]
    fn storage_sync_get(keys: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = set, catch)]
    fn storage_sync_set(items: &JsValue) -> Result<js_sys::Promise, JsValue>;
}

pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, ToneError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ToneError::GatewayBadResponse(e.to_string()))
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, ToneError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ToneError::GatewayBadResponse(e.to_string()))
}

fn describe_js(e: &JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{:?}", e))
}

/// Send a runtime message and wait for the reply.
pub async fn send_message<T, R>(message: &T) -> Result<R, ToneError>
where
    T: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let unreachable = |e: JsValue| ToneError::GatewayUnreachable(describe_js(&e));
    let promise = runtime_send_message(&to_js(message)?).map_err(unreachable)?;
    let reply = JsFuture::from(promise).await.map_err(unreachable)?;
    if reply.is_undefined() || reply.is_null() {
        return Err(ToneError::GatewayUnreachable("no response from background".into()));
    }
    from_js(reply)
}

/// `chrome.storage.sync` as a settings store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

impl ChromeStorage {
    pub async fn set_raw(&self, items: &JsValue) -> Result<(), ToneError> {
        let unavailable = |e: JsValue| ToneError::SettingsUnavailable(describe_js(&e));
        let promise = storage_sync_set(items).map_err(unavailable)?;
        JsFuture::from(promise).await.map_err(unavailable)?;
        Ok(())
    }

    /// Write the values a fresh install starts from.
    pub async fn install_defaults(&self) -> Result<(), ToneError> {
        self.set_raw(&to_js(&Settings::install_defaults())?).await
    }
}

impl SettingsLoader for ChromeStorage {
    async fn load(&self) -> Result<Settings, ToneError> {
        let unavailable = |e: JsValue| ToneError::SettingsUnavailable(describe_js(&e));
        let promise = storage_sync_get(&to_js(SETTINGS_KEYS)?).map_err(unavailable)?;
        let stored = JsFuture::from(promise).await.map_err(unavailable)?;
        from_js(stored).map_err(|e| ToneError::SettingsUnavailable(e.to_string()))
    }
}

impl SettingsSaver for ChromeStorage {
    async fn save(&self, settings: &Settings) -> Result<(), ToneError> {
        // Absent keys are written blank so a cleared key replaces the stored one.
        let mut items = serde_json::to_value(settings)?;
        if let Some(map) = items.as_object_mut() {
            for key in ["openaiKey", "deepseekKey"] {
                map.entry(key).or_insert_with(|| serde_json::Value::String(String::new()));
            }
        }
        self.set_raw(&to_js(&items)?).await
    }
}

/// Analysis through the background dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeGateway;

impl RuntimeGateway {
    pub async fn request(&self, text: &str) -> Result<RuntimeResponse, ToneError> {
        send_message(&RuntimeRequest::analyze(text)).await
    }
}

impl AnalysisGateway for RuntimeGateway {
    async fn analyze(&self, text: &str) -> AnalysisResult {
        match self.request(text).await {
            Ok(response) => response.into_result(),
            Err(e) => {
                tracing::warn!(target: "tonepro::gateway", error = %e, "runtime message failed");
                AnalysisResult::failed(e.user_message())
            }
        }
    }
}
