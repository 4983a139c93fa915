//! Persisted extension settings.
//!
//! Settings live in an external key-value store (`chrome.storage.sync` in the
//! extension). They are read once at startup and cached; nothing here reacts
//! to changes made behind our back.

use std::future::Future;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::ToneError;

/// Upper bound accepted for `minWordCount`.
pub const MAX_MIN_WORD_COUNT: u32 = 1000;

/// Keys read from the store. Anything missing falls back to [`Settings::default`].
pub const SETTINGS_KEYS: &[&str] = &[
    "autoCheck",
    "minWordCount",
    "useMockApi",
    "apiProvider",
    "openaiKey",
    "deepseekKey",
    "fallbackToMock",
];

/// Language-model provider used by the background dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    DeepSeek,
    OpenAi,
}

impl Provider {
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "DeepSeek",
            Provider::OpenAi => "OpenAI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Analyze automatically after typing pauses.
    pub auto_check: bool,
    /// Texts with fewer words than this are never sent.
    pub min_word_count: u32,
    /// Answer from the canned table instead of a provider.
    pub use_mock_api: bool,
    pub api_provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepseek_key: Option<String>,
    /// Answer from the canned table when the provider call fails.
    pub fallback_to_mock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_check: true,
            min_word_count: 5,
            use_mock_api: false,
            api_provider: Provider::DeepSeek,
            openai_key: None,
            deepseek_key: None,
            fallback_to_mock: false,
        }
    }
}

impl Settings {
    /// Loads settings from the provided loader.
    pub async fn load(loader: &impl SettingsLoader) -> Result<Self, ToneError> {
        let settings = loader.load().await?;
        Ok(settings.sanitized())
    }

    /// Loads settings, falling back to defaults when the store is unavailable.
    pub async fn load_or_default(loader: &impl SettingsLoader) -> Self {
        match Self::load(loader).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    /// Saves the settings using the provided saver.
    pub async fn save(&self, saver: &impl SettingsSaver) -> Result<(), ToneError> {
        saver.save(&self.clone().sanitized()).await
    }

    /// Clamp values into their accepted ranges and drop blank keys.
    pub fn sanitized(mut self) -> Self {
        self.min_word_count = self.min_word_count.min(MAX_MIN_WORD_COUNT);
        self.openai_key = self.openai_key.filter(|k| !k.trim().is_empty());
        self.deepseek_key = self.deepseek_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// API key for the selected provider, if one is stored.
    pub fn provider_key(&self) -> Option<&str> {
        match self.api_provider {
            Provider::DeepSeek => self.deepseek_key.as_deref(),
            Provider::OpenAi => self.openai_key.as_deref(),
        }
    }

    /// Values written when the extension is installed.
    pub fn install_defaults() -> serde_json::Value {
        serde_json::json!({
            "useMockApi": false,
            "autoCheck": true,
            "minWordCount": 5,
        })
    }
}

/// The trait for loading settings.
pub trait SettingsLoader {
    fn load(&self) -> impl Future<Output = Result<Settings, ToneError>>;
}

/// The trait for saving settings.
pub trait SettingsSaver {
    fn save(&self, settings: &Settings) -> impl Future<Output = Result<(), ToneError>>;
}

/// In-memory store, used by tests and by hosts without persistent storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    stored: Mutex<Option<Settings>>,
    unavailable: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            stored: Mutex::new(Some(settings)),
            unavailable: Mutex::new(false),
        }
    }

    /// Make every subsequent read and write fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut flag) = self.unavailable.lock() {
            *flag = unavailable;
        }
    }

    pub fn stored(&self) -> Option<Settings> {
        self.stored.lock().ok().and_then(|s| s.clone())
    }

    fn check_available(&self) -> Result<(), ToneError> {
        let unavailable = self
            .unavailable
            .lock()
            .map_err(|_| ToneError::SettingsUnavailable("store lock poisoned".into()))?;
        if *unavailable {
            return Err(ToneError::SettingsUnavailable("store offline".into()));
        }
        Ok(())
    }
}

impl SettingsLoader for MemoryStore {
    async fn load(&self) -> Result<Settings, ToneError> {
        self.check_available()?;
        Ok(self.stored().unwrap_or_default())
    }
}

impl SettingsSaver for MemoryStore {
    async fn save(&self, settings: &Settings) -> Result<(), ToneError> {
        self.check_available()?;
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| ToneError::SettingsUnavailable("store lock poisoned".into()))?;
        *stored = Some(settings.clone());
        Ok(())
    }
}
