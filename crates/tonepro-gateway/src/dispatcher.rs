//! Background message dispatcher.

use serde_json::Value;
use tonepro_common::{
    ANALYZE_TONE, Provider, RuntimeRequest, RuntimeResponse, Settings, SettingsLoader,
    ToneAnalysis, ToneError,
};

use crate::mock::MockAnalyzer;
use crate::provider::{ChatCompletionProvider, default_url};

/// Provider endpoint URLs. Overridable for proxies and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub deepseek: String,
    pub openai: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            deepseek: default_url(Provider::DeepSeek).to_string(),
            openai: default_url(Provider::OpenAi).to_string(),
        }
    }
}

impl Endpoints {
    fn url_for(&self, provider: Provider) -> &str {
        match provider {
            Provider::DeepSeek => &self.deepseek,
            Provider::OpenAi => &self.openai,
        }
    }
}

/// Answers runtime messages from content scripts and the popup.
///
/// Settings are re-read on every request so the popup's changes apply
/// without restarting the background worker.
pub struct Dispatcher<L> {
    settings: L,
    mock: MockAnalyzer,
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl<L: SettingsLoader> Dispatcher<L> {
    pub fn new(settings: L) -> Self {
        Self {
            settings,
            mock: MockAnalyzer::default(),
            endpoints: Endpoints::default(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_mock(mut self, mock: MockAnalyzer) -> Self {
        self.mock = mock;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Whether `message` carries an action this dispatcher answers.
    pub fn accepts(message: &Value) -> bool {
        message.get("action").and_then(Value::as_str) == Some(ANALYZE_TONE)
    }

    /// Handle one raw runtime message.
    ///
    /// Returns None for actions this dispatcher does not own, so other
    /// listeners can answer them.
    pub async fn handle_message(&self, message: Value) -> Option<RuntimeResponse> {
        if !Self::accepts(&message) {
            let action = message.get("action").and_then(Value::as_str);
            tracing::trace!(target: "tonepro::dispatcher", ?action, "ignoring message");
            return None;
        }
        let request = match serde_json::from_value::<RuntimeRequest>(message) {
            Ok(request) => request,
            Err(e) => return Some(RuntimeResponse::err(ToneError::from(e).to_string())),
        };
        Some(self.handle(request).await)
    }

    pub async fn handle(&self, request: RuntimeRequest) -> RuntimeResponse {
        match request {
            RuntimeRequest::AnalyzeTone { text } => match self.analyze_tone(&text).await {
                Ok(analysis) => RuntimeResponse::ok(analysis),
                Err(e) => {
                    tracing::error!(target: "tonepro::dispatcher", error = %e, "tone analysis failed");
                    RuntimeResponse::err(e.to_string())
                }
            },
        }
    }

    pub async fn analyze_tone(&self, text: &str) -> Result<ToneAnalysis, ToneError> {
        let settings = Settings::load_or_default(&self.settings).await;

        if settings.use_mock_api {
            tracing::info!(target: "tonepro::dispatcher", "using canned responses");
            return Ok(self.mock.analyze(text).await);
        }

        match self.call_provider(&settings, text).await {
            Ok(analysis) => Ok(analysis),
            Err(e) if settings.fallback_to_mock => {
                tracing::warn!(target: "tonepro::dispatcher", error = %e, "provider failed, falling back to canned responses");
                Ok(self.mock.analyze(text).await)
            }
            Err(e) => Err(e),
        }
    }

    async fn call_provider(&self, settings: &Settings, text: &str) -> Result<ToneAnalysis, ToneError> {
        let provider = settings.api_provider;
        let key = settings.provider_key().ok_or_else(|| {
            ToneError::GatewayUnreachable(format!(
                "no {} API key configured",
                provider.display_name()
            ))
        })?;

        tracing::info!(target: "tonepro::dispatcher", provider = provider.display_name(), "analyzing tone");
        ChatCompletionProvider::with_client(
            provider,
            key.to_string(),
            self.endpoints.url_for(provider).to_string(),
            self.client.clone(),
        )
        .analyze(text)
        .await
    }
}
