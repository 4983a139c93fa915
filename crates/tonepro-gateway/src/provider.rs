//! OpenAI-compatible chat-completions provider.

use tonepro_common::{Provider, ToneAnalysis, ToneError};

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::parser::parse_ai_response;
use crate::prompt::SYSTEM_PROMPT;

pub const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.3;

pub fn default_url(provider: Provider) -> &'static str {
    match provider {
        Provider::DeepSeek => DEEPSEEK_API_URL,
        Provider::OpenAi => OPENAI_API_URL,
    }
}

pub fn model_for(provider: Provider) -> &'static str {
    match provider {
        Provider::DeepSeek => "deepseek-chat",
        Provider::OpenAi => "gpt-3.5-turbo",
    }
}

/// Tone analysis through one provider's chat-completions endpoint.
pub struct ChatCompletionProvider {
    provider: Provider,
    api_key: String,
    api_url: String,
    client: reqwest::Client,
}

impl ChatCompletionProvider {
    pub fn new(provider: Provider, api_key: String) -> Self {
        Self::with_url(provider, api_key, default_url(provider).to_string())
    }

    /// Create provider with custom API URL (for proxies and tests).
    pub fn with_url(provider: Provider, api_key: String, api_url: String) -> Self {
        Self::with_client(provider, api_key, api_url, reqwest::Client::new())
    }

    pub fn with_client(
        provider: Provider,
        api_key: String,
        api_url: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            provider,
            api_key,
            api_url,
            client,
        }
    }

    fn build_request(&self, text: &str) -> ChatRequest {
        ChatRequest {
            model: model_for(self.provider).to_string(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(text)],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<reqwest::Response, ToneError> {
        let name = self.provider.display_name();
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ToneError::GatewayUnreachable(format!("{name} request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(ToneError::GatewayUnreachable(format!(
                "{name} API error: {status}"
            )));
        }

        Ok(response)
    }

    pub async fn analyze(&self, text: &str) -> Result<ToneAnalysis, ToneError> {
        let request = self.build_request(text);
        let response = self.send_request(&request).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ToneError::GatewayBadResponse(e.to_string()))?;
        let content = body.first_content().ok_or_else(|| {
            ToneError::GatewayBadResponse(format!(
                "{} returned no choices",
                self.provider.display_name()
            ))
        })?;
        parse_ai_response(content)
    }
}
