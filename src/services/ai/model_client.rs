use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::errors::ApiError;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Per-endpoint model invocation settings.
#[derive(Debug, Clone)]
pub struct ModelParams {
    pub model: &'static str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Seam between the pipeline and the model provider. Tests substitute a stub
/// implementation; production uses `OpenRouterClient`.
pub trait ChatModel {
    async fn invoke(
        &self,
        messages: &[ChatMessage],
        params: &ModelParams,
    ) -> Result<String, ApiError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new() -> Result<Self, ApiError> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .map_err(|_| ApiError::Validation("OPENROUTER_API_KEY not set".to_string()))?;
        let base_url =
            env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::Upstream { status: 0, body: e.to_string() })?;

        Ok(Self { client, api_key, base_url })
    }
}

impl ChatModel for OpenRouterClient {
    /// Single synchronous call, no retries: one upstream failure surfaces
    /// immediately to the caller.
    async fn invoke(
        &self,
        messages: &[ChatMessage],
        params: &ModelParams,
    ) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatCompletionRequest {
            model: params.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Upstream {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                body: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Upstream { status: status.as_u16(), body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::MalformedOutput(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ApiError::EmptyCompletion)
    }
}
