use crate::core::ai::{AiConfig, AiError, AiMessage, AiProvider, AiProviderResponse, AiUsage};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// OpenAI-compatible chat completion and image generation client.
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, path: &str, payload: Value) -> Result<Value, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AiError::Provider(Box::new(e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AiError::Provider(Box::new(e)))?;

        if !status.is_success() {
            tracing::warn!("OpenAI request to {} failed: {} - {}", path, status, text);
            return Err(api_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| AiError::Provider(Box::new(e)))
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError> {
        let payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
        });

        let body = self.post("chat/completions", payload).await?;
        parse_chat_response(&body)
    }

    async fn generate_image(&self, prompt: &str, config: &AiConfig) -> Result<String, AiError> {
        let payload = json!({
            "model": config.image_model,
            "prompt": prompt,
            "n": 1,
            "size": config.image_size,
        });

        let body = self.post("images/generations", payload).await?;
        parse_image_response(&body)
    }
}

pub fn parse_chat_response(body: &Value) -> Result<AiProviderResponse, AiError> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| AiError::Provider("Failed to parse response content".into()))?
        .to_string();

    let usage = body
        .get("usage")
        .and_then(|usage| serde_json::from_value::<AiUsage>(usage.clone()).ok());

    Ok(AiProviderResponse {
        content,
        model: body["model"].as_str().map(str::to_string),
        usage,
    })
}

pub fn parse_image_response(body: &Value) -> Result<String, AiError> {
    body["data"][0]["url"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AiError::Provider("Failed to parse image URL".into()))
}

/// API errors that carry a message (bad request, content policy, quota) are
/// shown to the user; anything else is a provider failure.
fn api_error(status: StatusCode, body: &str) -> AiError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string));

    match message {
        Some(message) if status.is_client_error() => AiError::Rejected(message),
        Some(message) => AiError::Provider(format!("{}: {}", status, message).into()),
        None => AiError::Provider(format!("OpenAI API error: {} - {}", status, body).into()),
    }
}
