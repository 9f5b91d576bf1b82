use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub image_model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// e.g. `1024x1024`
    pub image_size: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AiUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw completion returned by an `AiProvider`.
#[derive(Debug, Clone, Default)]
pub struct AiProviderResponse {
    pub content: String,
    /// Model that actually served the request, if the provider reports it.
    pub model: Option<String>,
    pub usage: Option<AiUsage>,
}

/// Answer handed back to the chat layer.
#[derive(Debug, Clone)]
pub struct AiAnswer {
    pub question: String,
    pub answer: String,
    pub model: String,
    pub usage: Option<AiUsage>,
}
