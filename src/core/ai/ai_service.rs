use super::models::{AiAnswer, AiConfig, AiMessage, AiProviderResponse};
use async_trait::async_trait;
use std::error::Error;

/// Longest question we forward to the provider.
pub const MAX_QUESTION_CHARS: usize = 4000;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Safe to show to the user verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error("OPENAI_API_KEY is not set; ask the bot owner to configure it.")]
    NotConfigured,
    #[error("AI provider error: {0}")]
    Provider(#[source] Box<dyn Error + Send + Sync>),
}

impl AiError {
    /// Errors that become a plain reply instead of an error report.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, AiError::Rejected(_) | AiError::NotConfigured)
    }
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError>;

    /// Generates one image and returns its URL.
    async fn generate_image(&self, prompt: &str, config: &AiConfig) -> Result<String, AiError>;
}

pub struct AiService<P: AiProvider> {
    provider: P,
    system_prompt: String,
    config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, system_prompt: String, config: AiConfig) -> Self {
        Self {
            provider,
            system_prompt,
            config,
        }
    }

    pub async fn ask(&self, question: &str) -> Result<AiAnswer, AiError> {
        let question = validate_input(question, "Please ask a question.")?;

        let messages = vec![
            AiMessage::system(self.system_prompt.clone()),
            AiMessage::user(question),
        ];
        let response = self.provider.chat_complete(&messages, &self.config).await?;

        let answer = response.content.trim().to_string();
        if answer.is_empty() {
            return Err(AiError::Rejected(
                "The model returned an empty answer, try rephrasing the question.".to_string(),
            ));
        }

        Ok(AiAnswer {
            question: question.to_string(),
            answer,
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
            usage: response.usage,
        })
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<String, AiError> {
        let prompt = validate_input(prompt, "Please describe the image you want.")?;
        self.provider.generate_image(prompt, &self.config).await
    }
}

fn validate_input<'a>(input: &'a str, empty_message: &str) -> Result<&'a str, AiError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AiError::Rejected(empty_message.to_string()));
    }
    if input.chars().count() > MAX_QUESTION_CHARS {
        return Err(AiError::Rejected(format!(
            "Input is too long ({} characters, max {}).",
            input.chars().count(),
            MAX_QUESTION_CHARS
        )));
    }
    Ok(input)
}
