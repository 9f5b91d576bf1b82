// ChatGPT-style completions and image generation.

use crate::core::ai::AiAnswer;
use crate::core::extensions::{Extension, Router};
use crate::discord::embeds::{create_embed, split_message, truncate, Field, GREEN, MESSAGE_LIMIT};
use crate::discord::{Command, Context, Error};
use poise::serenity_prelude as serenity;

const LOG_TARGET: &str = "discord.cogs.gpt";

pub struct ChatGpt;

impl Extension<Command> for ChatGpt {
    fn name(&self) -> &'static str {
        "gpt"
    }

    fn register(&self, router: &mut Router<Command>) {
        router.command(chatgpt());
    }

    fn on_load(&self) {
        super::setup_cog_logger(LOG_TARGET);
        tracing::info!(target: LOG_TARGET, "ChatGpt is ready.");
    }
}

pub fn extension() -> Box<dyn Extension<Command>> {
    Box::new(ChatGpt)
}

/// Talk to the chat model.
#[poise::command(
    slash_command,
    prefix_command,
    subcommands("ask", "dalle"),
    subcommand_required,
    category = "gpt"
)]
pub async fn chatgpt(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Ask the chat model a question.
#[poise::command(slash_command, prefix_command, category = "gpt")]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Your question"]
    #[rest]
    question: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    let answer = match ctx.data().ai.ask(&question).await {
        Ok(answer) => answer,
        Err(err) if err.is_user_facing() => {
            tracing::info!(target: LOG_TARGET, "Question rejected: {}", err);
            ctx.say(err.to_string()).await?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let mut chunks = split_message(&answer.answer, MESSAGE_LIMIT).into_iter();
    let first = chunks.next().unwrap_or_default();
    ctx.send(
        poise::CreateReply::default()
            .content(first)
            .embed(answer_embed(&answer)),
    )
    .await?;

    for chunk in chunks {
        ctx.say(chunk).await?;
    }

    Ok(())
}

/// Generate an image from a prompt.
#[poise::command(slash_command, prefix_command, category = "gpt")]
pub async fn dalle(
    ctx: Context<'_>,
    #[description = "What should the image show?"]
    #[rest]
    prompt: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    match ctx.data().ai.generate_image(&prompt).await {
        Ok(url) => {
            ctx.say(url).await?;
        }
        Err(err) if err.is_user_facing() => {
            tracing::info!(target: LOG_TARGET, "Image prompt rejected: {}", err);
            ctx.say(err.to_string()).await?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

pub fn answer_embed(answer: &AiAnswer) -> serenity::CreateEmbed {
    let mut fields = vec![Field::new("Model", answer.model.clone()).inline()];
    if let Some(usage) = answer.usage {
        fields.push(
            Field::new(
                "Tokens",
                format!(
                    "{} prompt + {} completion = {}",
                    usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                ),
            )
            .inline(),
        );
    }

    create_embed(
        "ChatGPT",
        &truncate(&answer.question, 4096),
        Some(GREEN),
        None,
        None,
        &fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::AiUsage;

    #[test]
    fn test_answer_embed() {
        let answer = AiAnswer {
            question: "Why is the sky blue?".to_string(),
            answer: "Rayleigh scattering.".to_string(),
            model: "gpt-4o-mini".to_string(),
            usage: Some(AiUsage {
                prompt_tokens: 12,
                completion_tokens: 4,
                total_tokens: 16,
            }),
        };

        let json = serde_json::to_value(answer_embed(&answer)).unwrap();
        assert_eq!(json["title"], "ChatGPT");
        assert_eq!(json["description"], "Why is the sky blue?");
        assert_eq!(json["fields"][0]["value"], "gpt-4o-mini");
        assert_eq!(json["fields"][1]["value"], "12 prompt + 4 completion = 16");
    }

    #[test]
    fn test_chatgpt_group() {
        let command = chatgpt();
        let subcommands: Vec<&str> = command
            .subcommands
            .iter()
            .map(|sub| sub.name.as_str())
            .collect();

        assert_eq!(subcommands, vec!["ask", "dalle"]);
        assert!(command.subcommand_required);
    }
}
