// Global command error handling.
//
// Every error that escapes a command is logged in full and then reported
// back to the invoking user as an ephemeral embed plus an `error.txt`
// attachment carrying the error type and message. The process keeps running.

use crate::config::ConfigError;
use crate::core::ai::AiError;
use crate::core::extensions::ExtensionError;
use crate::core::pi::PiError;
use crate::discord::embeds::{create_embed, Field, RED};
use crate::discord::{Context, Data, Error};
use poise::serenity_prelude as serenity;
use std::error::Error as StdError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

impl ErrorReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn from_error(error: &(dyn StdError + Send + Sync + 'static)) -> Self {
        Self::new(error_kind(error), error.to_string())
    }

    /// Body of both the embed field and the attached `error.txt`.
    pub fn details(&self) -> String {
        format!(
            "Error Type: `{}`\nError Message: `{}`\n",
            self.kind, self.message
        )
    }

    pub fn embed(&self) -> serenity::CreateEmbed {
        create_embed(
            "Error occurred",
            &format!("\n{}", self.kind),
            Some(RED),
            None,
            None,
            &[Field::new("Error info", self.details())],
        )
    }

    pub fn attachment(&self) -> serenity::CreateAttachment {
        serenity::CreateAttachment::bytes(self.details().into_bytes(), "error.txt")
    }

    pub fn reply(&self) -> poise::CreateReply {
        poise::CreateReply::default()
            .embed(self.embed())
            .attachment(self.attachment())
            .ephemeral(true)
    }
}

/// Best-effort type name for a boxed error.
pub fn error_kind(error: &(dyn StdError + Send + Sync + 'static)) -> &'static str {
    if error.is::<ExtensionError>() {
        "ExtensionError"
    } else if error.is::<PiError>() {
        "PiError"
    } else if error.is::<AiError>() {
        "AiError"
    } else if error.is::<ConfigError>() {
        "ConfigError"
    } else if error.is::<serenity::Error>() {
        "SerenityError"
    } else if error.is::<reqwest::Error>() {
        "HttpError"
    } else if error.is::<serde_json::Error>() {
        "JsonError"
    } else if error.is::<std::io::Error>() {
        "IoError"
    } else {
        "Error"
    }
}

/// Name for framework errors that are raised before or around a command body.
pub fn framework_error_kind(error: &poise::FrameworkError<'_, Data, Error>) -> &'static str {
    use poise::FrameworkError as Fe;
    match error {
        Fe::SubcommandRequired { .. } => "SubcommandRequired",
        Fe::CommandPanic { .. } => "CommandPanic",
        Fe::CommandStructureMismatch { .. } => "CommandStructureMismatch",
        Fe::CooldownHit { .. } => "CommandOnCooldown",
        Fe::MissingBotPermissions { .. } => "BotMissingPermissions",
        Fe::MissingUserPermissions { .. } => "MissingPermissions",
        Fe::GuildOnly { .. } => "NoPrivateMessage",
        Fe::DmOnly { .. } => "PrivateMessageOnly",
        Fe::NsfwOnly { .. } => "NSFWChannelRequired",
        Fe::UnknownInteraction { .. } => "UnknownInteraction",
        _ => "FrameworkError",
    }
}

/// Writes the error record, then builds the reply. A reply that fails to
/// send never costs us the record.
pub fn log_report(command: &str, user: u64, report: &ErrorReport) -> poise::CreateReply {
    tracing::error!(
        command = command,
        user = user,
        "{}: {}",
        report.kind,
        report.message
    );
    report.reply()
}

async fn report(ctx: Context<'_>, report: ErrorReport) {
    let reply = log_report(&ctx.command().qualified_name, ctx.author().id.get(), &report);

    if let Err(e) = ctx.send(reply).await {
        tracing::error!("Failed to send error report: {}", e);
    }
}

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            panic!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            report(ctx, ErrorReport::from_error(&*error)).await;
        }
        poise::FrameworkError::NotAnOwner { ctx, .. } => {
            report(ctx, ErrorReport::new("NotOwner", "You do not own this bot.")).await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            report(ctx, ErrorReport::new("BadArgument", error.to_string())).await;
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            let details = match error {
                Some(error) => ErrorReport::from_error(&*error),
                None => ErrorReport::new(
                    "CheckFailure",
                    "This command belongs to an extension that is not loaded.",
                ),
            };
            report(ctx, details).await;
        }
        error => match error.ctx() {
            Some(ctx) => {
                let details = ErrorReport::new(framework_error_kind(&error), error.to_string());
                report(ctx, details).await;
            }
            None => {
                if let Err(e) = poise::builtins::on_error(error).await {
                    tracing::error!("Error while handling error: {}", e)
                }
            }
        },
    }
}
