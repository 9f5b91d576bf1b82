// Startup sequence, command gating and application command sync.

use crate::config::BotConfig;
use crate::core::extensions::ExtensionRegistry;
use crate::discord::commands::presence;
use crate::discord::{Command, Context, Data, Error};
use poise::serenity_prelude as serenity;
use std::collections::HashSet;

/// Runs once on the first Ready: loads every known cog, starts the presence
/// clock, publishes the slash commands and pings the owner.
///
/// A cog that fails to load is reported and skipped; the rest still load.
pub async fn start(
    ctx: &serenity::Context,
    ready: &serenity::Ready,
    framework: &poise::Framework<Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    let channel = serenity::ChannelId::new(data.config.report_channel_id);

    for notice in load_extensions(&data.extensions).await {
        notify(ctx, channel, notice).await;
    }

    presence::start(ctx.clone(), data.config.timezone);

    let count = sync_commands(ctx, &framework.options().commands, &data.extensions).await?;
    tracing::info!("Registered {} application commands", count);

    notify(
        ctx,
        channel,
        format!("{} is ready. <@{}>", ready.user.name, data.config.owner_id),
    )
    .await;

    Ok(())
}

/// Loads every known extension in order and returns one channel notice per
/// extension. A failure is logged and noted; the rest still load.
pub async fn load_extensions<C>(registry: &ExtensionRegistry<C>) -> Vec<String> {
    let mut notices = Vec::new();

    for name in registry.known() {
        match registry.load(name).await {
            Ok(()) => {
                tracing::info!(extension = name, "Extension loaded");
                notices.push(format!("`{}` loaded", name));
            }
            Err(err) => {
                tracing::error!(extension = name, "Failed to load extension: {}", err);
                notices.push(format!("`{}` failed to load: {}", name, err));
            }
        }
    }

    tracing::info!("Live extensions: {:?}", registry.loaded().await);
    notices
}

/// Replaces the global application commands with the ones currently live.
pub async fn sync_commands(
    ctx: &serenity::Context,
    commands: &[Command],
    registry: &ExtensionRegistry<Command>,
) -> Result<usize, serenity::Error> {
    let mut builders = Vec::with_capacity(commands.len());
    for command in commands {
        if !registry.is_command_active(&command.name).await {
            continue;
        }
        if let Some(builder) = command.create_as_slash_command() {
            builders.push(builder);
        }
    }

    let count = builders.len();
    serenity::Command::set_global_commands(ctx, builders).await?;
    Ok(count)
}

/// Framework-wide check: commands of unloaded cogs refuse to run, which also
/// covers prefix invocations that a slash-command resync cannot hide.
pub async fn command_is_active(ctx: Context<'_>) -> Result<bool, Error> {
    let root = root_command_name(&ctx.command().qualified_name);
    Ok(ctx.data().extensions.is_command_active(root).await)
}

/// The configured owner is the only identity allowed to run `owners_only`
/// commands; the framework must not add the application owner on its own.
pub fn framework_owners(config: &BotConfig) -> HashSet<serenity::UserId> {
    HashSet::from([serenity::UserId::new(config.owner_id)])
}

/// `chatgpt ask` => `chatgpt`
pub fn root_command_name(qualified_name: &str) -> &str {
    qualified_name.split(' ').next().unwrap_or(qualified_name)
}

async fn notify(ctx: &serenity::Context, channel: serenity::ChannelId, content: String) {
    let message = serenity::CreateMessage::new()
        .content(content)
        .flags(serenity::MessageFlags::SUPPRESS_NOTIFICATIONS);

    if let Err(e) = channel.send_message(ctx, message).await {
        tracing::warn!("Failed to post to channel {}: {}", channel, e);
    }
}
