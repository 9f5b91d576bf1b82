// Owner-only extension management.
//
// Each command changes the registry, resyncs the application commands and
// reports back. A failed resync is surfaced but not rolled back.

use crate::discord::lifecycle::sync_commands;
use crate::discord::{Context, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionAction {
    Load,
    Unload,
    Reload,
}

impl ExtensionAction {
    pub fn past_tense(self) -> &'static str {
        match self {
            ExtensionAction::Load => "loaded",
            ExtensionAction::Unload => "unloaded",
            ExtensionAction::Reload => "reloaded",
        }
    }
}

/// Load extension. (owner only)
#[poise::command(slash_command, prefix_command, owners_only, hide_in_help)]
pub async fn load(
    ctx: Context<'_>,
    #[description = "Extension name, e.g. pi"] extension: String,
) -> Result<(), Error> {
    manage(ctx, &extension, ExtensionAction::Load).await
}

/// Unload extension. (owner only)
#[poise::command(slash_command, prefix_command, owners_only, hide_in_help)]
pub async fn unload(
    ctx: Context<'_>,
    #[description = "Extension name, e.g. pi"] extension: String,
) -> Result<(), Error> {
    manage(ctx, &extension, ExtensionAction::Unload).await
}

/// Reload extension. (owner only)
#[poise::command(slash_command, prefix_command, owners_only, hide_in_help)]
pub async fn reload(
    ctx: Context<'_>,
    #[description = "Extension name, e.g. pi"] extension: String,
) -> Result<(), Error> {
    manage(ctx, &extension, ExtensionAction::Reload).await
}

async fn manage(ctx: Context<'_>, extension: &str, action: ExtensionAction) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let name = normalize_extension_name(extension);
    let registry = &ctx.data().extensions;
    match action {
        ExtensionAction::Load => registry.load(&name).await?,
        ExtensionAction::Unload => registry.unload(&name).await?,
        ExtensionAction::Reload => registry.reload(&name).await?,
    }
    tracing::info!(extension = %name, "Extension {}", action.past_tense());

    // New or removed commands only show up in the slash menu after a resync
    sync_commands(
        ctx.serenity_context(),
        &ctx.framework().options().commands,
        registry,
    )
    .await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!("`{}` {}", name, action.past_tense()))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Accepts `pi`, ` Pi ` and the dotted `cogs.pi` form.
pub fn normalize_extension_name(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("cogs.")
        .unwrap_or(trimmed)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_extension_name() {
        assert_eq!(normalize_extension_name("pi"), "pi");
        assert_eq!(normalize_extension_name("  GPT "), "gpt");
        assert_eq!(normalize_extension_name("cogs.pi"), "pi");
    }

    #[test]
    fn test_management_commands_are_owner_only() {
        for command in [load(), unload(), reload()] {
            assert!(command.owners_only, "{} must be owner only", command.name);
            assert!(command.slash_action.is_some());
            assert!(command.prefix_action.is_some());
        }
    }

    #[test]
    fn test_past_tense() {
        assert_eq!(ExtensionAction::Load.past_tense(), "loaded");
        assert_eq!(ExtensionAction::Unload.past_tense(), "unloaded");
        assert_eq!(ExtensionAction::Reload.past_tense(), "reloaded");
    }
}
