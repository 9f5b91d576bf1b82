// Cogs: named bundles of commands that can be loaded, unloaded and reloaded
// at runtime by the owner.
//
// Adding a cog means writing a module with an `extension()` factory and
// listing it in `FACTORIES`.

pub mod gpt;
pub mod pi;

use crate::core::extensions::{ExtensionFactory, ExtensionRegistry, Router};
use crate::discord::Command;
use crate::infra::logging;
use tracing::level_filters::LevelFilter;

/// Every cog the bot knows about, in startup load order.
pub const FACTORIES: &[ExtensionFactory<Command>] = &[pi::extension, gpt::extension];

pub fn registry() -> ExtensionRegistry<Command> {
    ExtensionRegistry::new(FACTORIES)
}

impl Router<Command> {
    /// Registers a poise command under its own name.
    pub fn command(&mut self, command: Command) -> &mut Self {
        let name = command.name.clone();
        self.add(name, command)
    }
}

/// Gives a cog its own log file (`discord.cogs.pi` => `logs/discord/cogs/pi.log`).
/// Cogs log with `target: <package>` so their records land there. Safe to
/// call on every reload.
pub(crate) fn setup_cog_logger(package: &str) {
    if let Err(err) = logging::setup_package_logger(package, LevelFilter::INFO, LevelFilter::DEBUG)
    {
        tracing::warn!("Could not set up logger for {}: {}", package, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_cogs() {
        assert_eq!(registry().known(), vec!["pi", "gpt"]);
    }

    #[test]
    fn test_catalog_holds_every_root_command() {
        let names: Vec<String> = registry()
            .catalog()
            .iter()
            .map(|command| command.name.clone())
            .collect();
        assert_eq!(names, vec!["temperature", "chatgpt"]);
    }

    #[tokio::test]
    async fn test_commands_follow_cog_state() {
        let registry = registry();
        assert!(!registry.is_command_active("chatgpt").await);

        registry.load("gpt").await.unwrap();
        assert!(registry.is_command_active("chatgpt").await);
        assert!(!registry.is_command_active("temperature").await);

        registry.reload("gpt").await.unwrap();
        assert_eq!(registry.loaded().await, vec!["gpt"]);
    }
}
