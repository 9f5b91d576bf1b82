// Discord layer - commands, cogs, lifecycle hooks and error reporting.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "cogs/cog_catalog.rs"]
pub mod cogs;

pub mod embeds;
pub mod errors;
pub mod lifecycle;

use crate::config::BotConfig;
use crate::core::ai::AiService;
use crate::core::extensions::ExtensionRegistry;
use crate::core::pi::TemperatureService;
use crate::infra::ai::OpenAiClient;
use crate::infra::pi::ShellThermalProbe;
use std::sync::Arc;

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type Command = poise::Command<Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub config: Arc<BotConfig>,
    pub extensions: Arc<ExtensionRegistry<Command>>,
    pub temperature: Arc<TemperatureService<ShellThermalProbe>>,
    pub ai: Arc<AiService<OpenAiClient>>,
}
