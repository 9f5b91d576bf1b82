// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Extension registry and feature logic (platform-agnostic)
// - `infra/` = Implementations of core traits (shell, HTTP APIs) and logging
// - `discord/` = Discord-specific adapters (cogs, commands, lifecycle)
//
// This file's job is to:
// 1. Load configuration and set up logging
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Run the client until shutdown

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::ai::{AiConfig, AiService};
use crate::core::pi::TemperatureService;
use crate::discord::{cogs, commands, errors, lifecycle, Data};
use crate::infra::ai::OpenAiClient;
use crate::infra::logging::{self, LoggingConfig};
use crate::infra::pi::ShellThermalProbe;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;

const SYSTEM_PROMPT: &str = "You are a helpful assistant in a Discord server. Keep answers concise.";

#[tokio::main]
async fn main() {
    // Missing token or ids are fatal; print the remediation and stop
    let config = match BotConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    let log_guard = match logging::init(LoggingConfig::new(&config.log_dir)) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Failed to initialise logging: {}", err);
            std::process::exit(1);
        }
    };
    for package in ["main", "discord"] {
        if let Err(err) =
            logging::setup_package_logger(package, LevelFilter::INFO, LevelFilter::DEBUG)
        {
            eprintln!("Failed to set up logger {}: {}", package, err);
            std::process::exit(1);
        }
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let extensions = Arc::new(cogs::registry());

    let temperature = Arc::new(TemperatureService::new(
        ShellThermalProbe::new(config.pi.temperature_command.clone()),
        config.pi.auto_reboot,
    ));

    if config.openai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; chatgpt commands will reply with a notice");
    }
    let ai_client = OpenAiClient::new(config.openai.api_key.clone(), config.openai.base_url.clone());
    let ai_config = AiConfig {
        model: config.openai.model.clone(),
        image_model: config.openai.image_model.clone(),
        temperature: 0.7,
        max_tokens: None,
        image_size: "1024x1024".to_string(),
    };
    let ai = Arc::new(AiService::new(
        ai_client,
        SYSTEM_PROMPT.to_string(),
        ai_config,
    ));

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let mut all_commands = commands::host_commands();
    all_commands.extend(extensions.catalog());

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT; // Required for prefix commands

    let setup_config = Arc::clone(&config);
    let setup_extensions = Arc::clone(&extensions);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands,
            owners: lifecycle::framework_owners(&config),
            initialize_owners: false,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                additional_prefixes: vec![
                    poise::Prefix::Literal("?"),
                    poise::Prefix::Literal("hey siri, "),
                ],
                mention_as_prefix: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(errors::on_error(error)),
            command_check: Some(|ctx| Box::pin(lifecycle::command_is_active(ctx))),
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::info!("Received '{}' command.", ctx.command().qualified_name);
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!("Logged in as {}", ready.user.name);

                let data = Data {
                    config: setup_config,
                    extensions: setup_extensions,
                    temperature,
                    ai,
                };
                lifecycle::start(ctx, ready, framework, &data).await?;

                Ok(data)
            })
        })
        .build();

    let mut client = match serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("Error creating client: {:?}", err);
            drop(log_guard);
            std::process::exit(1);
        }
    };

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested, closing shards");
            shard_manager.shutdown_all().await;
        }
    });

    if let Err(why) = client.start().await {
        tracing::error!("Client error: {:?}", why);
    }

    // Dropping the client releases the gateway and HTTP sessions
    drop(client);
    tracing::info!("Session closed");

    // Blocks until the file writers have drained
    drop(log_guard);
}
