// Raspberry Pi host utilities.

use crate::core::extensions::{Extension, Router};
use crate::core::pi::TemperatureLevel;
use crate::discord::{Command, Context, Error};
use crate::infra::pi::request_reboot;
use chrono::Utc;
use poise::serenity_prelude as serenity;

const LOG_TARGET: &str = "discord.cogs.pi";

pub struct RaspberryPiUtils;

impl Extension<Command> for RaspberryPiUtils {
    fn name(&self) -> &'static str {
        "pi"
    }

    fn register(&self, router: &mut Router<Command>) {
        router.command(temperature());
    }

    fn on_load(&self) {
        super::setup_cog_logger(LOG_TARGET);
        tracing::info!(target: LOG_TARGET, "RaspberryPiUtils is ready.");
    }
}

pub fn extension() -> Box<dyn Extension<Command>> {
    Box::new(RaspberryPiUtils)
}

/// Show the host CPU temperature.
#[poise::command(slash_command, prefix_command, category = "pi")]
pub async fn temperature(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let data = ctx.data();
    let now = Utc::now().with_timezone(&data.config.timezone).naive_local();
    let report = data.temperature.check(now).await?;

    match report.level {
        TemperatureLevel::Normal => tracing::info!(target: LOG_TARGET, "{}", report.message),
        TemperatureLevel::High | TemperatureLevel::Critical => {
            tracing::warn!(target: LOG_TARGET, "{}", report.message)
        }
    }

    ctx.say(report.message.clone()).await?;

    if let Some(alert) = report.alert() {
        let channel = serenity::ChannelId::new(data.config.report_channel_id);
        if let Err(e) = channel.say(&ctx, alert).await {
            tracing::error!(target: LOG_TARGET, "Failed to post temperature alert: {}", e);
        }
    }

    if report.reboot {
        tracing::warn!(target: LOG_TARGET, "Rebooting host after critical temperature");
        request_reboot().await?;
    }

    Ok(())
}
