// This module handles the bot presence.
//
// The bot shows the current local time as its custom status and refreshes it
// once a minute from a background task started on ready.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const PRESENCE_INTERVAL: Duration = Duration::from_secs(60);

pub fn presence_text(now: &DateTime<Tz>) -> String {
    format!("🕒 Current time: {}", now.format("%Y-%m-%d %H:%M"))
}

/// Sets the custom status to the current time in `timezone`.
pub fn update_time(ctx: &serenity::Context, timezone: Tz) {
    let now = Utc::now().with_timezone(&timezone);
    let activity = serenity::ActivityData::custom(presence_text(&now));
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Spawns the one-minute presence loop. The first update happens immediately.
pub fn start(ctx: serenity::Context, timezone: Tz) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRESENCE_INTERVAL);
        loop {
            interval.tick().await;
            tracing::debug!("Updating presence clock");
            update_time(&ctx, timezone);
        }
    })
}
