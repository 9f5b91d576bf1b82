// Process configuration read from the environment.
//
// `env/bot.env` (or `.env`) is loaded first if present, so values can live
// on disk during development. Missing required values are fatal at startup.

use chrono_tz::Tz;
use std::path::PathBuf;

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_TEMPERATURE_COMMAND: &str =
    "cat /sys/class/thermal/thermal_zone0/temp | awk '{print $1/1000}'";

const ENV_FILE: &str = "env/bot.env";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "{0} not found in env file, please add it in env/bot.env\n\
         if you are using this bot for the first time, copy env.example to env/bot.env and fill in the values"
    )]
    Missing(&'static str),
    #[error("{key} must be a numeric Discord id, got {value:?}")]
    InvalidId { key: &'static str, value: String },
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub image_model: String,
}

#[derive(Debug, Clone)]
pub struct PiSettings {
    pub temperature_command: String,
    pub auto_reboot: bool,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Channel that receives startup and alert notifications.
    pub report_channel_id: u64,
    pub owner_id: u64,
    pub timezone: Tz,
    pub log_dir: PathBuf,
    pub openai: OpenAiSettings,
    pub pi: PiSettings,
}

impl BotConfig {
    /// Loads `env/bot.env` / `.env` (when present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv::from_path(ENV_FILE).is_err() {
            dotenv::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = non_empty("DISCORD_BOT_TOKEN").ok_or(ConfigError::Missing("DISCORD_BOT_TOKEN"))?;
        let report_channel_id = parse_id("TEST_CHANNEL_ID", non_empty("TEST_CHANNEL_ID"))?;
        let owner_id = parse_id("OWNER_ID", non_empty("OWNER_ID"))?;

        let timezone = match non_empty("BOT_TIMEZONE") {
            Some(name) => name.parse::<Tz>().map_err(|_| ConfigError::Invalid {
                key: "BOT_TIMEZONE",
                value: name.clone(),
            })?,
            None => chrono_tz::Asia::Taipei,
        };

        let auto_reboot = match non_empty("PI_AUTO_REBOOT") {
            Some(value) => value.parse::<bool>().map_err(|_| ConfigError::Invalid {
                key: "PI_AUTO_REBOOT",
                value,
            })?,
            None => false,
        };

        Ok(Self {
            token,
            report_channel_id,
            owner_id,
            timezone,
            log_dir: non_empty("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            openai: OpenAiSettings {
                api_key: non_empty("OPENAI_API_KEY"),
                base_url: non_empty("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                image_model: non_empty("OPENAI_IMAGE_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_IMAGE_MODEL.to_string()),
            },
            pi: PiSettings {
                temperature_command: non_empty("PI_TEMPERATURE_COMMAND")
                    .unwrap_or_else(|| DEFAULT_TEMPERATURE_COMMAND.to_string()),
                auto_reboot,
            },
        })
    }
}

fn parse_id(key: &'static str, value: Option<String>) -> Result<u64, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(key))?;
    // Discord ids are non-zero snowflakes
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| ConfigError::InvalidId {
            key,
            value: value.clone(),
        })
}
