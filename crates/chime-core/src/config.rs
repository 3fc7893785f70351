use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Top-level config (chime.toml + CHIME_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChimeConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Reminder scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// IANA zone used when a caller omits the `timezone` argument.
    /// Override with env var: CHIME_SCHEDULER__DEFAULT_TIMEZONE=Europe/Berlin
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Usernames (with or without `@`) or numeric user ids allowed to talk to
    /// the bot. Empty denies everyone; `"*"` allows everyone.
    #[serde(default)]
    pub allow_users: Vec<String>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl ChimeConfig {
    /// Load config from a TOML file with CHIME_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.chime/chime.toml
    ///
    /// Nested keys use a double underscore in env vars, e.g.
    /// `CHIME_CHANNELS__TELEGRAM__BOT_TOKEN`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: ChimeConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CHIME_").split("__"))
            .extract()
            .map_err(|e| crate::error::ChimeError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.chime/chime.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("absent.toml");
            let config = ChimeConfig::load(path.to_str()).expect("defaults");
            assert_eq!(config.scheduler.default_timezone, "UTC");
            assert!(config.channels.telegram.is_none());
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_read() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "chime.toml",
                r#"
                [scheduler]
                default_timezone = "Europe/Berlin"

                [channels.telegram]
                bot_token = "123:abc"
                allow_users = ["@alice"]
                "#,
            )?;
            let config = ChimeConfig::load(Some("chime.toml")).expect("config");
            assert_eq!(config.scheduler.default_timezone, "Europe/Berlin");
            let tg = config.channels.telegram.expect("telegram section");
            assert_eq!(tg.bot_token, "123:abc");
            assert_eq!(tg.allow_users, vec!["@alice".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "chime.toml",
                "[scheduler]\ndefault_timezone = \"Asia/Tokyo\"\n",
            )?;
            jail.set_env("CHIME_SCHEDULER__DEFAULT_TIMEZONE", "America/New_York");
            let config = ChimeConfig::load(Some("chime.toml")).expect("config");
            assert_eq!(config.scheduler.default_timezone, "America/New_York");
            Ok(())
        });
    }
}
