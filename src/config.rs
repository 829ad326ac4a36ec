//! Runtime configuration.
//!
//! Secrets come from the environment (`.env` is loaded first by `main`).
//! Everything else may live in an optional TOML file; missing keys fall back
//! to defaults, and a few environment variables override the file.

use crate::core::pipeline::PipelineSettings;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Where the optional settings file is looked up.
pub const CONFIG_PATH: &str = "config/settings.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    MissingEnv(String),

    #[error("{var} has an invalid value: {value:?}")]
    InvalidValue { var: String, value: String },

    #[error("Invalid config file: {0}")]
    InvalidFile(#[from] toml::de::Error),

    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a cached custom command stays valid. Unset keeps entries until
    /// restart.
    pub ttl_secs: Option<u64>,
    pub max_per_guild: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            max_per_guild: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub console_debug: bool,
    pub logs_enabled: bool,
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_debug: false,
            logs_enabled: true,
            log_dir: "logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    #[serde(skip)]
    pub discord_token: String,
    #[serde(skip)]
    pub database_url: String,

    pub command_prefix: String,
    pub xp_per_message: u64,
    pub store_timeout_secs: u64,
    pub command_cache: CacheConfig,
    pub logging: LoggingConfig,
    /// Register slash commands in this guild only (instant updates while
    /// developing). Global registration otherwise.
    pub dev_guild_id: Option<u64>,
    /// "Watching ..." activity text.
    pub presence: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            database_url: String::new(),
            command_prefix: crate::core::guilds::DEFAULT_PREFIX.to_string(),
            xp_per_message: 1,
            store_timeout_secs: 5,
            command_cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            dev_guild_id: None,
            presence: "/help".to_string(),
        }
    }
}

impl BotConfig {
    /// Read the settings file (if present) and overlay the process
    /// environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)?,
            // Tracing is not installed yet; main reports the missing file.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err.into()),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay values from an environment lookup. `DISCORD_TOKEN` and
    /// `DATABASE_URL` are required.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
        };

        self.discord_token = required("DISCORD_TOKEN")?;
        self.database_url = required("DATABASE_URL")?;

        if let Some(raw) = lookup("GUILD_ID") {
            let id = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: "GUILD_ID".to_string(),
                value: raw.clone(),
            })?;
            self.dev_guild_id = Some(id);
        }

        if let Some(prefix) = lookup("COMMAND_PREFIX") {
            let prefix = prefix.trim();
            if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue {
                    var: "COMMAND_PREFIX".to_string(),
                    value: prefix.to_string(),
                });
            }
            self.command_prefix = prefix.to_string();
        }

        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            prefix: self.command_prefix.clone(),
            xp_per_message: self.xp_per_message,
            store_timeout: self.store_timeout(),
            cache_ttl: self.command_cache.ttl_secs.map(Duration::from_secs),
            cache_max_per_guild: self.command_cache.max_per_guild,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = BotConfig::from_toml_str("").unwrap();
        assert_eq!(config, BotConfig::default());
        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.pipeline_settings().cache_ttl, None);
    }

    #[test]
    fn file_values_are_read() {
        let config = BotConfig::from_toml_str(
            r#"
            command_prefix = "?"
            xp_per_message = 3

            [command_cache]
            ttl_secs = 60

            [logging]
            console_debug = true
            "#,
        )
        .unwrap();

        let settings = config.pipeline_settings();
        assert_eq!(settings.prefix, "?");
        assert_eq!(settings.xp_per_message, 3);
        assert_eq!(settings.cache_ttl, Some(Duration::from_secs(60)));
        assert_eq!(settings.cache_max_per_guild, 256);
        assert!(config.logging.console_debug);
        assert!(config.logging.logs_enabled);
    }

    #[test]
    fn env_overrides_file() {
        let mut config = BotConfig::from_toml_str("command_prefix = \"?\"").unwrap();
        config
            .apply_env(env(&[
                ("DISCORD_TOKEN", "token"),
                ("DATABASE_URL", "sqlite://bot.db"),
                ("GUILD_ID", "1234"),
                ("COMMAND_PREFIX", "$"),
            ]))
            .unwrap();

        assert_eq!(config.discord_token, "token");
        assert_eq!(config.database_url, "sqlite://bot.db");
        assert_eq!(config.dev_guild_id, Some(1234));
        assert_eq!(config.command_prefix, "$");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let mut config = BotConfig::default();
        let err = config
            .apply_env(env(&[("DISCORD_TOKEN", "token")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref name) if name == "DATABASE_URL"));
    }

    #[test]
    fn bad_guild_id_is_rejected() {
        let mut config = BotConfig::default();
        let err = config
            .apply_env(env(&[
                ("DISCORD_TOKEN", "token"),
                ("DATABASE_URL", "bot.db"),
                ("GUILD_ID", "not-a-number"),
            ]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(matches!(
            BotConfig::from_toml_str("xp_per_message = \"lots\""),
            Err(ConfigError::InvalidFile(_))
        ));
    }
}
