use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix new guilds start with.
pub const DEFAULT_PREFIX: &str = "!";

/// Per-guild settings. One record per guild id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    pub guild_id: u64,
    pub name: String,
    pub prefix: String,
    pub welcome_channel_id: Option<u64>,
    /// Template with `{user}` and `{server}` placeholders.
    pub welcome_message: Option<String>,
    pub log_channel_id: Option<u64>,
    pub music_channel_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guild {
    /// A fresh record with default settings.
    pub fn new(guild_id: u64, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            guild_id,
            name: name.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            welcome_channel_id: None,
            welcome_message: None,
            log_channel_id: None,
            music_channel_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the given settings into this record and stamp the update time.
    pub fn apply(&mut self, settings: &GuildSettings, now: DateTime<Utc>) {
        if let Some(name) = &settings.name {
            self.name = name.clone();
        }
        if let Some(prefix) = &settings.prefix {
            self.prefix = prefix.clone();
        }
        if let Some(channel) = settings.welcome_channel_id {
            self.welcome_channel_id = channel;
        }
        if let Some(message) = &settings.welcome_message {
            self.welcome_message = message.clone();
        }
        if let Some(channel) = settings.log_channel_id {
            self.log_channel_id = channel;
        }
        if let Some(channel) = settings.music_channel_id {
            self.music_channel_id = channel;
        }
        self.updated_at = now;
    }
}

/// A partial settings update. `None` leaves a field untouched; for the
/// nullable fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuildSettings {
    pub name: Option<String>,
    pub prefix: Option<String>,
    pub welcome_channel_id: Option<Option<u64>>,
    pub welcome_message: Option<Option<String>>,
    pub log_channel_id: Option<Option<u64>>,
    pub music_channel_id: Option<Option<u64>>,
}

impl GuildSettings {
    pub fn is_empty(&self) -> bool {
        self == &GuildSettings::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn welcome_channel(mut self, channel_id: Option<u64>) -> Self {
        self.welcome_channel_id = Some(channel_id);
        self
    }

    pub fn welcome_message(mut self, template: Option<String>) -> Self {
        self.welcome_message = Some(template);
        self
    }

    pub fn log_channel(mut self, channel_id: Option<u64>) -> Self {
        self.log_channel_id = Some(channel_id);
        self
    }

    pub fn music_channel(mut self, channel_id: Option<u64>) -> Self {
        self.music_channel_id = Some(channel_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_guild_uses_default_prefix() {
        let guild = Guild::new(1, "Rustaceans", Utc::now());
        assert_eq!(guild.prefix, "!");
        assert!(guild.welcome_channel_id.is_none());
        assert_eq!(guild.created_at, guild.updated_at);
    }

    #[test]
    fn apply_only_touches_given_fields() {
        let created = Utc::now();
        let mut guild = Guild::new(1, "Rustaceans", created);
        guild.log_channel_id = Some(55);

        let later = created + chrono::Duration::seconds(30);
        guild.apply(&GuildSettings::default().welcome_channel(Some(9)), later);

        assert_eq!(guild.welcome_channel_id, Some(9));
        assert_eq!(guild.log_channel_id, Some(55));
        assert_eq!(guild.updated_at, later);
    }

    #[test]
    fn some_none_clears_a_channel() {
        let mut guild = Guild::new(1, "Rustaceans", Utc::now());
        guild.log_channel_id = Some(55);
        guild.apply(&GuildSettings::default().log_channel(None), Utc::now());
        assert_eq!(guild.log_channel_id, None);
    }

    #[test]
    fn empty_settings_are_detected() {
        assert!(GuildSettings::default().is_empty());
        assert!(!GuildSettings::default().prefix("?").is_empty());
    }
}
