use super::guild_models::{Guild, GuildSettings};
use super::guild_store::GuildStore;
use crate::core::store::StoreError;
use chrono::Utc;
use std::sync::Arc;

/// What to post when a member joins a guild with a welcome channel.
#[derive(Debug, Clone, PartialEq)]
pub enum WelcomeMessage {
    /// The guild's own template with placeholders filled in.
    Custom(String),
    /// No template configured; the Discord layer sends its default embed.
    Default,
}

pub struct GuildService<S: GuildStore> {
    store: Arc<S>,
}

impl<S: GuildStore> GuildService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get_guild(&self, guild_id: u64) -> Result<Option<Guild>, StoreError> {
        self.store.get_guild(guild_id).await
    }

    /// Return the stored guild, creating it with default settings on first
    /// reference. Repeated calls are idempotent.
    pub async fn get_or_create_guild(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Guild, StoreError> {
        if let Some(guild) = self.store.get_guild(guild_id).await? {
            return Ok(guild);
        }

        let guild = Guild::new(guild_id, name, Utc::now());
        if self.store.create_guild(guild.clone()).await? {
            tracing::info!(guild_id, name, "Created guild record");
            return Ok(guild);
        }

        // Another event created it between our read and insert.
        match self.store.get_guild(guild_id).await? {
            Some(existing) => Ok(existing),
            None => Err(StoreError::Backend(format!(
                "guild {guild_id} vanished after a duplicate insert"
            ))),
        }
    }

    pub async fn update_guild(
        &self,
        guild_id: u64,
        settings: GuildSettings,
    ) -> Result<bool, StoreError> {
        if settings.is_empty() {
            return Ok(false);
        }
        self.store
            .update_guild(guild_id, &settings, Utc::now())
            .await
    }

    /// Pick the welcome message for a new member.
    pub fn welcome_message(guild: &Guild, user_mention: &str, server_name: &str) -> WelcomeMessage {
        match &guild.welcome_message {
            Some(template) if !template.trim().is_empty() => WelcomeMessage::Custom(
                template
                    .replace("{user}", user_mention)
                    .replace("{server}", server_name),
            ),
            _ => WelcomeMessage::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryStore;

    fn make_service() -> GuildService<InMemoryStore> {
        GuildService::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let service = make_service();

        let first = service.get_or_create_guild(10, "Ferris Fans").await.unwrap();
        let second = service.get_or_create_guild(10, "Renamed").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.name, "Ferris Fans");
        assert_eq!(second.prefix, "!");
    }

    #[tokio::test]
    async fn update_reports_whether_a_record_changed() {
        let service = make_service();

        let missing = service
            .update_guild(10, GuildSettings::default().prefix("?"))
            .await
            .unwrap();
        assert!(!missing);

        service.get_or_create_guild(10, "Ferris Fans").await.unwrap();
        let updated = service
            .update_guild(10, GuildSettings::default().welcome_channel(Some(77)))
            .await
            .unwrap();
        assert!(updated);

        let guild = service.get_guild(10).await.unwrap().unwrap();
        assert_eq!(guild.welcome_channel_id, Some(77));
        assert!(guild.updated_at >= guild.created_at);
    }

    #[tokio::test]
    async fn empty_update_is_a_no_op() {
        let service = make_service();
        service.get_or_create_guild(10, "Ferris Fans").await.unwrap();
        assert!(!service.update_guild(10, GuildSettings::default()).await.unwrap());
    }

    #[test]
    fn welcome_template_fills_placeholders() {
        let mut guild = Guild::new(1, "Ferris Fans", Utc::now());
        guild.welcome_message = Some("Hi {user}, welcome to {server}!".to_string());

        let message = GuildService::<InMemoryStore>::welcome_message(&guild, "<@5>", "Ferris Fans");
        assert_eq!(
            message,
            WelcomeMessage::Custom("Hi <@5>, welcome to Ferris Fans!".to_string())
        );
    }

    #[test]
    fn missing_template_falls_back_to_default() {
        let guild = Guild::new(1, "Ferris Fans", Utc::now());
        let message = GuildService::<InMemoryStore>::welcome_message(&guild, "<@5>", "Ferris Fans");
        assert_eq!(message, WelcomeMessage::Default);
    }
}
