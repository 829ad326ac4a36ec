use super::guild_models::{Guild, GuildSettings};
use crate::core::store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait GuildStore: Send + Sync {
    async fn get_guild(&self, guild_id: u64) -> Result<Option<Guild>, StoreError>;

    /// Insert a new guild record. Returns `false` when a record with the same
    /// id already exists (the existing record is left untouched).
    async fn create_guild(&self, guild: Guild) -> Result<bool, StoreError>;

    /// Merge `settings` into the guild record and stamp `updated_at = now`.
    /// Returns whether a record was modified.
    async fn update_guild(
        &self,
        guild_id: u64,
        settings: &GuildSettings,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
