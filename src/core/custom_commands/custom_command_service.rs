use super::custom_command_models::{normalize_name, CustomCommand};
use crate::core::store::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

/// Longest accepted command name.
pub const MAX_NAME_LEN: usize = 32;
/// Discord's message length limit; a response must fit in one message.
pub const MAX_RESPONSE_LEN: usize = 2000;

#[derive(Debug, Error)]
pub enum CustomCommandError {
    #[error("Command names must be 1-{MAX_NAME_LEN} characters without spaces")]
    InvalidName,

    #[error("Responses must be 1-{MAX_RESPONSE_LEN} characters")]
    InvalidResponse,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Port for custom command persistence. Every `name` argument is matched
/// case-insensitively by implementations.
#[async_trait]
pub trait CommandStore: Send + Sync {
    async fn get_custom_command(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError>;

    /// Insert a command. Returns `false` if the (guild, name) pair exists.
    async fn create_custom_command(&self, command: CustomCommand) -> Result<bool, StoreError>;

    /// Atomically increment the usage counter and return the updated record.
    async fn use_custom_command(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError>;

    /// All commands of a guild, ordered by name.
    async fn list_custom_commands(&self, guild_id: u64) -> Result<Vec<CustomCommand>, StoreError>;

    async fn delete_custom_command(&self, guild_id: u64, name: &str) -> Result<bool, StoreError>;
}

pub struct CustomCommandService<S: CommandStore> {
    store: Arc<S>,
}

impl<S: CommandStore> CustomCommandService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get(&self, guild_id: u64, name: &str) -> Result<Option<CustomCommand>, StoreError> {
        self.store
            .get_custom_command(guild_id, &normalize_name(name))
            .await
    }

    /// Create a command. `Ok(false)` means the name is already taken in this
    /// guild and the existing command was left alone.
    pub async fn create(
        &self,
        guild_id: u64,
        name: &str,
        response: &str,
        created_by: u64,
    ) -> Result<bool, CustomCommandError> {
        let name = normalize_name(name);
        if name.is_empty()
            || name.chars().count() > MAX_NAME_LEN
            || name.chars().any(char::is_whitespace)
        {
            return Err(CustomCommandError::InvalidName);
        }

        let response = response.trim();
        if response.is_empty() || response.chars().count() > MAX_RESPONSE_LEN {
            return Err(CustomCommandError::InvalidResponse);
        }

        let command = CustomCommand {
            guild_id,
            name,
            response: response.to_string(),
            created_by,
            uses: 0,
            created_at: Utc::now(),
        };

        Ok(self.store.create_custom_command(command).await?)
    }

    pub async fn record_use(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError> {
        self.store
            .use_custom_command(guild_id, &normalize_name(name))
            .await
    }

    pub async fn list(&self, guild_id: u64) -> Result<Vec<CustomCommand>, StoreError> {
        self.store.list_custom_commands(guild_id).await
    }

    pub async fn remove(&self, guild_id: u64, name: &str) -> Result<bool, StoreError> {
        self.store
            .delete_custom_command(guild_id, &normalize_name(name))
            .await
    }
}
