use crate::config::BotConfig;
use crate::core::custom_commands::CustomCommandService;
use crate::core::guilds::GuildService;
use crate::core::leveling::LevelingService;
use crate::core::pipeline::MessagePipeline;
use crate::core::playlists::PlaylistService;
use crate::infra::sqlite::SqliteStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands and event handlers.
/// Every service runs over the same SQLite store.
pub struct Data {
    pub guilds: Arc<GuildService<SqliteStore>>,
    pub leveling: Arc<LevelingService<SqliteStore>>,
    pub custom_commands: Arc<CustomCommandService<SqliteStore>>,
    pub playlists: Arc<PlaylistService<SqliteStore>>,
    pub pipeline: Arc<MessagePipeline<SqliteStore>>,
    pub config: Arc<BotConfig>,
}
