pub mod guild_models;
pub mod guild_service;
pub mod guild_store;

pub use guild_models::{Guild, GuildSettings, DEFAULT_PREFIX};
pub use guild_service::{GuildService, WelcomeMessage};
pub use guild_store::GuildStore;
