// The core module contains all business logic.
// Each feature gets its own submodule; none of them import serenity or poise.

#[path = "store/store_error.rs"]
pub mod store;

#[path = "guilds/mod.rs"]
pub mod guilds;

#[path = "leveling/leveling_service.rs"]
pub mod leveling;

#[path = "custom_commands/mod.rs"]
pub mod custom_commands;

#[path = "playlists/mod.rs"]
pub mod playlists;

#[path = "pipeline/mod.rs"]
pub mod pipeline;
