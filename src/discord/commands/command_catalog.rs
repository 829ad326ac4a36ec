// Discord commands module.
// Each feature gets its own command file exposing `commands()`; `all()` is
// the explicit registry main hands to poise.

use crate::discord::{Data, Error};

pub mod custom_commands;
pub mod general;
pub mod leveling;
pub mod moderation;
pub mod playlists;
pub mod settings;

pub fn all() -> Vec<poise::Command<Data, Error>> {
    let mut commands = Vec::new();
    commands.extend(general::commands());
    commands.extend(leveling::commands());
    commands.extend(settings::commands());
    commands.extend(custom_commands::commands());
    commands.extend(moderation::commands());
    commands.extend(playlists::commands());
    commands
}
