// Discord layer - commands and event handlers.
//
// Everything Discord-specific lives below this module. Handlers pull
// primitive ids and text out of serenity types, call a core service and
// render the result.

#[path = "bot_data.rs"]
mod bot_data;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "events/event_catalog.rs"]
pub mod events;

#[path = "error_handler.rs"]
pub mod error_handler;

pub use bot_data::{Context, Data, Error};
