pub mod custom_command_models;
pub mod custom_command_service;

pub use custom_command_models::{normalize_name, CustomCommand};
pub use custom_command_service::{CommandStore, CustomCommandError, CustomCommandService};
