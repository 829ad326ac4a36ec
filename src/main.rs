// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;
mod tracing_setup;

use crate::config::{BotConfig, CONFIG_PATH};
use crate::core::custom_commands::CustomCommandService;
use crate::core::guilds::GuildService;
use crate::core::leveling::LevelingService;
use crate::core::pipeline::MessagePipeline;
use crate::core::playlists::PlaylistService;
use crate::discord::{Data, Error};
use crate::infra::sqlite::SqliteStore;
use poise::serenity_prelude as serenity;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = BotConfig::load(CONFIG_PATH)
        .expect("Invalid configuration! DISCORD_TOKEN and DATABASE_URL must be set.");

    // Keep the guard alive for the whole process so file logs get flushed.
    let _log_guard = tracing_setup::install_tracing(&config.logging);
    if !Path::new(CONFIG_PATH).exists() {
        tracing::warn!("{CONFIG_PATH} not found, using default settings");
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One store backs every service. This is the "composition root" where we
    // wire everything together.

    let store = Arc::new(
        SqliteStore::connect(&config.database_url, config.store_timeout())
            .await
            .expect("Failed to connect to the database"),
    );

    let leveling = Arc::new(LevelingService::new(Arc::clone(&store)));
    let custom_commands = Arc::new(CustomCommandService::new(Arc::clone(&store)));
    let pipeline = Arc::new(MessagePipeline::new(
        Arc::clone(&leveling),
        Arc::clone(&custom_commands),
        config.pipeline_settings(),
    ));

    let token = config.discord_token.clone();
    let dev_guild = config.dev_guild_id.map(serenity::GuildId::new);

    let data = Data {
        guilds: Arc::new(GuildService::new(Arc::clone(&store))),
        leveling,
        custom_commands,
        playlists: Arc::new(PlaylistService::new(Arc::clone(&store))),
        pipeline,
        config: Arc::new(config),
    };

    // MESSAGE_CONTENT is privileged and has to be enabled in the developer
    // portal, otherwise custom commands never match.
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::<Data, Error>::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(discord::events::dispatch(ctx, event, framework, data))
            },
            on_error: discord::error_handler::on_error,
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::debug!(
                        command = %ctx.command().qualified_name,
                        user_id = ctx.author().id.get(),
                        "Received command"
                    );
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                match dev_guild {
                    // Guild registration shows up instantly, global can take an hour.
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(ctx, commands, guild_id).await?;
                        tracing::info!(guild_id = guild_id.get(), "Commands registered in dev guild");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, commands).await?;
                        tracing::info!("Commands registered globally");
                    }
                }
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
