// Per-guild settings. Every subcommand makes sure the guild record exists
// first, then applies a partial update.

use crate::core::guilds::{Guild, GuildSettings};
use crate::discord::{Context, Data, Error};
use poise::serenity_prelude as serenity;

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![settings()]
}

/// View or change this server's bot settings.
#[poise::command(
    slash_command,
    subcommands(
        "show",
        "prefix",
        "welcome_channel",
        "welcome_message",
        "log_channel",
        "music_channel"
    ),
    subcommand_required,
    required_permissions = "ADMINISTRATOR",
    guild_only
)]
pub async fn settings(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current settings.
#[poise::command(slash_command, guild_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild = current_guild(&ctx).await?;

    let embed = serenity::CreateEmbed::new()
        .title(format!("⚙️ Settings for {}", guild.name))
        .field("Prefix", format!("`{}`", guild.prefix), true)
        .field("Welcome channel", channel_mention(guild.welcome_channel_id), true)
        .field("Log channel", channel_mention(guild.log_channel_id), true)
        .field("Music channel", channel_mention(guild.music_channel_id), true)
        .field(
            "Welcome message",
            guild
                .welcome_message
                .clone()
                .unwrap_or_else(|| "Default".to_string()),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Placeholders for the welcome message: {user}, {server}",
        ))
        .color(0x95a5a6);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Change the server's prefix.
#[poise::command(slash_command, guild_only)]
pub async fn prefix(
    ctx: Context<'_>,
    #[description = "New prefix (max 5 characters)"]
    #[max_length = 5]
    prefix: String,
) -> Result<(), Error> {
    let prefix = prefix.trim();
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        ctx.say("The prefix can't be empty or contain spaces.").await?;
        return Ok(());
    }

    apply(&ctx, GuildSettings::default().prefix(prefix)).await?;
    ctx.say(format!("✅ Prefix set to `{prefix}`.")).await?;
    Ok(())
}

/// Set or clear the channel new members are welcomed in.
#[poise::command(slash_command, guild_only)]
pub async fn welcome_channel(
    ctx: Context<'_>,
    #[description = "Channel (leave empty to disable)"]
    #[channel_types("Text")]
    channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let channel_id = channel.map(|c| c.id.get());
    apply(&ctx, GuildSettings::default().welcome_channel(channel_id)).await?;
    ctx.say(changed_channel("Welcome channel", channel_id)).await?;
    Ok(())
}

/// Set or reset the welcome message template.
#[poise::command(slash_command, guild_only)]
pub async fn welcome_message(
    ctx: Context<'_>,
    #[description = "Message with {user} and {server} placeholders (empty for the default)"]
    #[max_length = 1500]
    message: Option<String>,
) -> Result<(), Error> {
    let message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    let reply = match &message {
        Some(template) => format!("✅ Welcome message set to:\n{template}"),
        None => "✅ Welcome message reset to the default.".to_string(),
    };

    apply(&ctx, GuildSettings::default().welcome_message(message)).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Set or clear the channel member departures are logged in.
#[poise::command(slash_command, guild_only)]
pub async fn log_channel(
    ctx: Context<'_>,
    #[description = "Channel (leave empty to disable)"]
    #[channel_types("Text")]
    channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let channel_id = channel.map(|c| c.id.get());
    apply(&ctx, GuildSettings::default().log_channel(channel_id)).await?;
    ctx.say(changed_channel("Log channel", channel_id)).await?;
    Ok(())
}

/// Set or clear the channel reserved for music.
#[poise::command(slash_command, guild_only)]
pub async fn music_channel(
    ctx: Context<'_>,
    #[description = "Channel (leave empty to disable)"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let channel_id = channel.map(|c| c.id.get());
    apply(&ctx, GuildSettings::default().music_channel(channel_id)).await?;
    ctx.say(changed_channel("Music channel", channel_id)).await?;
    Ok(())
}

async fn current_guild(ctx: &Context<'_>) -> Result<Guild, Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let name = ctx
        .guild()
        .map(|g| g.name.clone())
        .unwrap_or_else(|| guild_id.to_string());

    Ok(ctx
        .data()
        .guilds
        .get_or_create_guild(guild_id.get(), &name)
        .await?)
}

async fn apply(ctx: &Context<'_>, settings: GuildSettings) -> Result<(), Error> {
    let guild = current_guild(ctx).await?;
    if !ctx.data().guilds.update_guild(guild.guild_id, settings).await? {
        return Err(format!("settings update for guild {} changed nothing", guild.guild_id).into());
    }
    tracing::info!(guild_id = guild.guild_id, user_id = ctx.author().id.get(), "Guild settings updated");
    Ok(())
}

fn channel_mention(channel_id: Option<u64>) -> String {
    channel_id
        .map(|id| format!("<#{id}>"))
        .unwrap_or_else(|| "Not set".to_string())
}

fn changed_channel(label: &str, channel_id: Option<u64>) -> String {
    match channel_id {
        Some(id) => format!("✅ {label} set to <#{id}>."),
        None => format!("✅ {label} disabled."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_text() {
        assert_eq!(channel_mention(Some(5)), "<#5>");
        assert_eq!(channel_mention(None), "Not set");
        assert_eq!(changed_channel("Log channel", None), "✅ Log channel disabled.");
    }
}
