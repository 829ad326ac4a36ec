// Management of guild-defined text commands. Invocation happens in the
// message pipeline, not here.

use crate::core::custom_commands::{normalize_name, CustomCommandError};
use crate::discord::{Context, Data, Error};
use poise::serenity_prelude as serenity;

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![customcommand()]
}

/// Manage this server's custom commands.
#[poise::command(
    slash_command,
    subcommands("add", "list", "remove"),
    subcommand_required,
    required_permissions = "MANAGE_GUILD",
    guild_only
)]
pub async fn customcommand(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create a custom command.
#[poise::command(slash_command, guild_only)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Command name (without the prefix)"] name: String,
    #[description = "What the bot replies with"] response: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let prefix = ctx.data().pipeline.prefix();
    let name = strip_prefix(&name, prefix);

    match ctx
        .data()
        .custom_commands
        .create(guild_id, name, &response, ctx.author().id.get())
        .await
    {
        Ok(true) => {
            tracing::info!(guild_id, name, "Custom command created");
            ctx.say(format!("✅ Created {}.", command_label(prefix, name)))
                .await?;
        }
        Ok(false) => {
            ctx.say(format!(
                "A command named {} already exists.",
                command_label(prefix, name)
            ))
            .await?;
        }
        Err(err @ (CustomCommandError::InvalidName | CustomCommandError::InvalidResponse)) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(err.to_string())
                    .ephemeral(true),
            )
            .await?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

/// List the custom commands of this server.
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let commands = ctx.data().custom_commands.list(guild_id).await?;

    if commands.is_empty() {
        ctx.say("This server has no custom commands yet.").await?;
        return Ok(());
    }

    let prefix = ctx.data().pipeline.prefix();
    let description = commands
        .iter()
        .map(|c| format!("`{prefix}{}` by <@{}>, used {} times", c.name, c.created_by, c.uses))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("📝 Custom commands")
        .description(description)
        .color(0x9b59b6);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Delete a custom command.
#[poise::command(slash_command, guild_only)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Command name"] name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let data = ctx.data();
    let prefix = data.pipeline.prefix();
    let name = strip_prefix(&name, prefix);

    if data.custom_commands.remove(guild_id, name).await? {
        data.pipeline.forget_command(guild_id, name);
        tracing::info!(guild_id, name, "Custom command removed");
        ctx.say(format!("🗑️ Removed {}.", command_label(prefix, name)))
            .await?;
    } else {
        ctx.say(format!("No command named {} exists.", command_label(prefix, name)))
            .await?;
    }
    Ok(())
}

/// Users often type the prefix along with the name.
fn strip_prefix<'a>(name: &'a str, prefix: &str) -> &'a str {
    let name = name.trim();
    name.strip_prefix(prefix).unwrap_or(name)
}

/// How a command is shown back to users: prefixed and normalized, the way
/// it has to be typed.
fn command_label(prefix: &str, name: &str) -> String {
    format!("`{prefix}{}`", normalize_name(name))
}
