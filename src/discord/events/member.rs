// Member join and leave notices, posted in the channels the guild configured.

use crate::core::guilds::{GuildService, WelcomeMessage};
use crate::discord::{Data, Error};
use crate::infra::sqlite::SqliteStore;
use poise::serenity_prelude::{self as serenity, Mentionable};

pub async fn handle_member_join(
    ctx: &serenity::Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<(), Error> {
    let guild_id = member.guild_id;
    tracing::info!(guild_id = guild_id.get(), user_id = member.user.id.get(), "Member joined");

    let Some(guild) = data.guilds.get_guild(guild_id.get()).await? else {
        return Ok(());
    };
    let Some(channel_id) = guild.welcome_channel_id else {
        return Ok(());
    };

    let (server_name, member_count) = ctx
        .cache
        .guild(guild_id)
        .map(|g| (g.name.clone(), g.member_count))
        .unwrap_or_else(|| (guild.name.clone(), 0));

    let channel = serenity::ChannelId::new(channel_id);
    let mention = member.mention().to_string();
    let message = match GuildService::<SqliteStore>::welcome_message(&guild, &mention, &server_name)
    {
        WelcomeMessage::Custom(text) => serenity::CreateMessage::new().content(text),
        WelcomeMessage::Default => {
            let mut description = format!("Hi {mention}, welcome to the server!");
            if member_count > 0 {
                description.push_str(&format!("\nWe are now {member_count} members!"));
            }
            let embed = serenity::CreateEmbed::new()
                .title(format!("Welcome to {server_name}!"))
                .description(description)
                .thumbnail(member.face())
                .color(0x2ecc71);
            serenity::CreateMessage::new().embed(embed)
        }
    };

    channel.send_message(ctx, message).await?;
    Ok(())
}

pub async fn handle_member_leave(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    member: Option<&serenity::Member>,
) -> Result<(), Error> {
    tracing::info!(guild_id = guild_id.get(), user_id = user.id.get(), "Member left");

    let Some(guild) = data.guilds.get_guild(guild_id.get()).await? else {
        return Ok(());
    };
    let Some(channel_id) = guild.log_channel_id else {
        return Ok(());
    };

    let joined = member
        .and_then(|m| m.joined_at)
        .map(|t| format!("<t:{}:d>", t.unix_timestamp()))
        .unwrap_or_else(|| "Unknown".to_string());

    let embed = serenity::CreateEmbed::new()
        .title("Member Left")
        .description(format!("{} left the server.", user.name))
        .field("ID", user.id.to_string(), true)
        .field("Joined", joined, true)
        .thumbnail(user.face())
        .color(0xe74c3c)
        .timestamp(serenity::Timestamp::now());

    serenity::ChannelId::new(channel_id)
        .send_message(ctx, serenity::CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}
