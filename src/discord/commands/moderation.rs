// Moderation commands: kick, ban (with confirmation) and bulk message
// clearing. Discord enforces role hierarchy; refusals come back as HTTP
// errors and are reported to the invoker.

use crate::discord::{Context, Data, Error};
use poise::serenity_prelude as serenity;
use std::time::Duration;

/// Messages older than this cannot be bulk deleted.
const BULK_DELETE_MAX_AGE_DAYS: i64 = 14;

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![kick(), ban(), clear()]
}

/// Kick a member from the server.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "KICK_MEMBERS"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::User,
    #[description = "Reason for the kick"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    if let Some(refusal) = check_target(&ctx, &member) {
        reply_error(&ctx, refusal).await?;
        return Ok(());
    }

    let reason = reason.unwrap_or_else(|| "No reason given".to_string());
    let audit_reason = format!("{reason} - By: {}", ctx.author().name);

    if let Err(e) = guild_id
        .kick_with_reason(&ctx, member.id, &audit_reason)
        .await
    {
        tracing::warn!(guild_id = guild_id.get(), user_id = member.id.get(), "Kick failed: {e}");
        reply_error(&ctx, "Couldn't kick that member. Check my role and permissions.").await?;
        return Ok(());
    }

    tracing::info!(guild_id = guild_id.get(), user_id = member.id.get(), "Member kicked");
    let embed = serenity::CreateEmbed::new()
        .title("👢 Member Kicked")
        .description(format!("<@{}> was kicked from the server.", member.id))
        .field("Reason", reason, false)
        .field("By", format!("<@{}>", ctx.author().id), false)
        .color(0xe67e22)
        .timestamp(serenity::Timestamp::now());
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Ban a member from the server.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] member: serenity::User,
    #[description = "Reason for the ban"] reason: Option<String>,
    #[description = "Days of messages to delete (0-7)"] days: Option<i64>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    if let Some(refusal) = check_target(&ctx, &member) {
        reply_error(&ctx, refusal).await?;
        return Ok(());
    }

    let days = delete_message_days(days);
    let reason = reason.unwrap_or_else(|| "No reason given".to_string());

    let confirm_id = ban_button_id(ctx.id(), "confirm");
    let cancel_id = ban_button_id(ctx.id(), "cancel");
    let prompt = serenity::CreateEmbed::new()
        .title("⚠️ Confirm Ban")
        .description(format!("You are about to ban <@{}> from the server.", member.id))
        .field("Reason", &reason, false)
        .field("Days of messages to delete", days.to_string(), false)
        .color(0xf1c40f);
    let buttons = vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(&confirm_id)
            .label("Confirm")
            .emoji('✅')
            .style(serenity::ButtonStyle::Danger),
        serenity::CreateButton::new(&cancel_id)
            .label("Cancel")
            .emoji('❌')
            .style(serenity::ButtonStyle::Secondary),
    ])];

    let reply = ctx
        .send(poise::CreateReply::default().embed(prompt).components(buttons))
        .await?;

    let invoker = ctx.author().id;
    let ctx_id = ctx.id();
    while let Some(mci) = serenity::ComponentInteractionCollector::new(ctx)
        .channel_id(ctx.channel_id())
        .timeout(Duration::from_secs(60))
        .filter(move |mci| is_ban_button(&mci.data.custom_id, ctx_id))
        .await
    {
        if mci.user.id != invoker {
            let response = serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content("Only the person who ran the command can answer this.")
                    .ephemeral(true),
            );
            mci.create_response(&ctx, response).await?;
            continue;
        }

        let embed = if mci.data.custom_id == confirm_id {
            let audit_reason = format!("{reason} - By: {}", ctx.author().name);
            match guild_id
                .ban_with_reason(&ctx, member.id, days, &audit_reason)
                .await
            {
                Ok(()) => {
                    tracing::info!(guild_id = guild_id.get(), user_id = member.id.get(), days, "Member banned");
                    serenity::CreateEmbed::new()
                        .title("🔨 Member Banned")
                        .description(format!("<@{}> was banned from the server.", member.id))
                        .field("Reason", &reason, false)
                        .field("By", format!("<@{}>", invoker), false)
                        .field("Days of messages deleted", days.to_string(), false)
                        .color(0xe74c3c)
                        .timestamp(serenity::Timestamp::now())
                }
                Err(e) => {
                    tracing::warn!(guild_id = guild_id.get(), user_id = member.id.get(), "Ban failed: {e}");
                    serenity::CreateEmbed::new()
                        .title("❌ Error")
                        .description("Couldn't ban that member. Check my role and permissions.")
                        .color(0xe74c3c)
                }
            }
        } else {
            serenity::CreateEmbed::new()
                .title("🚫 Ban Cancelled")
                .description(format!("The ban of <@{}> was cancelled.", member.id))
                .color(0x2ecc71)
        };

        let update = serenity::CreateInteractionResponse::UpdateMessage(
            serenity::CreateInteractionResponseMessage::new()
                .embed(embed)
                .components(vec![]),
        );
        mci.create_response(&ctx, update).await?;
        return Ok(());
    }

    // Nobody answered in time.
    reply
        .edit(
            ctx,
            poise::CreateReply::default()
                .content("Ban confirmation expired.")
                .components(vec![]),
        )
        .await?;
    Ok(())
}

/// Delete recent messages in this channel.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES",
    required_bot_permissions = "MANAGE_MESSAGES"
)]
pub async fn clear(
    ctx: Context<'_>,
    #[description = "Number of messages to delete (1-100)"] amount: i64,
    #[description = "Only delete messages from this user"] user: Option<serenity::User>,
) -> Result<(), Error> {
    if !(1..=100).contains(&amount) {
        reply_error(&ctx, "The amount must be between 1 and 100 messages.").await?;
        return Ok(());
    }
    ctx.defer_ephemeral().await?;

    let channel_id = ctx.channel_id();
    let messages = channel_id
        .messages(&ctx, serenity::GetMessages::new().limit(100))
        .await?;

    let cutoff = chrono::Utc::now() - chrono::Duration::days(BULK_DELETE_MAX_AGE_DAYS);
    let ids: Vec<serenity::MessageId> = messages
        .iter()
        .filter(|m| user.as_ref().map_or(true, |u| m.author.id == u.id))
        .filter(|m| m.timestamp.unix_timestamp() > cutoff.timestamp())
        .take(amount as usize)
        .map(|m| m.id)
        .collect();

    match ids.as_slice() {
        [] => {}
        [single] => channel_id.delete_message(&ctx, *single).await?,
        many => channel_id.delete_messages(&ctx, many).await?,
    }

    tracing::info!(channel_id = channel_id.get(), deleted = ids.len(), "Messages cleared");
    ctx.send(
        poise::CreateReply::default()
            .content(format!("🧹 Deleted {} messages.", ids.len()))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Discord accepts 0-7 days of message deletion on ban; default one day.
fn ban_button_id(invocation_id: u64, action: &str) -> String {
    format!("{invocation_id}-ban-{action}")
}

/// Buttons are tied to the invocation that created them.
fn is_ban_button(custom_id: &str, invocation_id: u64) -> bool {
    custom_id
        .strip_prefix(&invocation_id.to_string())
        .is_some_and(|rest| rest.starts_with("-ban-"))
}

pub fn delete_message_days(days: Option<i64>) -> u8 {
    days.unwrap_or(1).clamp(0, 7) as u8
}

fn check_target(ctx: &Context<'_>, target: &serenity::User) -> Option<&'static str> {
    if target.id == ctx.author().id {
        return Some("You can't do that to yourself.");
    }
    if target.id == ctx.framework().bot_id {
        return Some("I can't do that to myself.");
    }
    let owner_id = ctx.guild().map(|g| g.owner_id);
    if owner_id == Some(target.id) {
        return Some("The server owner can't be targeted.");
    }
    None
}

async fn reply_error(ctx: &Context<'_>, message: &str) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("❌ Error")
        .description(message)
        .color(0xe74c3c);
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
