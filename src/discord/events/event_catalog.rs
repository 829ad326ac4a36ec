// Event handlers for non-command Discord events.
// `dispatch` is the single entry point registered with poise.

use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub mod guild;
pub mod member;
pub mod message;

pub async fn dispatch(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(
                user = %data_about_bot.user.name,
                guilds = data_about_bot.guilds.len(),
                "Bot is ready"
            );
            let activity = serenity::ActivityData::watching(data.config.presence.as_str());
            ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
        }
        serenity::FullEvent::Message { new_message } => {
            message::handle_message(ctx, data, new_message).await?;
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            guild::handle_guild_create(data, guild).await?;
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            member::handle_member_join(ctx, data, new_member).await?;
        }
        serenity::FullEvent::GuildMemberRemoval {
            guild_id,
            user,
            member_data_if_available,
        } => {
            member::handle_member_leave(
                ctx,
                data,
                *guild_id,
                user,
                member_data_if_available.as_ref(),
            )
            .await?;
        }
        _ => {}
    }
    Ok(())
}
