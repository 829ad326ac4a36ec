use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Make sure every guild the bot sits in has a settings record.
pub async fn handle_guild_create(data: &Data, guild: &serenity::Guild) -> Result<(), Error> {
    data.guilds
        .get_or_create_guild(guild.id.get(), &guild.name)
        .await?;
    Ok(())
}
