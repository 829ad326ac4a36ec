// Saved playlists. Songs are stored as title + URL; nothing is played.

use crate::core::playlists::{PlaylistError, MAX_PLAYLIST_SIZE};
use crate::discord::{Context, Data, Error};
use poise::serenity_prelude as serenity;

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![playlist()]
}

/// Manage saved playlists.
#[poise::command(
    slash_command,
    subcommands("create", "list", "show", "add"),
    subcommand_required,
    guild_only
)]
pub async fn playlist(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create an empty playlist.
#[poise::command(slash_command, guild_only)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Playlist name"]
    #[max_length = 100]
    name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();

    match ctx
        .data()
        .playlists
        .create(guild_id, &name, ctx.author().id.get())
        .await
    {
        Ok(id) => {
            ctx.say(format!("🎶 Created playlist **{}** (id `{id}`).", name.trim()))
                .await?;
        }
        Err(err) => return user_facing(ctx, err).await,
    }
    Ok(())
}

/// List this server's playlists.
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let playlists = ctx.data().playlists.list(guild_id).await?;

    if playlists.is_empty() {
        ctx.say("No playlists yet. Create one with `/playlist create`.")
            .await?;
        return Ok(());
    }

    let description = playlists
        .iter()
        .map(|p| {
            format!(
                "`{}` **{}** ({}/{} songs) by <@{}>",
                p.id,
                p.name,
                p.songs.len(),
                MAX_PLAYLIST_SIZE,
                p.created_by
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("🎶 Playlists")
        .description(description)
        .color(0x1abc9c);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the songs of a playlist.
#[poise::command(slash_command, guild_only)]
pub async fn show(
    ctx: Context<'_>,
    #[description = "Playlist id"] id: i64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let playlist = match ctx.data().playlists.get(guild_id, id).await {
        Ok(playlist) => playlist,
        Err(err) => return user_facing(ctx, err).await,
    };

    let description = if playlist.songs.is_empty() {
        "This playlist is empty.".to_string()
    } else {
        playlist
            .songs
            .iter()
            .enumerate()
            .map(|(i, song)| format!("{}. [{}]({})", i + 1, song.title, song.url))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("🎶 {}", playlist.name))
        .description(description)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "{}/{} songs",
            playlist.songs.len(),
            MAX_PLAYLIST_SIZE
        )))
        .color(0x1abc9c);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Add a song to a playlist.
#[poise::command(slash_command, guild_only)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Playlist id"] id: i64,
    #[description = "Song title"]
    #[max_length = 200]
    title: String,
    #[description = "Link to the song"] url: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();

    match ctx
        .data()
        .playlists
        .add_song(guild_id, id, &title, &url, ctx.author().id.get())
        .await
    {
        Ok(playlist) => {
            ctx.say(format!(
                "➕ Added **{}** to **{}** ({}/{}).",
                title.trim(),
                playlist.name,
                playlist.songs.len(),
                MAX_PLAYLIST_SIZE
            ))
            .await?;
        }
        Err(err) => return user_facing(ctx, err).await,
    }
    Ok(())
}

/// Tell the user about expected failures; bubble store errors up.
async fn user_facing(ctx: Context<'_>, err: PlaylistError) -> Result<(), Error> {
    match err {
        PlaylistError::Store(_) => Err(err.into()),
        expected => {
            ctx.send(
                poise::CreateReply::default()
                    .content(expected.to_string())
                    .ephemeral(true),
            )
            .await?;
            Ok(())
        }
    }
}
