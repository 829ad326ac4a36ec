// Discord commands for the leveling system.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use crate::core::leveling::{LevelingService, Member, XP_PER_LEVEL};
use crate::discord::{Context, Data, Error};
use crate::infra::sqlite::SqliteStore;
use poise::serenity_prelude as serenity;
use std::time::Duration;

/// Rows shown on one leaderboard page.
const PER_PAGE: usize = 10;
/// How many members the leaderboard loads at once.
const LEADERBOARD_DEPTH: usize = 100;

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![level(), leaderboard()]
}

/// Show your current level and XP.
#[poise::command(slash_command, guild_only)]
pub async fn level(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    if target_user.bot {
        ctx.say("Bots don't earn XP! 🤖").await?;
        return Ok(());
    }

    let Some(member) = ctx
        .data()
        .leveling
        .get_member(guild_id, target_user.id.get())
        .await?
    else {
        ctx.say(format!(
            "{} hasn't earned any XP yet. Start chatting! 💬",
            target_user.name
        ))
        .await?;
        return Ok(());
    };

    let (xp_progress, level_span) = level_progress(&member);
    let embed = serenity::CreateEmbed::new()
        .title(format!("Level of {}", target_user.name))
        .color(0x00ff00)
        .thumbnail(target_user.face())
        .field("Level", format!("**{}**", member.level), true)
        .field("Total XP", format!("**{}**", member.xp), true)
        .field("Messages", member.messages_count.to_string(), true)
        .field(
            "Last active",
            format!("<t:{}:R>", member.last_message_time.timestamp()),
            true,
        )
        .field(
            "Member since",
            format!("<t:{}:d>", member.joined_at.timestamp()),
            true,
        )
        .field(
            "Progress",
            format!(
                "{}/{} XP\n{}",
                xp_progress,
                level_span,
                build_progress_bar(xp_progress as f64 / level_span as f64, 15)
            ),
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the server's most active members.
#[poise::command(slash_command, guild_only)]
pub async fn leaderboard(
    ctx: Context<'_>,
    #[description = "Page number (default: 1)"]
    #[min = 1]
    page: Option<usize>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let members = ctx
        .data()
        .leveling
        .leaderboard(guild_id, LEADERBOARD_DEPTH)
        .await?;

    if members.is_empty() {
        ctx.say("No one has earned XP yet! Start chatting to get on the leaderboard! 💬")
            .await?;
        return Ok(());
    }

    let total_pages = members.len().div_ceil(PER_PAGE);
    let mut current_page = page.unwrap_or(1).clamp(1, total_pages);
    let author_id = ctx.author().id.get();

    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(leaderboard_embed(&ctx, &members, current_page, total_pages))
                .components(page_buttons(current_page, total_pages)),
        )
        .await?;
    let msg_id = reply.message().await?.id;

    while let Some(mci) = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(Duration::from_secs(120))
        .filter(move |mci| mci.message.id == msg_id)
        .await
    {
        match mci.data.custom_id.as_str() {
            "prev" => current_page = current_page.saturating_sub(1).max(1),
            "next" => current_page = (current_page + 1).min(total_pages),
            "find_me" => match members.iter().position(|m| m.user_id == author_id) {
                Some(index) => current_page = index / PER_PAGE + 1,
                None => {
                    let response = serenity::CreateInteractionResponse::Message(
                        serenity::CreateInteractionResponseMessage::new()
                            .content("You are not on the leaderboard yet!")
                            .ephemeral(true),
                    );
                    if let Err(e) = mci.create_response(&ctx, response).await {
                        tracing::warn!("Failed to answer leaderboard button: {e}");
                    }
                    continue;
                }
            },
            _ => continue,
        }

        let update = serenity::CreateInteractionResponse::UpdateMessage(
            serenity::CreateInteractionResponseMessage::new()
                .embed(leaderboard_embed(&ctx, &members, current_page, total_pages))
                .components(page_buttons(current_page, total_pages)),
        );
        if let Err(e) = mci.create_response(&ctx, update).await {
            tracing::warn!("Failed to update leaderboard page: {e}");
        }
    }

    Ok(())
}

fn leaderboard_embed(
    ctx: &Context<'_>,
    members: &[Member],
    page: usize,
    total_pages: usize,
) -> serenity::CreateEmbed {
    let offset = (page - 1) * PER_PAGE;
    let author_id = ctx.author().id.get();
    let mut description = String::new();

    for (index, member) in members.iter().skip(offset).take(PER_PAGE).enumerate() {
        let rank = offset + index + 1;
        let medal = match rank {
            1 => "🥇",
            2 => "🥈",
            3 => "🥉",
            _ => "▫️",
        };
        let name = if member.user_id == author_id {
            format!("**<@{}>** (You)", member.user_id)
        } else {
            format!("<@{}>", member.user_id)
        };
        description.push_str(&format!(
            "{} **#{}** {}\nLevel {} | {} XP\n",
            medal, rank, name, member.level, member.xp
        ));
    }

    serenity::CreateEmbed::new()
        .title("📊 Leaderboard")
        .description(description)
        .color(0xffd700)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Page {page}/{total_pages}"
        )))
}

fn page_buttons(page: usize, total_pages: usize) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new("prev")
            .label("◀ Previous")
            .style(serenity::ButtonStyle::Primary)
            .disabled(page == 1),
        serenity::CreateButton::new("next")
            .label("Next ▶")
            .style(serenity::ButtonStyle::Primary)
            .disabled(page == total_pages),
        serenity::CreateButton::new("find_me")
            .label("🔍 Find Me")
            .style(serenity::ButtonStyle::Secondary),
    ])]
}

/// XP earned inside the current level and the size of a level.
fn level_progress(member: &Member) -> (u64, u64) {
    let floor = LevelingService::<SqliteStore>::xp_for_level(member.level);
    (member.xp.saturating_sub(floor).min(XP_PER_LEVEL), XP_PER_LEVEL)
}

fn build_progress_bar(progress: f64, length: usize) -> String {
    let clamped = progress.clamp(0.0, 1.0);
    let mut filled = (clamped * length as f64).round() as usize;
    if clamped > 0.0 && filled == 0 {
        filled = 1;
    }
    let filled = filled.min(length);
    format!(
        "{}{} ({}%)",
        "▰".repeat(filled),
        "▱".repeat(length - filled),
        (clamped * 100.0).round() as u32
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(xp: u64, level: u32) -> Member {
        Member {
            guild_id: 1,
            user_id: 2,
            xp,
            level,
            messages_count: 1,
            last_message_time: Utc::now(),
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn progress_is_measured_inside_the_level() {
        assert_eq!(level_progress(&member(0, 0)), (0, 100));
        assert_eq!(level_progress(&member(150, 1)), (50, 100));
        assert_eq!(level_progress(&member(299, 2)), (99, 100));
    }

    #[test]
    fn progress_bar_shows_any_progress() {
        assert_eq!(build_progress_bar(0.0, 4), "▱▱▱▱ (0%)");
        assert_eq!(build_progress_bar(0.01, 4), "▰▱▱▱ (1%)");
        assert_eq!(build_progress_bar(1.5, 4), "▰▰▰▰ (100%)");
    }
}
