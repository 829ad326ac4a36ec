// Adapter between gateway messages and the core message pipeline.

use crate::core::pipeline::{InboundMessage, MessageOutcome};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;
use rand::seq::SliceRandom;
use std::future::Future;

const FLAVOR_LINES: [&str; 4] = [
    "Keep the streak going!",
    "Your grind is paying off.",
    "Another level, another flex.",
    "That XP bar never stood a chance.",
];

pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<(), Error> {
    let inbound = InboundMessage {
        author_id: message.author.id.get(),
        author_is_bot: message.author.bot,
        guild_id: message.guild_id.map(|id| id.get()),
        content: message.content.clone(),
    };

    let outcome = data.pipeline.process(&inbound).await;
    if outcome.is_empty() {
        return Ok(());
    }

    let channel_id = message.channel_id;
    deliver_outcome(outcome, inbound.author_id, |text| async move {
        channel_id.say(ctx, text).await.map(|_| ())
    })
    .await?;
    Ok(())
}

/// Send the level-up notice, then the command response. A failed notice is
/// logged and does not hold back the response.
async fn deliver_outcome<F, Fut, E>(
    outcome: MessageOutcome,
    user_id: u64,
    mut send: F,
) -> Result<(), E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    if let Some(level) = outcome.level_up {
        let notice = level_up_notice(user_id, level, random_flavor_line());
        if let Err(err) = send(notice).await {
            tracing::warn!(user_id, level, "Failed to send level-up notice: {err}");
        }
    }

    if let Some(response) = outcome.command_response {
        send(response).await?;
    }

    Ok(())
}

pub fn level_up_notice(user_id: u64, level: u32, flavor: &str) -> String {
    format!("🎉 Congratulations, <@{user_id}>! You reached **level {level}**! {flavor}")
}

fn random_flavor_line() -> &'static str {
    FLAVOR_LINES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FLAVOR_LINES[0])
}
