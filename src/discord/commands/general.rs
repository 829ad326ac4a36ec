// General purpose commands: help, info, ping and the feedback form.

use crate::discord::{Context, Data, Error};
use poise::serenity_prelude as serenity;
use poise::Modal;

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![help(), info(), ping(), feedback()]
}

/// Show the available commands.
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let mut lines = Vec::new();
    for command in &ctx.framework().options().commands {
        if command.subcommands.is_empty() {
            lines.push(format!(
                "`/{}` {}",
                command.name,
                command.description.as_deref().unwrap_or("")
            ));
        } else {
            let subcommands: Vec<&str> =
                command.subcommands.iter().map(|s| s.name.as_str()).collect();
            lines.push(format!(
                "`/{} <{}>` {}",
                command.name,
                subcommands.join("|"),
                command.description.as_deref().unwrap_or("")
            ));
        }
    }

    let prefix = ctx.data().pipeline.prefix();
    let embed = serenity::CreateEmbed::new()
        .title("📚 Help")
        .description(lines.join("\n"))
        .field(
            "Custom commands",
            format!("Type `{prefix}name` in chat to run a custom command of this server."),
            false,
        )
        .color(0x3498db);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Information about the bot.
#[poise::command(slash_command)]
pub async fn info(ctx: Context<'_>) -> Result<(), Error> {
    let bot = ctx.cache().current_user().clone();

    let embed = serenity::CreateEmbed::new()
        .title("ℹ️ Information")
        .description("A leveling and custom command bot for your server.")
        .field("Version", env!("CARGO_PKG_VERSION"), true)
        .field("Servers", ctx.cache().guild_count().to_string(), true)
        .thumbnail(bot.face())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Requested by {}",
            ctx.author().name
        )))
        .color(0x5865f2);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Latency bucket shown by `/ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyQuality {
    Excellent,
    Good,
    Poor,
}

impl LatencyQuality {
    pub fn from_millis(ms: u128) -> Self {
        match ms {
            0..=99 => LatencyQuality::Excellent,
            100..=199 => LatencyQuality::Good,
            _ => LatencyQuality::Poor,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LatencyQuality::Excellent => "Excellent",
            LatencyQuality::Good => "Good",
            LatencyQuality::Poor => "Poor",
        }
    }

    fn color(self) -> u32 {
        match self {
            LatencyQuality::Excellent => 0x2ecc71,
            LatencyQuality::Good => 0xf1c40f,
            LatencyQuality::Poor => 0xe74c3c,
        }
    }
}

/// Check the bot's latency.
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await.as_millis();
    let quality = LatencyQuality::from_millis(latency);

    let embed = serenity::CreateEmbed::new()
        .title("🏓 Pong!")
        .description(format!("**Latency:** {latency}ms ({})", quality.label()))
        .color(quality.color())
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[derive(Debug, Modal)]
#[name = "Bot Feedback"]
struct FeedbackModal {
    #[name = "Rating (1-5)"]
    #[placeholder = "Type a number from 1 to 5"]
    #[max_length = 1]
    rating: String,
    #[name = "Comment"]
    #[placeholder = "Tell us what you think of the bot..."]
    #[paragraph]
    comment: String,
}

/// A 1-5 star rating, `None` for anything else.
pub fn parse_rating(input: &str) -> Option<u8> {
    input
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|rating| (1..=5).contains(rating))
}

/// Send feedback about the bot.
#[poise::command(slash_command)]
pub async fn feedback(app_ctx: poise::ApplicationContext<'_, Data, Error>) -> Result<(), Error> {
    let Some(form) = FeedbackModal::execute(app_ctx).await? else {
        return Ok(());
    };
    let ctx = poise::Context::Application(app_ctx);

    let Some(rating) = parse_rating(&form.rating) else {
        ctx.send(
            poise::CreateReply::default()
                .content("Please give a rating between 1 and 5.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    tracing::info!(user_id = ctx.author().id.get(), rating, "Feedback received");

    let embed = serenity::CreateEmbed::new()
        .title("✅ Feedback Received")
        .description("Thanks for helping us improve!")
        .field("Rating", format!("{rating}/5 ⭐"), true)
        .field("Comment", form.comment, false)
        .color(0x2ecc71);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
