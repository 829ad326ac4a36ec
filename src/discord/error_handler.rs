// Framework error hook.
//
// User mistakes (missing permissions, wrong channel type, bad arguments) get
// an ephemeral explanation and a debug log. Anything else is a bug: it is
// logged as an error and the user sees a generic message.

use super::{Context, Data, Error};
use poise::{BoxFuture, CreateReply, FrameworkError};
use tracing::{debug, error};

pub fn on_error(err: FrameworkError<'_, Data, Error>) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        match err {
            FrameworkError::Setup { error, .. } => error!("Error during startup: {error}"),
            FrameworkError::EventHandler { error, event, .. } => {
                error!(event = event.snake_case_name(), "Error while handling event: {error}")
            }
            FrameworkError::Command { error, ctx, .. } => {
                error!(command = %ctx.command().qualified_name, "Command failed: {error}");
                ephemeral_reply(&ctx, "Something went wrong while running that command.").await;
            }
            FrameworkError::CommandPanic { payload, ctx, .. } => {
                error!(
                    command = %ctx.command().qualified_name,
                    "Command panicked: {}",
                    payload.as_deref().unwrap_or("no payload")
                );
                ephemeral_reply(&ctx, "Something went badly wrong while running that command.")
                    .await;
            }
            FrameworkError::ArgumentParse { error, ctx, .. } => {
                debug!("Bad arguments for {}: {error}", ctx.command().qualified_name);
                ephemeral_reply(&ctx, format!("Invalid arguments: {error}")).await;
            }
            FrameworkError::MissingUserPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let reply = match missing_permissions {
                    Some(perms) => format!("You need the {perms} permission to use this."),
                    None => "You lack the permissions to use this.".to_string(),
                };
                ephemeral_reply(&ctx, reply).await;
            }
            FrameworkError::MissingBotPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                ephemeral_reply(
                    &ctx,
                    format!("I need the {missing_permissions} permission to do that."),
                )
                .await;
            }
            FrameworkError::GuildOnly { ctx, .. } => {
                ephemeral_reply(&ctx, "This command only works in servers.").await;
            }
            FrameworkError::SubcommandRequired { ctx, .. } => {
                let subcommands: Vec<&str> = ctx
                    .command()
                    .subcommands
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect();
                ephemeral_reply(
                    &ctx,
                    format!("Pick a subcommand: {}", subcommands.join(", ")),
                )
                .await;
            }
            other => {
                if let Err(e) = poise::builtins::on_error(other).await {
                    error!("Error while handling framework error: {e}");
                }
            }
        }
    })
}

async fn ephemeral_reply(ctx: &Context<'_>, content: impl Into<String>) {
    let reply = CreateReply::default().ephemeral(true).content(content);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send ephemeral reply: {e}");
    }
}
