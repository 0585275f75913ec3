use crate::commands::general;
use crate::error::Error;
use crate::utils::embeds;
use crate::Data;
use serenity::all::CreateMessage;
use tracing::{error, info, warn};

/// Reply text for a command whose arguments could not be parsed.
pub fn argument_error_reason(input: Option<&str>, error: &dyn std::error::Error) -> String {
    match input {
        Some(input) => format!("Error: could not understand `{input}` ({error})"),
        None => format!("Error: {error}"),
    }
}

/// Framework error hook. Every failure ends in a reply to the user and a log
/// line; none of them take the bot down.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_rejection() {
                info!(
                    command = %ctx.command().name,
                    user = %ctx.author().id,
                    reason = %error,
                    "Command rejected"
                );
            } else {
                error!(
                    command = %ctx.command().name,
                    error = %error,
                    "Command error"
                );
            }

            let embed = embeds::error_embed()
                .title("No cookies this time")
                .description(error.user_message());
            if let Err(why) = ctx
                .send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await
            {
                warn!(error = %why, "Failed to send error reply");
            }
        }
        poise::FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            let reason = argument_error_reason(input.as_deref(), &*error);
            info!(command = %ctx.command().name, reason = %reason, "Bad command arguments");

            let embed = embeds::error_embed().title("Error").description(reason);
            if let Err(why) = ctx
                .send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await
            {
                warn!(error = %why, "Failed to send argument error");
            }
        }
        poise::FrameworkError::UnknownCommand {
            ctx,
            msg,
            prefix,
            framework,
            ..
        } => {
            let overview = general::command_overview(&framework.options().commands, prefix);
            let embed = embeds::cookie_embed()
                .title("Command Help")
                .description(overview);

            let message = CreateMessage::new().embed(embed);
            if let Err(why) = msg.channel_id.send_message(&ctx.http, message).await {
                warn!(error = %why, "Failed to send command overview");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!(error = %e, "Error handling error");
            }
        }
    }
}
