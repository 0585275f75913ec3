use crate::{Context, Data};

type Error = crate::error::Error;

/// List all available commands.
#[poise::command(slash_command, prefix_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to get help for"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: "\u{1F36A} Cookie Bot \u{1F36A}",
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

/// One line per visible command, used when someone types a command that doesn't exist.
pub fn command_overview(commands: &[poise::Command<Data, Error>], prefix: &str) -> String {
    commands
        .iter()
        .filter(|command| !command.hide_in_help)
        .map(|command| {
            let mut line = format!("`{prefix}{}`", command.name);
            if let Some(description) = command.description.as_deref() {
                line.push_str(&format!(" \u{00B7} {description}"));
            }
            if !command.aliases.is_empty() {
                let aliases: Vec<String> =
                    command.aliases.iter().map(|alias| alias.to_string()).collect();
                line.push_str(&format!(" (also: {})", aliases.join(", ")));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
