use std::num::NonZeroU64;

use serenity::all::{Mentionable, User, UserId};
use tracing::debug;

use crate::ledger::Account;
use crate::utils::embeds;
use crate::Context;

type Error = crate::error::Error;

/// Shown in the leaderboard for users who can't be found in the guild.
pub const UNKNOWN_MEMBER: &str = "*someone who left*";

/// Give <recipient> some delicious cookies.
#[poise::command(slash_command, prefix_command)]
pub async fn pay(
    ctx: Context<'_>,
    #[description = "Who gets the cookies"] recipient: User,
    #[description = "How many cookies to send"] amount: i64,
) -> Result<(), Error> {
    let sender = ctx.author();
    let transfer = ctx
        .data()
        .ledger
        .transfer(sender.id.get(), recipient.id.get(), amount)
        .await?;

    let embed = embeds::success_embed()
        .title("Cookies sent!")
        .description(format!(
            "{} gave {} {} {}",
            sender.mention(),
            recipient.mention(),
            amount,
            cookie_noun(amount)
        ))
        .field(
            format!("{}'s jar", sender.name),
            format!("{} \u{2192} {}", transfer.sender.before, transfer.sender.after),
            true,
        )
        .field(
            format!("{}'s jar", recipient.name),
            format!(
                "{} \u{2192} {}",
                transfer.recipient.before, transfer.recipient.after
            ),
            true,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Count the cookies in <user>'s jar.
#[poise::command(slash_command, prefix_command, aliases("bal", "state", "show"))]
pub async fn balance(
    ctx: Context<'_>,
    #[description = "Whose cookies to count (defaults to you)"] user: Option<User>,
) -> Result<(), Error> {
    let user = user.as_ref().unwrap_or_else(|| ctx.author());
    let balance = ctx.data().ledger.balance(user.id.get()).await?;

    let embed = embeds::cookie_embed()
        .title("Cookie jar")
        .description(format!(
            "{} has {} {}",
            user.mention(),
            balance,
            cookie_noun(balance)
        ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// List of global cookie counts.
#[poise::command(
    slash_command,
    prefix_command,
    aliases("best", "sum", "summary", "global")
)]
pub async fn top(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let accounts = data.ledger.leaderboard().await?;

    let mut rows = Vec::with_capacity(data.config.leaderboard_size);
    for account in podium(&accounts, data.config.leaderboard_size) {
        let name = display_name(ctx, account.user_id).await;
        rows.push((name, account.balance));
    }

    let embed = embeds::cookie_embed()
        .title("Cookie leaderboard")
        .description(render_leaderboard(&rows));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Resolve a member's guild display name, falling back to [`UNKNOWN_MEMBER`].
async fn display_name(ctx: Context<'_>, user_id: u64) -> String {
    let (Some(guild_id), Some(user_id)) = (ctx.guild_id(), NonZeroU64::new(user_id)) else {
        return UNKNOWN_MEMBER.to_string();
    };
    let user_id = UserId::from(user_id);

    match guild_id.member(ctx.serenity_context(), user_id).await {
        Ok(member) => member.display_name().to_string(),
        Err(why) => {
            debug!(user_id = %user_id, error = %why, "Could not resolve leaderboard member");
            UNKNOWN_MEMBER.to_string()
        }
    }
}

/// The `size` richest accounts, richest first, from a poorest-first leaderboard.
pub fn podium(accounts: &[Account], size: usize) -> Vec<Account> {
    accounts.iter().rev().take(size).copied().collect()
}

/// Render `(name, balance)` rows, already in display order.
pub fn render_leaderboard(rows: &[(String, i64)]) -> String {
    if rows.is_empty() {
        return "Nobody has any cookies yet.".to_string();
    }

    rows.iter()
        .enumerate()
        .map(|(i, (name, balance))| {
            format!("**{}.** {} \u{00B7} {} {}", i + 1, name, balance, cookie_noun(*balance))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn cookie_noun(count: i64) -> &'static str {
    if count == 1 || count == -1 {
        "cookie"
    } else {
        "cookies"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(user_id: u64, balance: i64) -> Account {
        Account { user_id, balance }
    }

    #[test]
    fn podium_is_richest_first_and_truncated() {
        // Ledger order: B:10, A:50, C:100.
        let ledger_order = [account(2, 10), account(1, 50), account(3, 100)];

        assert_eq!(podium(&ledger_order, 2), vec![account(3, 100), account(1, 50)]);
        assert_eq!(
            podium(&ledger_order, 10),
            vec![account(3, 100), account(1, 50), account(2, 10)]
        );
        assert!(podium(&[], 5).is_empty());
    }

    #[test]
    fn empty_leaderboard() {
        assert_eq!(render_leaderboard(&[]), "Nobody has any cookies yet.");
    }

    #[test]
    fn leaderboard_rows_are_numbered_in_order() {
        let rows = vec![
            ("Carol".to_string(), 100),
            (UNKNOWN_MEMBER.to_string(), 1),
            ("Bob".to_string(), -3),
        ];

        let rendered = render_leaderboard(&rows);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines,
            vec![
                "**1.** Carol \u{00B7} 100 cookies",
                "**2.** *someone who left* \u{00B7} 1 cookie",
                "**3.** Bob \u{00B7} -3 cookies",
            ]
        );
    }

    #[test]
    fn noun_handles_extremes() {
        assert_eq!(cookie_noun(0), "cookies");
        assert_eq!(cookie_noun(-1), "cookie");
        assert_eq!(cookie_noun(i64::MIN), "cookies");
    }

    #[test]
    fn command_names_and_aliases() {
        let balance = balance();
        assert_eq!(balance.name, "balance");
        for alias in ["bal", "state", "show"] {
            assert!(balance.aliases.iter().any(|a| *a == alias), "missing {alias}");
        }

        let top = top();
        for alias in ["best", "sum", "summary", "global"] {
            assert!(top.aliases.iter().any(|a| *a == alias), "missing {alias}");
        }
    }
}
