use crate::error::Error;
use crate::ledger::OverdraftPolicy;
use serenity::all::GuildId;

/// Upper bound for `LEADERBOARD_SIZE`. Each row costs a member lookup and
/// has to fit in one embed description.
pub const MAX_LEADERBOARD_SIZE: usize = 25;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub guild_id: Option<GuildId>,
    pub prefix: String,
    pub overdraft: OverdraftPolicy,
    pub leaderboard_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DISCORD_TOKEN`: Bot token from Discord Developer Portal
    ///
    /// Optional:
    /// - `DATABASE_URL`: SQLite connection string (default "sqlite:cookies.db")
    /// - `GUILD_ID`: Register slash commands in this guild only
    /// - `COMMAND_PREFIX`: Prefix for text commands (default "!")
    /// - `ALLOW_OVERDRAFT`: "true" lets balances go negative
    /// - `LEADERBOARD_SIZE`: Rows shown by `top` (default 10, at most 25)
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Config("DISCORD_TOKEN environment variable is required".into()))?;

        let database_url = non_empty(lookup("DATABASE_URL"))
            .unwrap_or_else(|| "sqlite:cookies.db".into());

        let guild_id = parse_optional_id::<GuildId>("GUILD_ID", lookup("GUILD_ID"))?;

        let prefix = non_empty(lookup("COMMAND_PREFIX")).unwrap_or_else(|| "!".into());

        let overdraft = if parse_flag("ALLOW_OVERDRAFT", lookup("ALLOW_OVERDRAFT"))? {
            OverdraftPolicy::Allow
        } else {
            OverdraftPolicy::Reject
        };

        let leaderboard_size = match non_empty(lookup("LEADERBOARD_SIZE")) {
            Some(val) => match val.trim().parse::<usize>() {
                Ok(size) if (1..=MAX_LEADERBOARD_SIZE).contains(&size) => size,
                _ => {
                    return Err(Error::Config(format!(
                        "Invalid value for LEADERBOARD_SIZE: '{val}' (expected 1 to {MAX_LEADERBOARD_SIZE})"
                    )))
                }
            },
            None => 10,
        };

        Ok(Self {
            discord_token,
            database_url,
            guild_id,
            prefix,
            overdraft,
            leaderboard_size,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|val| !val.trim().is_empty())
}

fn parse_flag(var: &str, value: Option<String>) -> Result<bool, Error> {
    match non_empty(value) {
        None => Ok(false),
        Some(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(Error::Config(format!("Invalid value for {var}: '{val}'"))),
        },
    }
}

fn parse_optional_id<T>(var: &str, value: Option<String>) -> Result<Option<T>, Error>
where
    T: From<u64>,
{
    match non_empty(value) {
        Some(val) => {
            let id = val
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .ok_or_else(|| Error::Config(format!("Invalid ID for {var}: '{val}'")))?;
            Ok(Some(T::from(id)))
        }
        None => Ok(None),
    }
}
