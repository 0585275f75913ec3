pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod ledger;
pub mod utils;

use ledger::Ledger;

/// Shared data accessible across all Poise commands and event handlers.
pub struct Data {
    pub ledger: Ledger,
    pub config: config::Config,
}

/// Poise context alias used throughout the bot.
pub type Context<'a> = poise::Context<'a, Data, error::Error>;
