use cookie_bot::commands::{cookies, general};
use cookie_bot::config::Config;
use cookie_bot::events;
use cookie_bot::ledger::{Ledger, OverdraftPolicy};
use cookie_bot::Data;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cookie_bot=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let pool = match cookie_bot::db::init_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            std::process::exit(1);
        }
    };
    let ledger = Ledger::new(pool, config.overdraft);
    match ledger.policy() {
        OverdraftPolicy::Reject => info!("Transfers larger than the sender's balance are rejected"),
        OverdraftPolicy::Allow => warn!("ALLOW_OVERDRAFT is set, cookie balances may go negative"),
    }
    let shutdown_ledger = ledger.clone();

    let token = config.discord_token.clone();
    let prefix = config.prefix.clone();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                cookies::pay(),
                cookies::balance(),
                cookies::top(),
                general::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                mention_as_prefix: true,
                case_insensitive_commands: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(events::command_error::on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(bot = %ready.user.name, guilds = ready.guilds.len(), "Bot is ready!");

                // Register slash commands (guild-specific if GUILD_ID set, otherwise global)
                if let Some(guild_id) = config.guild_id {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
                    info!(guild_id = %guild_id, "Slash commands registered to guild");
                } else {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!("Slash commands registered globally");
                }

                ctx.set_activity(Some(serenity::ActivityData::playing("Cookie Clicker")));

                Ok(Data { ledger, config })
            })
        })
        .build();

    let mut client = match serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create Discord client");
            shutdown_ledger.close().await;
            std::process::exit(1);
        }
    };

    // Graceful shutdown on SIGINT/SIGTERM
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping bot...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting bot...");
    let result = client.start().await;

    shutdown_ledger.close().await;

    if let Err(why) = result {
        error!(error = %why, "Client error");
        std::process::exit(1);
    }
    info!("Bot has shut down cleanly");
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
