mod commands;
mod constants;
mod directory;
mod models;
mod schedule;
mod store;
mod utils;

use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::{
    commands::birthday,
    constants::{DEFAULT_DATA_FILE, DEFAULT_TIMEZONE, LOG_DIRECTIVE},
    directory::DiscordDirectory,
    models::Data,
    schedule::{CelebrationEngine, start_birthday_scheduler},
    store::{BirthdayStore, SharedStore},
    utils::timezone::parse_timezone,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    initialize_logging();

    // Load configuration from environment
    let config = match load_configuration() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Load birthday data, creating the file on first run
    let store = BirthdayStore::open(config.data_file, config.timezone).into_shared();

    if let Err(e) = start_bot(config.discord_token, store, config.dev_guild_id).await {
        error!("Bot error: {}", e);
        std::process::exit(1);
    }
}

/// Configuration loaded from environment variables
struct Config {
    discord_token: String,
    data_file: PathBuf,
    timezone: Tz,
    dev_guild_id: Option<u64>,
}

/// Initialize the logging system
fn initialize_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(LOG_DIRECTIVE.parse().expect("valid log directive")),
        )
        .init();
}

/// Load configuration from environment variables
fn load_configuration() -> Result<Config, Box<dyn std::error::Error>> {
    let discord_token = std::env::var("DISCORD_TOKEN")
        .map_err(|_| "DISCORD_TOKEN environment variable not set. Set it with: export DISCORD_TOKEN=your_bot_token")?;

    let data_file = std::env::var("BIRTHDAY_DATA_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_FILE));

    let timezone_name =
        std::env::var("BIRTHDAY_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
    let timezone = parse_timezone(&timezone_name)?;

    // Optional: development guild ID for faster command registration
    let dev_guild_id = std::env::var("DEV_GUILD_ID")
        .ok()
        .and_then(|id| id.parse::<u64>().ok());

    if dev_guild_id.is_some() {
        info!("Development mode: Commands will be registered to guild only");
    }

    info!(
        "Birthday data file: {}, timezone: {}",
        data_file.display(),
        timezone
    );

    Ok(Config {
        discord_token,
        data_file,
        timezone,
        dev_guild_id,
    })
}

/// Create and start the Discord bot
async fn start_bot(
    token: String,
    store: SharedStore,
    dev_guild_id: Option<u64>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (scan_trigger_tx, scan_trigger_rx) = watch::channel(0u64);

    // Create framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![birthday()],
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            let directory = Arc::new(DiscordDirectory::new(ctx.http.clone()));
            let engine = Arc::new(CelebrationEngine::new(store.clone(), directory));

            // Start birthday scheduler; the first pass runs right away
            start_birthday_scheduler(engine, scan_trigger_rx);
            info!("Birthday scheduler task started");

            Box::pin(async move {
                // Register commands based on dev_guild_id
                if let Some(guild_id) = dev_guild_id {
                    let guild = serenity::GuildId::new(guild_id);
                    info!("Registering commands in development guild: {}", guild_id);
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild)
                        .await?;
                    info!(
                        "Commands registered in guild {} (instant updates)",
                        guild_id
                    );
                } else {
                    info!("Registering commands globally (may take up to 1 hour)");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!("Commands registered globally");
                }

                info!("Bot is ready!");

                Ok(Data::new(store, scan_trigger_tx))
            })
        })
        .build();

    // Create client with required intents
    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    // Start the bot
    info!("Starting bot...");
    client.start().await?;

    Ok(())
}
