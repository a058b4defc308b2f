mod health;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use formrelay_core::config::{self, RelayConfig};
use formrelay_core::http::build_client;
use formrelay_core::{CommandRelay, HttpCompletionClient, HttpConfigBackend, HttpFormSubmitter};
use formrelay_discord::serenity::{all::GatewayIntents, Client};
use formrelay_discord::{DiscordBot, DiscordBotConfig, DiscordEventHandler};
use miette::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "formrelay")]
#[command(about = "Discord bot that submits slash-command text to Google Forms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (the default)
    Run {
        /// Don't start the health check listener
        #[arg(long)]
        no_health: bool,
    },
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .context_lines(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.debug);

    let config = load_relay_config(cli.config.as_deref()).await?;

    match cli.command.unwrap_or(Commands::Run { no_health: false }) {
        Commands::Run { no_health } => run_bot(config, no_health).await,
        Commands::CheckConfig => {
            print_config_summary(&config);
            Ok(())
        }
    }
}

/// Terminal plus daily-rolling file logging. The returned guard flushes the
/// file writer on drop and must live until exit.
fn init_tracing(debug: bool) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_appender::rolling;
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("formrelay")
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = rolling::daily(&log_dir, "formrelay.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("formrelay_core=debug,formrelay_discord=debug,formrelay=debug,serenity=info,info")
        } else {
            EnvFilter::new("formrelay_core=info,formrelay_discord=info,formrelay=info,serenity=warn,warn")
        }
    });

    let terminal_layer = if debug {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_timer(fmt::time::LocalTime::rfc_3339())
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .compact()
            .boxed()
    };

    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_timer(fmt::time::LocalTime::rfc_3339())
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(terminal_layer.with_filter(env_filter))
        .with(file_layer.with_filter(EnvFilter::new(
            "formrelay_core=debug,formrelay_discord=debug,formrelay=debug,info",
        )))
        .init();

    info!(
        "Logging initialized. Logs are being written to: {:?}",
        log_dir.join("formrelay.log")
    );

    guard
}

async fn load_relay_config(path: Option<&std::path::Path>) -> Result<RelayConfig> {
    let mut config = if let Some(path) = path {
        info!("Loading config from: {:?}", path);
        config::load_config(path).await?
    } else {
        config::load_config_from_standard_locations().await?
    };

    config.apply_env();
    config.validate()?;
    Ok(config)
}

fn build_relay(config: &RelayConfig) -> Result<CommandRelay> {
    let client = build_client(config.backend.timeout_secs)?;

    let relay = CommandRelay::new(
        Arc::new(HttpConfigBackend::new(client.clone(), config.script_url()?)),
        Arc::new(HttpFormSubmitter::new(client.clone())),
    );

    let Some(ai) = config.active_ai() else {
        info!("AI command disabled");
        return Ok(relay);
    };

    info!(model = %ai.model, "AI command enabled");
    Ok(relay.with_completion(
        Arc::new(HttpCompletionClient::new(client, ai)),
        ai.failure_message.clone(),
    ))
}

async fn run_bot(config: RelayConfig, no_health: bool) -> Result<()> {
    let bot_config = DiscordBotConfig::from_env().ok_or_else(|| {
        miette::miette!("No Discord configuration found. Set DISCORD_BOT_TOKEN.")
    })?;

    let relay = Arc::new(build_relay(&config)?);

    if config.health.enabled && !no_health {
        health::spawn(&config.health.bind).await?;
    }

    let bot = Arc::new(DiscordBot::new(
        relay,
        config.discord.clone(),
        bot_config.clone(),
    ));
    info!(ai = bot.relay().ai_enabled(), "Building Discord client");

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&bot_config.bot_token, intents)
        .event_handler(DiscordEventHandler::new(bot))
        .await
        .map_err(|e| miette::miette!("Failed to create Discord client: {}", e))?;

    let shard_manager = client.shard_manager.clone();

    info!("Discord bot starting... Press Ctrl+C to stop.");
    tokio::select! {
        result = client.start() => {
            result.map_err(|e| miette::miette!("Discord bot error: {}", e))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            shard_manager.shutdown_all().await;
        }
    }

    Ok(())
}

fn print_config_summary(config: &RelayConfig) {
    println!("Configuration OK");
    println!("  backend:      {}", config.backend.script_url.as_deref().unwrap_or("-"));
    println!("  timeout:      {}s", config.backend.timeout_secs);
    match config.active_ai() {
        Some(ai) => println!("  ai:           {} ({})", ai.model, ai.api_url),
        None => println!("  ai:           disabled"),
    }
    if config.health.enabled {
        println!("  health check: {}", config.health.bind);
    } else {
        println!("  health check: disabled");
    }
    println!(
        "  bot token:    {}",
        if DiscordBotConfig::from_env().is_some() {
            "set"
        } else {
            "missing"
        }
    );
}
