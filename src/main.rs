use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod domain;
mod application;
mod infrastructure;

use application::errors::BotError;
use application::messaging::MessageDispatcher;
use application::services::{launcher, CommandService};
use domain::traits::Bot;
use infrastructure::adapters::console::{ConsoleAdapter, CONSOLE_CHAT_ID};
use infrastructure::adapters::telegram::TelegramAdapter;
use infrastructure::config::{Config, FRONTEND_VAR};

/// Pause after a failed getUpdates before polling again
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "game-launcher-bot")]
#[command(about = "Telegram bot that opens the game web app", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// .env file loaded before reading the environment
    #[arg(short, long, default_value = ".env", global = true)]
    env_file: PathBuf,

    /// Bot token (overrides TELEGRAM_BOT_TOKEN)
    #[arg(short, long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start long polling (default)
    Run,
    /// Answer commands typed on stdin, no Telegram connection
    Console,
    /// Show version
    Version,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    if let Commands::Version = command {
        println!("game-launcher-bot v{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let mut config = Config::load_env(&cli.env_file);
    if let Some(token) = cli.token {
        config = config.with_token(token);
    }
    if !config.has_frontend() {
        tracing::warn!("{} is not set, the Open button will have an empty URL", FRONTEND_VAR);
    }

    let result = match command {
        Commands::Run => run_bot(&config),
        Commands::Console => run_console(&config),
        Commands::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Dispatcher with the single `/start` handler
fn build_dispatcher(config: &Config) -> MessageDispatcher {
    let mut commands = CommandService::new();
    commands.register(launcher::start_command(config));
    tracing::info!("Registered {} command(s)", commands.len());

    MessageDispatcher::new(commands)
}

fn runtime() -> Result<tokio::runtime::Runtime, BotError> {
    tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(e.to_string()))
}

fn run_bot(config: &Config) -> Result<(), BotError> {
    runtime()?.block_on(async {
        let mut bot = TelegramAdapter::from_config(config)?;
        bot.start().await?;

        // Fails here on a token Telegram does not accept
        bot.fetch_bot_info().await?;
        let info = bot.bot_info();
        tracing::info!("Bot started: {} (@{}, id {})", info.name, info.username, info.id);

        let dispatcher = build_dispatcher(config).with_bot_username(info.username);

        if let Err(e) = bot.register_commands(&dispatcher.commands().menu()).await {
            tracing::warn!("Failed to register commands: {}", e);
        }

        tokio::select! {
            _ = run_telegram_bot(&bot, &dispatcher) => {}
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                }
                tracing::info!("Stopping polling");
            }
        }

        Ok::<(), BotError>(())
    })
}

async fn run_telegram_bot(bot: &TelegramAdapter, dispatcher: &MessageDispatcher) {
    let mut offset: i64 = 0;

    tracing::info!("Starting message loop...");

    loop {
        match bot.get_updates(offset).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::info!("Received {} updates", updates.len());
                }

                for update in &updates {
                    if let Err(e) = bot.handle_update(dispatcher, update).await {
                        tracing::error!("Failed to handle update {}: {}", update.update_id, e);
                    }
                }

                offset = TelegramAdapter::get_next_offset(&updates, offset);
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

fn run_console(config: &Config) -> Result<(), BotError> {
    runtime()?.block_on(async {
        let bot = ConsoleAdapter::new();
        bot.start().await?;

        let dispatcher = build_dispatcher(config).with_bot_username(bot.bot_info().username);

        while let Some(input) = bot.read_line("> ").await {
            if input.is_empty() {
                continue;
            }

            let message = dispatcher
                .parse(CONSOLE_CHAT_ID, input, None)
                .with_platform("console");

            match dispatcher.dispatch(&bot, &message).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!("No handler for {:?}", message.content),
                Err(e) => tracing::error!("Failed to send reply: {}", e),
            }
        }

        Ok::<(), BotError>(())
    })
}
