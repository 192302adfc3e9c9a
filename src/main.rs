use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use fudge_judge::audio_system::{
    AudioSourceManager, BlobStore, RodioDevice, SegmentPlayer, ThreadScheduler,
};
use fudge_judge::config::Config;
use fudge_judge::environment::{self, LOG_TARGET_STARTUP};
use fudge_judge::error::AppResult;
use fudge_judge::gemini::GeminiClient;
use fudge_judge::messaging::{AppEvent, Command, EventBus, EventLoop};
use fudge_judge::pages::FudgeFury;
use fudge_judge::shell;
use fudge_judge::state::{AppState, Page};

#[derive(Parser, Debug)]
#[command(name = "fudge-judge")]
#[command(about = "Call the Judge: soundboard, Fudge Fury and DM Slide", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/FudgeJudge/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recording to load at startup
    #[arg(short, long)]
    audio: Option<PathBuf>,
}

/// Initialize tracing with file rotation
///
/// Logs are written to:
/// - macOS: ~/Library/Application Support/FudgeJudge/logs/
/// - Windows: %APPDATA%/FudgeJudge/logs/
/// - Linux: ~/.config/FudgeJudge/logs/
///
/// Files are rotated daily as fudge-judge.YYYY-MM-DD.log. Debug builds also
/// log to stderr so the shell on stdout stays readable.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = Config::app_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::RollingFileAppender::builder()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("fudge-judge")
        .filename_suffix("log")
        .build(&log_dir)
        .unwrap_or_else(|_| rolling::daily(&log_dir, "fudge-judge.log"));

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    initialize_tracing();
    environment::log_runtime_environment();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let event_loop = EventLoop::new(config.frame_interval());
    let bus = EventBus::new();
    let store = Arc::new(BlobStore::new());

    let device = match RodioDevice::open(
        Arc::clone(&store),
        event_loop.sender(),
        config.tick_interval(),
        config.audio.volume,
    ) {
        Ok(device) => device,
        Err(e) => {
            tracing::error!(target: LOG_TARGET_STARTUP, "No audio output: {}", e);
            eprintln!("{}", environment::guidance(&e));
            std::process::exit(2);
        }
    };
    tracing::info!(target: LOG_TARGET_STARTUP, "Audio output: default device");

    let player = SegmentPlayer::with_reseek_delay(
        device,
        ThreadScheduler::new(event_loop.sender()),
        config.reseek_delay(),
    );

    let mut app = AppState::new(
        AudioSourceManager::new(store),
        player,
        FudgeFury::new(config.game.clone()),
        event_loop.sender(),
        bus.clone(),
    );

    match GeminiClient::from_env(&config.chat) {
        Ok(client) => {
            tracing::info!(target: LOG_TARGET_STARTUP, "Chat provider: {}", config.chat.model);
            app = app.with_chat(Arc::new(client), config.chat.system_instruction.clone());
        }
        Err(e) => tracing::warn!(target: LOG_TARGET_STARTUP, "Chat disabled: {}", e),
    }

    let (notices, _subscription) = bus.subscribe();
    let renderer = shell::spawn_renderer(notices);

    println!("Call the Judge. Type 'help' for commands.");

    let sender = event_loop.sender();
    sender
        .send(AppEvent::Command(Command::Navigate(Page::Menu)))
        .context("Event loop closed before start")?;
    if let Some(path) = cli.audio.or_else(|| config.audio_file.clone()) {
        sender
            .send(AppEvent::Command(Command::LoadAudio { path }))
            .context("Event loop closed before start")?;
    }

    shell::spawn_input(event_loop.sender());
    event_loop.run(&mut app);

    app.shutdown();
    // Dropping the subscriptions ends the renderer
    bus.clear();
    let _ = renderer.join();
    tracing::info!("Exiting");
    Ok(())
}
