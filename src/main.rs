//! Baton client - OSC over WebSocket
//!
//! Connects to a Baton relay, installs a client profile and mirrors the
//! relay's OSC traffic into observable state.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use baton_client::config::AppConfig;
use baton_client::profiles::{self, Profile};
use baton_client::{CodecKind, Dispatcher, Session, StateStore};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Log output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Baton client - receive and send OSC messages over a WebSocket relay
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to ./config.yaml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Relay host, overrides the configuration file
    #[arg(long, env = "BATON_HOST")]
    host: Option<String>,

    /// Relay WebSocket port, overrides the configuration file
    #[arg(long, env = "BATON_PORT")]
    port: Option<u16>,

    /// Client profile to install
    #[arg(long, value_enum)]
    profile: Option<Profile>,

    /// Frame codec
    #[arg(long, value_enum)]
    codec: Option<CodecKind>,

    /// Send the /bar demo message once connected
    #[arg(long)]
    send_demo: bool,

    /// Start the interactive console
    #[arg(short, long)]
    interactive: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.log_format)?;

    info!("Starting Baton client...");

    let config = load_config(&args).await?;
    info!(
        "Profile: {:?}, codec: {:?}, relay: {}:{}",
        config.profile, config.codec, config.server.host, config.server.port
    );

    run_app(config, &args).await?;

    info!("Baton client shutdown complete");
    Ok(())
}

/// Load the configuration file (if any) and apply command-line overrides
async fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Configuration file: {}", path);
            AppConfig::load(path).await?
        },
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            info!("Configuration file: {}", DEFAULT_CONFIG_PATH);
            AppConfig::load(DEFAULT_CONFIG_PATH).await?
        },
        None => {
            info!("No configuration file, using defaults");
            AppConfig::default()
        },
    };

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(profile) = args.profile {
        config.profile = profile;
    }
    if let Some(codec) = args.codec {
        config.codec = codec;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_app(config: AppConfig, args: &Args) -> Result<()> {
    let store = StateStore::new();
    store.subscribe(|key, value| {
        info!("📊 {} = {}", key, value);
    });

    let mut dispatcher = Dispatcher::new();
    profiles::install(config.profile, &mut dispatcher, &store, &config.tables())
        .context("Failed to install profile handlers")?;
    info!("Dispatcher ready: {:?}", dispatcher);

    let session = Arc::new(
        Session::new(config.endpoint()?, config.codec.build(), dispatcher)
            .with_connect_timeout(config.connect_timeout()),
    );

    session.open().await.context("Failed to open OSC session")?;

    if args.send_demo {
        let message = profiles::demo_message()?;
        session
            .send(&message)
            .await
            .context("Failed to send demo message")?;
        info!("📤 Sent demo message: {}", message);
    }

    if args.interactive {
        tokio::select! {
            result = cli::run_repl(Arc::clone(&session), store.clone()) => result?,
            _ = shutdown_signal() => {},
        }
    } else {
        tokio::select! {
            _ = session.wait_closed() => {
                warn!("Relay closed the connection");
            },
            _ = shutdown_signal() => {},
        }
    }

    info!("Shutting down...");
    session.close().await;
    Ok(())
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .try_init(),
    }
    .context("Failed to initialize logging")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
