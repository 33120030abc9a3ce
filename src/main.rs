//! Gaming lounge service binary
//!
//! ```sh
//! # Run with default config (~/.config/gaming-lounge/config.toml)
//! lounge-service
//!
//! # Custom config path and port
//! lounge-service --config /etc/gaming-lounge/config.toml --api-port 9090
//!
//! # Validate config without starting
//! lounge-service --check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use gaming_lounge::config::AppConfig;
use gaming_lounge::server::{init_tracing, ServerHandle, ServerOptions};

/// Rental, billing and desk-order service for a gaming lounge.
#[derive(Parser, Debug)]
#[command(
    name = "lounge-service",
    version,
    about = "PC rental and desk-order service for gaming venues",
    long_about = "Gaming lounge service: PC rentals with prepaid countdowns, \
                  automatic expiry and food/accessory orders over a REST API.\n\n\
                  Default config: ~/.config/gaming-lounge/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "LOUNGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Do not create PCs or the starter menu on first start.
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(gaming_lounge::default_config_path);

    let loaded = if config_path.exists() {
        AppConfig::load(&config_path).map(Some)
    } else {
        Ok(None)
    };

    if cli.check {
        return match loaded {
            Ok(cfg) => {
                let mut config = cfg.unwrap_or_default();
                apply_overrides(&cli, &mut config);
                if let Err(e) = config.validate() {
                    eprintln!("❌ Invalid configuration: {}", e);
                    return ExitCode::FAILURE;
                }
                println!("✅ Configuration is valid");
                println!("   Config file : {}", config_path.display());
                println!("   API address : {}", config.api_address());
                println!("   Database    : {}", config.database.url);
                println!("   Currency    : {}", config.billing.currency);
                println!("   Log level   : {}", config.logging.level);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ {}: {}", config_path.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    let mut config = match &loaded {
        Ok(Some(cfg)) => cfg.clone(),
        _ => AppConfig::default(),
    };
    apply_overrides(&cli, &mut config);
    init_tracing(&config);

    match loaded {
        Ok(Some(_)) => info!("Configuration loaded from {}", config_path.display()),
        Ok(None) => info!(
            "No config file at {}, using defaults",
            config_path.display()
        ),
        Err(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    let handle = match ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        seed: !cli.no_seed,
    })
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    handle.install_signal_handler();
    info!("🚀 Press Ctrl+C to shut down gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    ExitCode::SUCCESS
}

fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}
