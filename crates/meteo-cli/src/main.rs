use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use meteo_core::{Assistant, CityList, CityValidator, OpenWeatherClient};
use meteo_gateway::GatewayServer;

mod config;

use config::{MeteoConfig, ValidatorMode};

#[derive(Parser)]
#[command(name = "meteo")]
#[command(version)]
#[command(about = "Meteo - a weather question assistant")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,

    /// Start the HTTP gateway
    Serve,

    /// Answer a single weather question
    Ask {
        /// The question to answer
        message: String,
    },

    /// Show the detected intent and cities for a message
    Classify {
        /// The message to classify
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config).await,
        Commands::Serve => cmd_serve(&cli.config).await,
        Commands::Ask { message } => cmd_ask(&cli.config, &message).await,
        Commands::Classify { message } => cmd_classify(&cli.config, &message).await,
    }
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        info!("Created default config at {}", config_path.display());
    }

    println!("Meteo initialized at {}", config_dir.display());
    println!(
        "Set WEATHER_API_KEY or edit {} to add your OpenWeather key.",
        config_path.display()
    );
    Ok(())
}

async fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = MeteoConfig::load(config_path)?;
    println!("{}", toml::to_string_pretty(&cfg.masked())?);
    Ok(())
}

async fn cmd_serve(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = MeteoConfig::load(config_path)?;
    let assistant = Arc::new(build_assistant(&cfg)?);

    let bind: SocketAddr = format!("{}:{}", cfg.gateway.bind, cfg.gateway.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid gateway address {}:{}",
                cfg.gateway.bind, cfg.gateway.port
            )
        })?;

    if cfg.gateway.auth_token.is_empty() {
        warn!("Gateway auth_token is empty; API routes are unauthenticated");
    }

    let cancel = CancellationToken::new();
    let server = GatewayServer::new(bind, assistant, cfg.gateway.auth_token.clone());
    let handle = server.spawn(cancel.clone());

    // Wait for shutdown signal
    signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");
    cancel.cancel();

    handle.await.context("Gateway task panicked")??;
    println!("Meteo stopped.");
    Ok(())
}

async fn cmd_ask(config_path: &Option<PathBuf>, message: &str) -> Result<()> {
    let cfg = MeteoConfig::load(config_path)?;
    let assistant = build_assistant(&cfg)?;

    let response = assistant.handle_message(message).await;
    println!("{}", response.answer);
    for step in &response.reasoning_steps {
        println!("  - {}", step);
    }
    if let Some(err) = &response.error {
        warn!("Request {} finished with error: {}", response.request_id, err);
    }
    Ok(())
}

async fn cmd_classify(config_path: &Option<PathBuf>, message: &str) -> Result<()> {
    let cfg = MeteoConfig::load(config_path)?;
    let validator = build_validator(&cfg)?;

    let result = meteo_core::classify(message, validator.as_ref()).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn weather_client(cfg: &MeteoConfig) -> Result<OpenWeatherClient> {
    if cfg.weather.api_key.is_empty() {
        warn!("No weather API key configured; set WEATHER_API_KEY");
    }
    let client = OpenWeatherClient::new(
        cfg.weather.api_key.clone(),
        Duration::from_secs(cfg.weather.timeout_secs),
    )
    .context("Failed to build weather client")?
    .with_base_url(cfg.weather.base_url.clone());
    Ok(client)
}

fn build_validator(cfg: &MeteoConfig) -> Result<Arc<dyn CityValidator>> {
    let validator: Arc<dyn CityValidator> = match cfg.validator.mode {
        ValidatorMode::Geocoding => Arc::new(weather_client(cfg)?),
        ValidatorMode::List => {
            if cfg.validator.cities.is_empty() {
                warn!("Validator mode is \"list\" but no cities are configured");
            }
            Arc::new(CityList::new(cfg.validator.cities.iter().cloned()))
        }
    };
    Ok(validator)
}

fn build_assistant(cfg: &MeteoConfig) -> Result<Assistant> {
    let weather = Arc::new(weather_client(cfg)?);
    let validator: Arc<dyn CityValidator> = match cfg.validator.mode {
        ValidatorMode::Geocoding => weather.clone(),
        ValidatorMode::List => build_validator(cfg)?,
    };
    info!(
        "Assistant ready (validator: {:?}, forecast window: {})",
        cfg.validator.mode, cfg.weather.forecast_window
    );
    Ok(Assistant::new(validator, weather).with_forecast_window(cfg.weather.forecast_window))
}
