//! Mock API Server - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use mock_api_server::admin::MOCKS_PATH;
use mock_api_server::config::DEFAULT_CONFIG;
use mock_api_server::{server, AppState, MockServerConfig, Registry};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mock-api-server",
    about = "Programmable HTTP mock server - register responses and replay them",
    version
)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Path to configuration file (built-in example mocks when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        println!("{}", DEFAULT_CONFIG);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) if path.exists() => {
            info!(path = ?path, "Loading configuration");
            MockServerConfig::from_file(path)?
        }
        Some(path) => anyhow::bail!("Configuration file not found: {:?}", path),
        None => {
            info!("Using built-in configuration");
            MockServerConfig::builtin()?
        }
    };

    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} mocks defined)",
            config.mocks.len()
        );
        return Ok(());
    }

    let registry = Arc::new(Registry::new());
    config.seed(&registry).await?;

    let addr = SocketAddr::new(args.host, args.port);
    info!(
        list = %format!("GET {MOCKS_PATH}"),
        create = %format!("POST {MOCKS_PATH}"),
        delete = %format!("DELETE {MOCKS_PATH}?path=/path&method=GET"),
        "Admin API endpoints"
    );
    for mock in registry.list().await {
        info!(
            method = %mock.method,
            path = %mock.path,
            delay_ms = mock.delay_ms,
            "Mock endpoint registered"
        );
    }

    let state = AppState::new(registry, config.settings);
    server::serve(addr, state).await
}
