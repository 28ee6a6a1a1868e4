use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use campus_gateway::config::load_config;
use campus_gateway::config::loader::parse_config;
use campus_gateway::observability::{logging, metrics};
use campus_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "campus-gateway")]
#[command(about = "Authenticating reverse proxy for the campus services", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults plus environment are used when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging comes up before validation so config errors are reported.
    // The level is peeked from the raw file; validation happens below.
    let observability = cli
        .config
        .as_deref()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|content| parse_config(&content).ok())
        .map(|config| config.observability)
        .unwrap_or_default();
    logging::init_logging(&observability);

    tracing::info!("campus-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            return Err(e.into());
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let server = GatewayServer::new(config.clone())?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown.clone().trigger_on_signal());

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
