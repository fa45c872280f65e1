use anyhow::Context as _;
use statusd::config::Config;
use statusd::server::{create_metrics, run, spawn_signal_handler, ShutdownSignals};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        listen_address = %config.listen_address,
        shutdown_grace_secs = config.shutdown_grace.as_secs(),
        endpoints = ?config.endpoints,
        "Starting statusd"
    );

    let metrics = create_metrics().context("failed to create metrics registry")?;

    // Signal handlers go in before the listener so an early SIGTERM is not lost
    let token = CancellationToken::new();
    let signals = ShutdownSignals::install().context("failed to install signal handlers")?;
    spawn_signal_handler(signals, token.clone());

    // Any error here is fatal: listener failure or shutdown that did not finish cleanly
    if let Err(e) = run(&config, metrics, token).await {
        error!(error = %e, cause = ?std::error::Error::source(&e), "Server terminated");
        return Err(e.into());
    }

    Ok(())
}
