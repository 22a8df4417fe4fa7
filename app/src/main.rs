use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use broker_client::{Broker, KiteClient};
use clap::Parser;
use instruments::InstrumentCache;
use session::SessionStore;
use web_server::AppState;
use webhooks::WebhookRegistry;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about = "A Kite Connect broker gateway.")]
struct Cli {
    /// Override the host to bind (defaults to the configured value).
    #[arg(long)]
    host: Option<String>,

    /// Override the port to bind (defaults to the configured value).
    #[arg(long)]
    port: Option<u16>,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = app_config::load_settings().context("failed to load configuration")?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.app.log_level.clone().into()),
        )
        .init();

    tracing::info!(environment = %settings.app.environment, "Starting kite gateway");

    let broker: Arc<dyn Broker> =
        Arc::new(KiteClient::new(&settings.kite).context("failed to build broker client")?);

    let state = AppState {
        session: Arc::new(SessionStore::new(settings.session.expiry_cutoff_hour)),
        instruments: Arc::new(InstrumentCache::new(
            broker.clone(),
            chrono::Duration::hours(settings.instruments.refresh_interval_hours),
        )),
        webhooks: Arc::new(WebhookRegistry::new(std::time::Duration::from_secs(
            settings.webhooks.delivery_timeout_secs,
        ))),
        broker,
        settings: Arc::new(settings),
        started_at: Instant::now(),
    };

    web_server::run(state).await.context("server exited with an error")?;
    Ok(())
}
