//! Tiergate - task list session with tiered entitlements

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiergate::{config::Args, repl};
use tiergate_client::{EntitlementClient, TaskStoreClient};
use tiergate_sdk::{Session, SessionHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logs go to stderr so they don't interleave with the rendered session
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tiergate={0},tiergate_sdk={0},tiergate_client={0},warn",
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Tiergate");
    info!("======================================");
    info!("Customer: {}", args.customer_id);
    info!("Task store: {}", args.task_store_url);
    info!("Entitlements: {}", args.entitlements_url);
    info!(
        "Refresh timeout: {}ms, ready timeout: {}ms",
        args.refresh_timeout_ms, args.ready_timeout_ms
    );
    info!("======================================");

    let entitlements = EntitlementClient::new(args.entitlement_config())?;
    let store = TaskStoreClient::new(args.task_store_config())?;

    let session = Session::start(
        args.session_config(),
        Arc::new(entitlements),
        Arc::new(store),
    )
    .await;
    info!(session_id = %session.id(), "Session started");

    repl::run(SessionHandle::new(session)).await?;

    info!("Session closed");
    Ok(())
}
