//! Lyceum - e-learning platform backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lyceum::{
    config::Args,
    db,
    server::{self, AppState},
    worker::{HttpRelayBackend, LogBackend, MailBackend, MailQueue, MailerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lyceum={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Lyceum - e-learning platform");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Frontend: {}", args.frontend_url);
    info!("Mail workers: {}", args.mail_worker_count);
    info!(
        "Mail relay: {}",
        args.mail_api_url.as_deref().unwrap_or("(log only)")
    );
    info!(
        "Chat upstream: {}",
        args.chat_upstream_url.as_deref().unwrap_or("(disabled)")
    );
    info!("======================================");

    // Connect to the database and apply migrations
    let conn = match db::connect(&args.database_url).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("Database connection failed: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::migrate(&conn).await {
        error!("Migration failed: {}", e);
        std::process::exit(1);
    }

    // Start the mail queue; without a configured relay, mail goes to the log
    let mail_backend: Arc<dyn MailBackend> = match &args.mail_api_url {
        Some(url) => {
            info!("Mail relay configured");
            Arc::new(HttpRelayBackend::new(url.clone(), args.mail_api_key.clone()))
        }
        None => Arc::new(LogBackend),
    };
    let mail = MailQueue::start(
        MailerConfig {
            worker_count: args.mail_worker_count,
            from: args.mail_from.clone(),
            ..MailerConfig::default()
        },
        mail_backend,
    );

    // Create application state
    let state = match AppState::new(args, conn, mail) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
