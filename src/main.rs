use anyhow::Result;
use std::net::SocketAddr;
use tracing::{Level, info, warn};
use tracing_subscriber::fmt::format::FmtSpan;

use repowr_api::{ApiConfig, DatabasePool, QueryService, api::build_app};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ApiConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check the REPOWR_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        ranking = %config.ranking.mode,
        "Starting repOWR reputation API"
    );

    let db = DatabasePool::open(&config.database);

    // The server still starts: health works without the store and the
    // other endpoints report it unavailable per request
    if let Err(e) = db.check_connection().await {
        warn!(
            error = %e,
            path = %config.database.path.display(),
            "Store is not reachable yet"
        );
    }

    let service = QueryService::new(db.clone(), config.ranking.mode);
    let app = build_app(service, &config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Reputation API listening on {}", bind_addr);

    // Serve with connect info for client IP extraction
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.close().await;
    info!("Reputation API stopped");

    Ok(())
}

/// Initialize logging from configuration
fn init_logging(config: &ApiConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    if config.logging.sanitize_logs {
        info!("Logging initialized with client IP sanitization");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
