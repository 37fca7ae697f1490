//! services/site/src/bin/site.rs

use site_lib::{
    adapters::MemorySessionStore,
    config::Config,
    error::SiteError,
    web::{self, state::AppState},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), SiteError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(environment = %config.environment, "Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl));
    let app_state = Arc::new(AppState {
        sessions: sessions.clone(),
        ..AppState::with_default_adapters(config.clone())
    });

    // --- 3. Sweep Expired Sessions in the Background ---
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                debug!(purged, "expired sessions removed");
            }
        }
    });

    // --- 4. Create the Web Router ---
    let app = web::app(app_state);

    // --- 5. Start the Server ---
    info!("Meadowlark Travel started on http://{}; press Ctrl-C to terminate.", config.bind_address);
    if !config.environment.is_production() {
        info!("Swagger UI available at http://{}/swagger-ui", config.bind_address);
    }
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
