//! Grade service HTTP server.
//!
//! ```bash
//! docker compose up -d   # postgres, redpanda, booking
//! cargo run --bin grade-service
//! ```

use grade_core::event_bus::EventBus;
use grade_runtime::metrics::MetricsRecorder;
use grade_service::bootstrap::Resources;
use grade_service::{AppState, Config, build_router};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,grade_service=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting grade service");

    let config = Config::from_env();
    info!(
        redpanda = %config.redpanda.brokers,
        booking = %config.booking.url,
        "Configuration loaded"
    );

    let mut recorder = MetricsRecorder::new();
    if let Err(e) = recorder.install() {
        warn!(error = %e, "Metrics disabled");
    }

    let resources = Resources::from_config(&config).await?;
    let service = resources.review_service(&config);
    let app = build_router(AppState::new(service, Arc::new(recorder)));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let flush_timeout = Duration::from_secs(config.server.shutdown_timeout);
    if let Err(e) = resources.event_bus.flush(flush_timeout).await {
        error!(error = %e, "Pending events not delivered before shutdown");
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
