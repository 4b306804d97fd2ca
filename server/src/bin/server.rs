//! Venue booking HTTP server.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use venue_booking::bootstrap::{bootstrap, spawn_session_purge};
use venue_booking::metrics::{install_prometheus_exporter, register_business_metrics};
use venue_booking::{Config, build_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "venue_booking=info,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Venue Booking HTTP Server");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        environment = %config.environment,
        api_prefix = %config.server.api_prefix,
        token_ttl_minutes = config.auth.token_ttl_minutes,
        "Configuration loaded"
    );

    // Metrics
    register_business_metrics();
    if config.server.metrics_enabled {
        let metrics_addr: SocketAddr = config.server.metrics_address().parse()?;
        install_prometheus_exporter(metrics_addr)?;
    }

    // Database, services, admin seed
    info!("Connecting to database...");
    let state = bootstrap(&config).await?;
    info!("Application state initialized");

    if config.auth.session_purge_interval > 0 {
        spawn_session_purge(
            &state,
            Duration::from_secs(config.auth.session_purge_interval),
        );
    }

    // Build router
    let app = build_router(state, &config);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    // Run server with graceful shutdown; in-flight requests get
    // `shutdown_timeout` after the signal
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    })
    .into_future();

    tokio::select! {
        result = server => result?,
        () = async {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(shutdown_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(
                timeout_secs = config.server.shutdown_timeout,
                "Graceful shutdown timed out, dropping open connections"
            );
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
