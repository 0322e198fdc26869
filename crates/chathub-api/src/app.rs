//! Application builder. Wires router, middleware, and state into an Axum
//! app, and runs it until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::trace::TraceLayer;
use tracing::info;

use chathub_core::config::{AppConfig, DatabaseConfig, StoreProvider};
use chathub_core::error::AppError;
use chathub_database::migration::run_migrations;
use chathub_database::{DatabasePool, MemoryMessageStore, MessageStore, PgMessageStore};

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Opens the store selected by `database.provider`.
///
/// For PostgreSQL the pool is also returned so it can be closed on exit.
pub async fn open_store(
    config: &DatabaseConfig,
) -> Result<(Arc<dyn MessageStore>, Option<DatabasePool>), AppError> {
    match config.provider {
        StoreProvider::Memory => {
            info!("Using in-memory message store");
            Ok((Arc::new(MemoryMessageStore::new()), None))
        }
        StoreProvider::Postgres => {
            info!("Connecting to database...");
            let db = DatabasePool::connect(config).await?;
            if config.run_migrations {
                info!("Running database migrations...");
                run_migrations(db.pool()).await?;
            }
            Ok((Arc::new(PgMessageStore::new(db.clone())), Some(db)))
        }
    }
}

/// Runs the ChatHub server with the given configuration.
///
/// On ctrl-c or SIGTERM the listener stops accepting, every live realtime
/// session is closed and torn down, and pending presence writes are
/// flushed before returning.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting ChatHub server...");

    let (store, db) = open_store(&config.database).await?;
    let state = AppState::new(config.clone(), store);
    let realtime = state.realtime.clone();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("ChatHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, closing realtime sessions");
            realtime.shutdown(grace).await;
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(db) = db {
        db.close().await;
    }
    info!("ChatHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
