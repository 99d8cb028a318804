//! users-api server: loads config from the environment, prepares the `users`
//! schema, and serves the user routes. Startup fails fast if the database is
//! unreachable or the schema cannot be created.

use std::sync::Arc;
use tokio::net::TcpListener;
use users_api::{app, connect, ensure_schema, telemetry, AppConfig, AppState, PgUserStore, UserStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        e
    })?;
    tracing::info!(target_db = %config.database.redacted_url(), "connecting to database");

    let pool = connect(&config.database);
    let store = PgUserStore::new(pool);
    if let Err(e) = store.ping().await {
        tracing::error!(error = %e, "database connection failed");
        return Err(e.into());
    }
    if let Err(e) = ensure_schema(store.pool()).await {
        tracing::error!(error = %e, "error creating database tables");
        return Err(e.into());
    }

    let state = AppState::new(Arc::new(store));
    let router = app(state, &config.server);

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
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
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
