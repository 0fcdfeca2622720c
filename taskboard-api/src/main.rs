//! # Taskboard API Server
//!
//! Multi-tenant project and task tracker: accounts, projects joined by
//! invitation token, a todo/doing/done workflow with history, and per-user
//! notifications with a live activity stream.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=... DATABASE_URL=postgresql://localhost/taskboard cargo run -p taskboard-api
//! ```
//!
//! Without `DATABASE_URL` the server runs on the in-memory store.

use std::sync::Arc;

use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{create_pool, DatabaseConfig},
    },
    store::{InMemoryStore, PgStore, Store},
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.api.json_logs);

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let store = open_store(&config).await?;

    let state = AppState::new(store.clone(), config.clone());
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_for_shutdown(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "taskboard_api=debug,taskboard_shared=debug,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let Some(db) = &config.database else {
        tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
        return Ok(Arc::new(InMemoryStore::new()));
    };

    ensure_database_exists(&db.url).await?;

    let pool = create_pool(DatabaseConfig {
        url: db.url.clone(),
        max_connections: db.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    Ok(Arc::new(PgStore::new(pool)))
}

async fn watch_for_shutdown(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
    token.cancel();
}
