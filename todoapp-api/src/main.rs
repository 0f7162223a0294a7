//! # todoapp API server
//!
//! Session-authenticated REST backend for accounts, todo lists and tasks.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=sqlite://todoapp.db SESSION_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p todoapp-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use std::sync::Arc;

use todoapp_api::{
    app::{build_router, AppState},
    config::Config,
};
use todoapp_shared::{
    db::{
        pool::{close_pool, create_pool},
        schema::ensure_schema,
    },
    mail::LogMailer,
    store::RecordStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "todoapp API server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(config.database.clone()).await?;
    let store = RecordStore::new(pool.clone());
    ensure_schema(&store).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(store, config, Arc::new(LogMailer));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "todoapp_api=debug,todoapp_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
