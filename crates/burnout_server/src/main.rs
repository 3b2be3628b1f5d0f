//! burnout_server: standalone REST server for the student burnout tracker.
//!
//! Configuration comes from the environment (see [`burnout_server::config`]).
//! Pass `--memory` to run against the in-process store instead of Postgres.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use burnout_core::memory::MemoryStore;
use burnout_core::password::CredentialHasher;
use burnout_core::ports::{EvaluationStore, RevocationLedger, UserStore};
use burnout_postgres::PgStores;
use burnout_server::config::ServerConfig;
use burnout_server::middleware::jwt::JwtConfig;
use burnout_server::router::build_router;
use burnout_server::state::Services;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

type Stores = (
    Arc<dyn UserStore>,
    Arc<dyn EvaluationStore>,
    Arc<dyn RevocationLedger>,
);

async fn connect_stores(config: &ServerConfig, memory: bool) -> anyhow::Result<Stores> {
    if memory {
        tracing::warn!("running with the in-memory store; data is lost on exit");
        let store = Arc::new(MemoryStore::new());
        let users: Arc<dyn UserStore> = store.clone();
        let evaluations: Arc<dyn EvaluationStore> = store.clone();
        let ledger: Arc<dyn RevocationLedger> = store;
        return Ok((users, evaluations, ledger));
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("BURNOUT_DATABASE_URL must be set (or pass --memory)")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("Connected to database");

    burnout_postgres::migrate(&pool).await?;
    let stores = PgStores::new(pool);
    Ok((stores.users, stores.evaluations, stores.revocations))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,burnout_server=debug,burnout_core=debug".into()),
        )
        .init();

    let memory = std::env::args().any(|arg| arg == "--memory");
    let config = ServerConfig::from_env()?;

    let (users, evaluations, ledger) = connect_stores(&config, memory).await?;

    let jwt_config =
        JwtConfig::from_secret(config.jwt_secret.as_bytes()).with_ttl(config.token_ttl_secs);
    let services = Services::new(
        users,
        evaluations,
        ledger,
        Arc::new(jwt_config.clone()),
        CredentialHasher::default(),
    );

    let cors_origin = HeaderValue::from_str(&config.cors_origin)
        .with_context(|| format!("invalid BURNOUT_CORS_ORIGIN: {}", config.cors_origin))?;
    let app = build_router(services, jwt_config, cors_origin);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("burnout_server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
