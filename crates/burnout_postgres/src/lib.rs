//! burnout_postgres: PostgreSQL adapters for the burnout_core ports.

pub mod sqlx_types;
pub mod store;

use std::sync::Arc;

use sqlx::PgPool;

use burnout_core::ports::{EvaluationStore, RevocationLedger, UserStore};

pub use store::{PgEvaluationStore, PgRevocationLedger, PgUserStore};

const SCHEMA: &str = include_str!("../migrations/001_burnout.sql");

/// Apply the schema. Every statement is idempotent, so this runs on each startup.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::info!("burnout schema applied");
    Ok(())
}

/// All three stores over one shared pool.
pub struct PgStores {
    pub users: Arc<dyn UserStore>,
    pub evaluations: Arc<dyn EvaluationStore>,
    pub revocations: Arc<dyn RevocationLedger>,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            evaluations: Arc::new(PgEvaluationStore::new(pool.clone())),
            revocations: Arc::new(PgRevocationLedger::new(pool)),
        }
    }
}
