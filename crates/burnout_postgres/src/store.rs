//! Postgres implementations of the burnout_core port traits.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) to avoid a compile-time DB requirement.
//! Every method runs as a single statement, so each call commits on its own.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use burnout_core::error::BurnoutError;
use burnout_core::ports::{EvaluationStore, Result, RevocationLedger, UserStore};
use burnout_core::types::*;

use crate::sqlx_types::{PgEvaluationRow, PgUserRow, EVALUATION_COLUMNS, USER_COLUMNS};

fn internal(e: sqlx::Error) -> BurnoutError {
    BurnoutError::Internal(anyhow!(e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn duplicate_user() -> BurnoutError {
    BurnoutError::Conflict("User with that username or email already exists.".into())
}

fn to_user(row: PgUserRow) -> Result<User> {
    row.try_into()
        .map_err(|e: String| BurnoutError::Internal(anyhow!(e)))
}

fn to_evaluation(row: PgEvaluationRow) -> Result<Evaluation> {
    row.try_into()
        .map_err(|e: String| BurnoutError::Internal(anyhow!(e)))
}

// ── PgUserStore ───────────────────────────────────────────────

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} ORDER BY id LIMIT 1");
        let row = sqlx::query_as::<_, PgUserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(to_user).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgUserRow>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_ref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    duplicate_user()
                } else {
                    internal(e)
                }
            })?;
        to_user(row)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, PgUserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(to_user).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_one_where("username = $1", username).await
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2 ORDER BY id LIMIT 1"
        );
        let row = sqlx::query_as::<_, PgUserRow>(&query)
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(to_user).transpose()
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::text IS NULL OR role = $1) ORDER BY id"
        );
        let rows = sqlx::query_as::<_, PgUserRow>(&query)
            .bind(role.map(|r| r.to_string()))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        rows.into_iter().map(to_user).collect()
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>> {
        if changes.is_empty() {
            return self.get(id).await;
        }
        let query = format!(
            r#"
            UPDATE users
               SET username = COALESCE($2, username),
                   email = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgUserRow>(&query)
            .bind(id)
            .bind(changes.username)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    duplicate_user()
                } else {
                    internal(e)
                }
            })?;
        row.map(to_user).transpose()
    }

    async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>> {
        let query = format!("UPDATE users SET is_active = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, PgUserRow>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(to_user).transpose()
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    BurnoutError::Conflict(
                        "User is recorded as the handler of existing evaluations.".into(),
                    )
                } else {
                    internal(e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }
}

// ── PgEvaluationStore ─────────────────────────────────────────

pub struct PgEvaluationStore {
    pool: PgPool,
}

impl PgEvaluationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationStore for PgEvaluationStore {
    async fn insert(&self, evaluation: NewEvaluation) -> Result<Evaluation> {
        let query = format!(
            r#"
            INSERT INTO evaluations (
                user_id, submitted_at,
                q1, q2, q3, q4, q5, q6, q7, q8, q9, q10,
                total_score, needs_support
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {EVALUATION_COLUMNS}
            "#
        );
        let mut q = sqlx::query_as::<_, PgEvaluationRow>(&query)
            .bind(evaluation.user_id)
            .bind(evaluation.submitted_at);
        for value in evaluation.answers.values() {
            q = q.bind(*value);
        }
        let row = q
            .bind(evaluation.total_score)
            .bind(evaluation.needs_support)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    BurnoutError::NotFound("User not found.".into())
                } else {
                    internal(e)
                }
            })?;
        to_evaluation(row)
    }

    async fn get(&self, id: EvaluationId) -> Result<Option<Evaluation>> {
        let query = format!("SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE id = $1");
        let row = sqlx::query_as::<_, PgEvaluationRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(to_evaluation).transpose()
    }

    async fn list(&self, owner: Option<UserId>, order: SortOrder) -> Result<Vec<Evaluation>> {
        let direction = match order {
            SortOrder::Newest => "DESC",
            SortOrder::Oldest => "ASC",
        };
        let query = format!(
            r#"
            SELECT {EVALUATION_COLUMNS}
            FROM evaluations
            WHERE ($1::bigint IS NULL OR user_id = $1)
            ORDER BY submitted_at {direction}, id {direction}
            "#
        );
        let rows = sqlx::query_as::<_, PgEvaluationRow>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        rows.into_iter().map(to_evaluation).collect()
    }

    async fn delete(&self, id: EvaluationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM evaluations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_meeting(
        &self,
        id: EvaluationId,
        meeting: &Meeting,
    ) -> Result<Option<Evaluation>> {
        let query = format!(
            r#"
            UPDATE evaluations
               SET meeting_place = $2, meeting_time = $3, meeting_day = $4, meeting_date = $5
             WHERE id = $1
            RETURNING {EVALUATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgEvaluationRow>(&query)
            .bind(id)
            .bind(&meeting.place)
            .bind(&meeting.time)
            .bind(&meeting.day)
            .bind(&meeting.date)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(to_evaluation).transpose()
    }

    async fn mark_handled(
        &self,
        id: EvaluationId,
        admin_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<HandleOutcome>> {
        // The IS NULL guard makes the first writer win; later callers fall
        // through to a plain read of the existing handling.
        let query = format!(
            r#"
            UPDATE evaluations
               SET handled_by_admin_id = $2, handled_at = $3
             WHERE id = $1 AND handled_by_admin_id IS NULL
            RETURNING {EVALUATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgEvaluationRow>(&query)
            .bind(id)
            .bind(admin_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        if let Some(row) = row {
            return Ok(Some(HandleOutcome::Handled(to_evaluation(row)?)));
        }
        Ok(self.get(id).await?.map(HandleOutcome::AlreadyHandled))
    }

    async fn latest_handled(&self, owner: UserId) -> Result<Option<Evaluation>> {
        let query = format!(
            r#"
            SELECT {EVALUATION_COLUMNS}
            FROM evaluations
            WHERE user_id = $1 AND handled_by_admin_id IS NOT NULL
            ORDER BY handled_at DESC, id DESC
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, PgEvaluationRow>(&query)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(to_evaluation).transpose()
    }

    async fn latest_with_meeting(&self, owner: UserId) -> Result<Option<Evaluation>> {
        let query = format!(
            r#"
            SELECT {EVALUATION_COLUMNS}
            FROM evaluations
            WHERE user_id = $1 AND meeting_place IS NOT NULL
            ORDER BY submitted_at DESC, id DESC
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, PgEvaluationRow>(&query)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(to_evaluation).transpose()
    }

    async fn count_unhandled(&self) -> Result<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM evaluations WHERE handled_by_admin_id IS NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        Ok(count)
    }
}

// ── PgRevocationLedger ────────────────────────────────────────

pub struct PgRevocationLedger {
    pool: PgPool,
}

impl PgRevocationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationLedger for PgRevocationLedger {
    async fn revoke(&self, token_id: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO token_blocklist (jti, created_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(token_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM token_blocklist WHERE jti = $1)",
        )
        .bind(token_id)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)
    }
}
