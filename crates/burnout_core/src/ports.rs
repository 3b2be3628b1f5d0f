//! Storage and token port traits.
//! Implemented by burnout_postgres and by [`crate::memory::MemoryStore`];
//! core logic depends only on these traits.
//!
//! Every method is one independently committed unit of work. Implementations
//! must not hold state between calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BurnoutError;
use crate::types::*;

pub type Result<T> = std::result::Result<T, BurnoutError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Duplicate username or email is a `Conflict`.
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn get(&self, id: UserId) -> Result<Option<User>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// First user whose username equals `username` OR whose email equals `email`.
    async fn find_by_username_or_email(&self, username: &str, email: &str)
        -> Result<Option<User>>;

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>>;

    /// Apply a partial update. `Ok(None)` when the user does not exist.
    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>>;

    async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>>;

    /// Delete a user and, by cascade, their evaluations. Returns false when
    /// absent. Fails with `Conflict` while the user is recorded as the
    /// handler of any evaluation.
    async fn delete(&self, id: UserId) -> Result<bool>;
}

#[async_trait]
pub trait EvaluationStore: Send + Sync {
    async fn insert(&self, evaluation: NewEvaluation) -> Result<Evaluation>;

    async fn get(&self, id: EvaluationId) -> Result<Option<Evaluation>>;

    /// All evaluations, or one owner's, ordered by submission time.
    async fn list(&self, owner: Option<UserId>, order: SortOrder) -> Result<Vec<Evaluation>>;

    async fn delete(&self, id: EvaluationId) -> Result<bool>;

    /// Overwrite all four meeting fields. `Ok(None)` when absent.
    async fn set_meeting(&self, id: EvaluationId, meeting: &Meeting)
        -> Result<Option<Evaluation>>;

    /// Set the handling fields only if they are unset. `Ok(None)` when absent.
    async fn mark_handled(
        &self,
        id: EvaluationId,
        admin_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<HandleOutcome>>;

    /// The owner's handled evaluation with the latest handling time.
    async fn latest_handled(&self, owner: UserId) -> Result<Option<Evaluation>>;

    /// The owner's latest-submitted evaluation that has a meeting.
    async fn latest_with_meeting(&self, owner: UserId) -> Result<Option<Evaluation>>;

    async fn count_unhandled(&self) -> Result<i64>;
}

/// Append-only set of revoked token identifiers.
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Record a revocation. Revoking an already revoked id is a no-op.
    async fn revoke(&self, token_id: &str, at: DateTime<Utc>) -> Result<()>;

    async fn is_revoked(&self, token_id: &str) -> Result<bool>;
}

/// A freshly minted access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
}

/// Signs access tokens. The server provides the JWT implementation.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<IssuedToken>;
}
