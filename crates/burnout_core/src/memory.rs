//! In-memory implementation of every storage port.
//!
//! One lock guards users, evaluations and the revocation ledger together so
//! that the user → evaluation cascade and the handler reference check behave
//! like the relational schema. Used by tests and the server's `--memory` mode.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::BurnoutError;
use crate::ports::{EvaluationStore, Result, RevocationLedger, UserStore};
use crate::types::*;

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    evaluations: BTreeMap<EvaluationId, Evaluation>,
    revoked: HashMap<String, DateTime<Utc>>,
    next_user_id: UserId,
    next_evaluation_id: EvaluationId,
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_user() -> BurnoutError {
    BurnoutError::Conflict("User with that username or email already exists.".into())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut state = self.inner.write().await;
        if state
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(duplicate_user());
        }
        state.next_user_id += 1;
        let created = User {
            id: state.next_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.inner.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let state = self.inner.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let state = self.inner.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect())
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>> {
        let mut state = self.inner.write().await;
        let clash = state.users.values().any(|u| {
            u.id != id
                && (changes.username.as_deref() == Some(u.username.as_str())
                    || changes.email.as_deref() == Some(u.email.as_str()))
        });
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if clash {
            return Err(duplicate_user());
        }
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }

    async fn set_active(&self, id: UserId, is_active: bool) -> Result<Option<User>> {
        let mut state = self.inner.write().await;
        Ok(state.users.get_mut(&id).map(|user| {
            user.is_active = is_active;
            user.clone()
        }))
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let mut state = self.inner.write().await;
        if !state.users.contains_key(&id) {
            return Ok(false);
        }
        let referenced = state
            .evaluations
            .values()
            .any(|e| e.user_id != id && e.handling.is_some_and(|h| h.admin_id == id));
        if referenced {
            return Err(BurnoutError::Conflict(
                "User is recorded as the handler of existing evaluations.".into(),
            ));
        }
        state.users.remove(&id);
        state.evaluations.retain(|_, e| e.user_id != id);
        Ok(true)
    }
}

fn sorted(mut rows: Vec<Evaluation>, order: SortOrder) -> Vec<Evaluation> {
    rows.sort_by_key(|e| (e.submitted_at, e.id));
    if order == SortOrder::Newest {
        rows.reverse();
    }
    rows
}

#[async_trait]
impl EvaluationStore for MemoryStore {
    async fn insert(&self, evaluation: NewEvaluation) -> Result<Evaluation> {
        let mut state = self.inner.write().await;
        if !state.users.contains_key(&evaluation.user_id) {
            return Err(BurnoutError::NotFound("User not found.".into()));
        }
        state.next_evaluation_id += 1;
        let created = Evaluation {
            id: state.next_evaluation_id,
            user_id: evaluation.user_id,
            submitted_at: evaluation.submitted_at,
            answers: evaluation.answers,
            total_score: evaluation.total_score,
            needs_support: evaluation.needs_support,
            handling: None,
            meeting: None,
        };
        state.evaluations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: EvaluationId) -> Result<Option<Evaluation>> {
        Ok(self.inner.read().await.evaluations.get(&id).cloned())
    }

    async fn list(&self, owner: Option<UserId>, order: SortOrder) -> Result<Vec<Evaluation>> {
        let state = self.inner.read().await;
        let rows = state
            .evaluations
            .values()
            .filter(|e| owner.map_or(true, |o| e.user_id == o))
            .cloned()
            .collect();
        Ok(sorted(rows, order))
    }

    async fn delete(&self, id: EvaluationId) -> Result<bool> {
        Ok(self.inner.write().await.evaluations.remove(&id).is_some())
    }

    async fn set_meeting(
        &self,
        id: EvaluationId,
        meeting: &Meeting,
    ) -> Result<Option<Evaluation>> {
        let mut state = self.inner.write().await;
        Ok(state.evaluations.get_mut(&id).map(|e| {
            e.meeting = Some(meeting.clone());
            e.clone()
        }))
    }

    async fn mark_handled(
        &self,
        id: EvaluationId,
        admin_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<HandleOutcome>> {
        let mut state = self.inner.write().await;
        Ok(state.evaluations.get_mut(&id).map(|e| {
            if e.handling.is_some() {
                HandleOutcome::AlreadyHandled(e.clone())
            } else {
                e.handling = Some(Handling { admin_id, at });
                HandleOutcome::Handled(e.clone())
            }
        }))
    }

    async fn latest_handled(&self, owner: UserId) -> Result<Option<Evaluation>> {
        let state = self.inner.read().await;
        Ok(state
            .evaluations
            .values()
            .filter(|e| e.user_id == owner)
            .filter_map(|e| e.handling.map(|h| (h.at, e.id, e)))
            .max_by_key(|(at, id, _)| (*at, *id))
            .map(|(_, _, e)| e.clone()))
    }

    async fn latest_with_meeting(&self, owner: UserId) -> Result<Option<Evaluation>> {
        let state = self.inner.read().await;
        Ok(state
            .evaluations
            .values()
            .filter(|e| e.user_id == owner && e.meeting.is_some())
            .max_by_key(|e| (e.submitted_at, e.id))
            .cloned())
    }

    async fn count_unhandled(&self) -> Result<i64> {
        let state = self.inner.read().await;
        Ok(state
            .evaluations
            .values()
            .filter(|e| e.handling.is_none())
            .count() as i64)
    }
}

#[async_trait]
impl RevocationLedger for MemoryStore {
    async fn revoke(&self, token_id: &str, at: DateTime<Utc>) -> Result<()> {
        self.inner
            .write()
            .await
            .revoked
            .entry(token_id.to_string())
            .or_insert(at);
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool> {
        Ok(self.inner.read().await.revoked.contains_key(token_id))
    }
}
