//! Access Control Gate.
//!
//! Two checks live here and compose independently of each other:
//!
//! - [`AccessGate::admit`]: the revocation check. Runs after the server has
//!   verified the token signature and expiry.
//! - [`AccessGate::require_role`]: the role check. Reloads the caller from
//!   storage on every call, so a role change or deletion takes effect on the
//!   caller's very next request without a fresh login. A suspended account
//!   is refused here too, so tokens issued before the suspension stop working.

use std::sync::Arc;

use crate::error::BurnoutError;
use crate::ports::{Result, RevocationLedger, UserStore};
use crate::principal::{Principal, TokenClaims};
use crate::types::{Role, User};

#[derive(Clone)]
pub struct AccessGate {
    users: Arc<dyn UserStore>,
    ledger: Arc<dyn RevocationLedger>,
}

impl AccessGate {
    pub fn new(users: Arc<dyn UserStore>, ledger: Arc<dyn RevocationLedger>) -> Self {
        Self { users, ledger }
    }

    /// Turn verified claims into a principal unless the token was revoked.
    pub async fn admit(&self, claims: TokenClaims) -> Result<Principal> {
        if let Some(jti) = claims.jti.as_deref() {
            if self.ledger.is_revoked(jti).await? {
                tracing::warn!(user_id = claims.id, jti, "rejected revoked token");
                return Err(BurnoutError::TokenRevoked);
            }
        }
        Ok(Principal::from_claims(claims))
    }

    /// Load the caller and require it to be active with a stored role in `allowed`.
    pub async fn require_role(&self, principal: &Principal, allowed: &[Role]) -> Result<User> {
        match self.users.get(principal.user_id).await? {
            Some(user) if !user.is_active => {
                tracing::warn!(user_id = user.id, "suspended account presented a token");
                Err(BurnoutError::account_suspended())
            }
            Some(user) if allowed.contains(&user.role) => Ok(user),
            Some(user) => {
                tracing::debug!(
                    user_id = user.id,
                    role = %user.role,
                    "role not in allow-list {:?}",
                    allowed
                );
                Err(BurnoutError::access_forbidden())
            }
            None => Err(BurnoutError::access_forbidden()),
        }
    }

    pub async fn require_admin(&self, principal: &Principal) -> Result<User> {
        self.require_role(principal, &[Role::Admin]).await
    }

    /// Load the caller with any role. A caller whose account no longer
    /// exists, or is suspended, is refused.
    pub async fn current_user(&self, principal: &Principal) -> Result<User> {
        self.require_role(principal, &[Role::Student, Role::Staff, Role::Admin])
            .await
    }
}
