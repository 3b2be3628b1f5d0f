use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// Claims carried by an access token.
///
/// `role` and `username` are informational; authorization decisions reload
/// the user from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: UserId,
    pub role: Role,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller of an operation.
///
/// Built once per request by the server middleware after the token signature
/// and revocation checks pass. Core logic never reads raw tokens.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub token_role: Role,
    pub token_id: Option<String>,
}

impl Principal {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.id,
            username: claims.username,
            token_role: claims.role,
            token_id: claims.jti,
        }
    }

    /// Construct explicitly for in-process callers and tests.
    pub fn in_process(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            token_role: role,
            token_id: None,
        }
    }

    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }
}
