//! HS256 access tokens: signing, verification and the bearer middleware.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
    Extension,
};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use burnout_core::ports::{IssuedToken, TokenIssuer};
use burnout_core::types::User;
use burnout_core::{AccessGate, BurnoutError, TokenClaims};

use crate::error::AppError;

const DEFAULT_TTL_SECS: i64 = 3600;

/// Keys and lifetime for access tokens. Shared with handlers via `Extension`.
#[derive(Clone)]
pub struct JwtConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl JwtConfig {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    pub fn with_ttl(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn encode(&self, claims: &TokenClaims) -> Result<String, BurnoutError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| BurnoutError::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }

    /// Verify signature and expiry. Revocation is checked separately.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, BurnoutError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    BurnoutError::Unauthenticated("Token has expired.".into())
                }
                _ => BurnoutError::Unauthenticated("Invalid token.".into()),
            })
    }
}

impl TokenIssuer for JwtConfig {
    fn issue(&self, user: &User) -> Result<IssuedToken, BurnoutError> {
        let now = chrono::Utc::now().timestamp();
        let token_id = uuid::Uuid::new_v4().to_string();
        let claims = TokenClaims {
            id: user.id,
            role: user.role,
            username: user.username.clone(),
            jti: Some(token_id.clone()),
            iat: now,
            exp: now + self.ttl_secs,
        };
        Ok(IssuedToken {
            token: self.encode(&claims)?,
            token_id,
        })
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Require a valid, unrevoked bearer token and attach the caller's
/// [`burnout_core::Principal`] to the request.
pub async fn jwt_auth(
    Extension(jwt): Extension<JwtConfig>,
    Extension(gate): Extension<AccessGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or_else(|| {
        BurnoutError::Unauthenticated("Missing Authorization Header".into())
    })?;
    let claims = jwt.decode(token).inspect_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
    })?;
    let principal = gate.admit(claims).await?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use burnout_core::types::Role;

    fn user() -> User {
        User {
            id: 42,
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            role: Role::Student,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_decodes_with_unique_jti() {
        let jwt = JwtConfig::from_secret(b"unit-secret").with_ttl(60);
        let first = jwt.issue(&user()).unwrap();
        let second = jwt.issue(&user()).unwrap();
        assert_ne!(first.token_id, second.token_id);

        let claims = jwt.decode(&first.token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.jti.as_deref(), Some(first.token_id.as_str()));
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn wrong_secret_is_unauthenticated() {
        let issued = JwtConfig::from_secret(b"one").issue(&user()).unwrap();
        let err = JwtConfig::from_secret(b"two").decode(&issued.token).unwrap_err();
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtConfig::from_secret(b"unit-secret");
        let now = Utc::now().timestamp();
        let token = jwt
            .encode(&TokenClaims {
                id: 1,
                role: Role::Admin,
                username: "root".into(),
                jti: None,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        let err = jwt.decode(&token).unwrap_err();
        assert_eq!(err.to_string(), "Token has expired.");
    }
}
