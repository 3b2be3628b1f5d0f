use thiserror::Error;

use crate::password::PASSWORD_RULES;

#[derive(Debug, Error)]
pub enum BurnoutError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", PASSWORD_RULES)]
    WeakPassword,

    #[error("{0}")]
    InvalidTarget(String),

    #[error("Token does not contain a jti")]
    BadToken,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Token has been revoked. Please log in again.")]
    TokenRevoked,

    #[error("Invalid username/email or password.")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl BurnoutError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::WeakPassword | Self::InvalidTarget(_) | Self::BadToken => {
                400
            }
            Self::Unauthenticated(_) | Self::TokenRevoked | Self::InvalidCredentials => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Refusal for an account an admin has deactivated.
    pub fn account_suspended() -> Self {
        Self::Forbidden("Account is suspended.".into())
    }

    /// The standard refusal for a caller whose stored role is not allowed.
    pub fn access_forbidden() -> Self {
        Self::Forbidden(
            "Access forbidden: you don't have the required permissions to access this resource."
                .into(),
        )
    }
}
