use serde::Serialize;
use thiserror::Error;

/// The authenticated caller of a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: usize,
    pub handle: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Auth store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// Verifies bearer credentials.
pub trait IdentityService: Send + Sync {
    /// Returns Ok(None) if the token is unknown or expired.
    fn verify(&self, access_token: &str) -> Result<Option<Identity>, AuthError>;
}
