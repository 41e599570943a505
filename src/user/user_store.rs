use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials};
use anyhow::Result;
use std::time::SystemTime;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's password credentials.
    /// Returns Ok(None) if the user has none.
    fn get_password_credentials(&self, user_id: usize) -> Result<Option<PasswordCredentials>>;

    /// Creates or replaces the user's password credentials.
    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns the token whose access value is `value`.
    /// Returns Ok(None) if the token does not exist.
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Returns the token whose refresh value is `refresh_value`.
    fn get_auth_token_by_refresh(&self, refresh_value: &AuthTokenValue)
        -> Result<Option<AuthToken>>;

    fn add_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Deletes a token given its access value, returning it if it existed.
    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes every token whose refresh window closed before `now`.
    /// Returns the number of tokens that were deleted.
    fn prune_expired_auth_tokens(&self, now: SystemTime) -> Result<usize>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;

    fn get_all_user_handles(&self) -> Result<Vec<String>>;

    /// Deletes a user along with its credentials and tokens.
    /// Returns false if the user did not exist.
    fn delete_user(&self, user_id: usize) -> Result<bool>;
}
