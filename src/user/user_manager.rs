use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials, TokenPair};
use super::identity::{AuthError, Identity, IdentityService};
use super::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use anyhow::{bail, Context, Result};
use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};
use tracing::{debug, info};

pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub struct UserManager {
    user_store: Arc<Mutex<Box<dyn UserStore>>>,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl UserManager {
    pub fn new(user_store: Box<dyn UserStore>) -> Self {
        Self {
            user_store: Arc::new(Mutex::new(user_store)),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
        }
    }

    pub fn with_token_ttls(mut self, access_token_ttl: Duration, refresh_token_ttl: Duration) -> Self {
        self.access_token_ttl = access_token_ttl;
        self.refresh_token_ttl = refresh_token_ttl;
        self
    }

    pub fn add_user<T: AsRef<str>>(&self, user_handle: T) -> Result<usize> {
        let user_handle = user_handle.as_ref().trim();
        if user_handle.is_empty() {
            bail!("The user handle cannot be empty.")
        }

        let locked_store = self.user_store.lock().unwrap();
        if locked_store.get_user_id(user_handle)?.is_some() {
            bail!("User handle already exists.");
        }
        locked_store.create_user(user_handle)
    }

    /// Sets (or replaces) the password of an existing user.
    pub fn set_password(&self, user_handle: &str, password: &str) -> Result<()> {
        if password.is_empty() {
            bail!("The password cannot be empty.");
        }
        let locked_store = self.user_store.lock().unwrap();
        let user_id = locked_store
            .get_user_id(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        let credentials = PasswordCredentials::create(user_id, password)?;
        locked_store.set_password_credentials(&credentials)
    }

    /// Returns Ok(false) for unknown users, users without a password and wrong passwords alike.
    pub fn check_password(&self, user_handle: &str, password: &str) -> Result<bool> {
        Ok(self.verified_user_id(user_handle, password)?.is_some())
    }

    fn verified_user_id(&self, user_handle: &str, password: &str) -> Result<Option<usize>> {
        let locked_store = self.user_store.lock().unwrap();
        let Some(user_id) = locked_store.get_user_id(user_handle)? else {
            return Ok(None);
        };
        let Some(credentials) = locked_store.get_password_credentials(user_id)? else {
            return Ok(None);
        };
        Ok(credentials.matches(password)?.then_some(user_id))
    }

    pub fn delete_user(&self, user_handle: &str) -> Result<bool> {
        let locked_store = self.user_store.lock().unwrap();
        match locked_store.get_user_id(user_handle)? {
            Some(user_id) => locked_store.delete_user(user_id),
            None => Ok(false),
        }
    }

    pub fn get_all_user_handles(&self) -> Result<Vec<String>> {
        self.user_store.lock().unwrap().get_all_user_handles()
    }

    fn issue_token(&self, user_id: usize) -> Result<TokenPair> {
        let token = AuthToken::issue(user_id, self.access_token_ttl, self.refresh_token_ttl);
        self.user_store.lock().unwrap().add_auth_token(&token)?;
        Ok(TokenPair::from_token(&token))
    }

    pub fn login(&self, user_handle: &str, password: &str) -> Result<TokenPair, AuthError> {
        let Some(user_id) = self.verified_user_id(user_handle, password)? else {
            debug!("Rejected login for {}", user_handle);
            return Err(AuthError::InvalidCredentials);
        };
        let pair = self.issue_token(user_id)?;
        info!("User {} logged in", user_handle);
        Ok(pair)
    }

    /// Trades a refresh token for a new token pair; the old pair stops working.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let refresh_value = AuthTokenValue(refresh_token.to_string());
        let token = {
            let locked_store = self.user_store.lock().unwrap();
            let token = locked_store
                .get_auth_token_by_refresh(&refresh_value)?
                .ok_or(AuthError::InvalidRefreshToken)?;
            locked_store.delete_auth_token(&token.value)?;
            token
        };
        if token.is_refresh_expired_at(SystemTime::now()) {
            return Err(AuthError::InvalidRefreshToken);
        }
        Ok(self.issue_token(token.user_id)?)
    }

    /// Returns false if the token was not known.
    pub fn logout(&self, access_token: &str) -> Result<bool, AuthError> {
        let removed = self
            .user_store
            .lock()
            .unwrap()
            .delete_auth_token(&AuthTokenValue(access_token.to_string()))?;
        Ok(removed.is_some())
    }

    pub fn prune_expired_tokens(&self) -> Result<usize> {
        let pruned = self
            .user_store
            .lock()
            .unwrap()
            .prune_expired_auth_tokens(SystemTime::now())?;
        if pruned > 0 {
            info!("Pruned {} expired auth tokens", pruned);
        }
        Ok(pruned)
    }
}

impl IdentityService for UserManager {
    fn verify(&self, access_token: &str) -> Result<Option<Identity>, AuthError> {
        let locked_store = self.user_store.lock().unwrap();
        let Some(token) = locked_store.get_auth_token(&AuthTokenValue(access_token.to_string()))?
        else {
            return Ok(None);
        };
        if token.is_expired_at(SystemTime::now()) {
            return Ok(None);
        }
        let Some(handle) = locked_store.get_user_handle(token.user_id)? else {
            return Ok(None);
        };
        Ok(Some(Identity {
            user_id: token.user_id,
            handle,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::SqliteUserStore;
    use tempfile::TempDir;

    fn create_manager() -> (UserManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteUserStore::new(temp_dir.path().join("user.db")).unwrap();
        let manager = UserManager::new(Box::new(store));
        manager.add_user("admin").unwrap();
        manager.set_password("admin", "secret").unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn rejects_duplicate_and_empty_handles() {
        let (manager, _dir) = create_manager();
        assert!(manager.add_user("admin").is_err());
        assert!(manager.add_user("  ").is_err());
    }

    #[test]
    fn checks_passwords() {
        let (manager, _dir) = create_manager();
        assert!(manager.check_password("admin", "secret").unwrap());
        assert!(!manager.check_password("admin", "nope").unwrap());
        assert!(!manager.check_password("ghost", "secret").unwrap());
        assert!(manager.set_password("ghost", "x").is_err());
    }

    #[test]
    fn login_then_verify_then_logout() {
        let (manager, _dir) = create_manager();
        assert!(matches!(
            manager.login("admin", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));

        let pair = manager.login("admin", "secret").unwrap();
        assert_eq!(pair.expires_in, DEFAULT_ACCESS_TOKEN_TTL.as_secs());
        let identity = manager.verify(&pair.access_token).unwrap().unwrap();
        assert_eq!(identity.handle, "admin");
        assert!(manager.verify("garbage").unwrap().is_none());

        assert!(manager.logout(&pair.access_token).unwrap());
        assert!(manager.verify(&pair.access_token).unwrap().is_none());
        assert!(!manager.logout(&pair.access_token).unwrap());
    }

    #[test]
    fn refresh_rotates_tokens() {
        let (manager, _dir) = create_manager();
        let first = manager.login("admin", "secret").unwrap();
        let second = manager.refresh(&first.refresh_token).unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert!(manager.verify(&first.access_token).unwrap().is_none());
        assert!(manager.verify(&second.access_token).unwrap().is_some());
        assert!(matches!(
            manager.refresh(&first.refresh_token),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteUserStore::new(temp_dir.path().join("user.db")).unwrap();
        let manager = UserManager::new(Box::new(store))
            .with_token_ttls(Duration::ZERO, Duration::from_secs(60));
        manager.add_user("admin").unwrap();
        manager.set_password("admin", "secret").unwrap();

        let pair = manager.login("admin", "secret").unwrap();
        assert!(manager.verify(&pair.access_token).unwrap().is_none());
        assert!(manager.refresh(&pair.refresh_token).is_ok());
    }

    #[test]
    fn deleting_user_revokes_tokens() {
        let (manager, _dir) = create_manager();
        let pair = manager.login("admin", "secret").unwrap();
        assert!(manager.delete_user("admin").unwrap());
        assert!(manager.verify(&pair.access_token).unwrap().is_none());
        assert!(manager.get_all_user_handles().unwrap().is_empty());
    }
}
