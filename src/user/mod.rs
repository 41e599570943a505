pub mod auth;
mod identity;
mod sqlite_user_store;
mod user_manager;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, PasswordCredentials, TokenPair};
pub use identity::{AuthError, Identity, IdentityService};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{UserManager, DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL};
pub use user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
