use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials, PasswordHasherKind};
use super::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, ForeignKey, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};
use tracing::info;

const USER_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_user_handle", "handle")],
};
const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "refresh_value",
            &SqlType::Text,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("expires", &SqlType::Integer, non_null = true),
        sqlite_column!("refresh_expires", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_auth_token_value", "value"),
        ("idx_auth_token_refresh_value", "refresh_value"),
    ],
};

const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        USER_PASSWORD_CREDENTIALS_V_0,
        AUTH_TOKEN_TABLE_V_0,
    ],
    migration: None,
}];

const AUTH_TOKEN_COLUMNS: &str = "user_id, value, refresh_value, created, expires, refresh_expires";

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn find_auth_token(&self, column: &str, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE {} = ?1",
                AUTH_TOKEN_COLUMNS, AUTH_TOKEN_TABLE_V_0.name, column
            ),
            params![value.0],
            auth_token_from_row,
        )
        .optional()
        .context("Failed to read auth token")
    }
}

fn system_time_from_column_result(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

fn system_time_to_column(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn auth_token_from_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        user_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        refresh_value: AuthTokenValue(row.get(2)?),
        created: system_time_from_column_result(row.get(3)?),
        expires: system_time_from_column_result(row.get(4)?),
        refresh_expires: system_time_from_column_result(row.get(5)?),
    })
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("INSERT INTO {} (handle) VALUES (?1)", USER_TABLE_V_0.name),
            params![user_handle],
        )
        .with_context(|| format!("Failed to create user {}", user_handle))?;
        let user_id = conn.last_insert_rowid() as usize;
        info!("Created user {} with id {}", user_handle, user_id);
        Ok(user_id)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT id FROM {} WHERE handle = ?1", USER_TABLE_V_0.name),
            params![user_handle],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to read user id")
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT handle FROM {} WHERE id = ?1", USER_TABLE_V_0.name),
            params![user_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to read user handle")
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT handle FROM {} ORDER BY handle",
            USER_TABLE_V_0.name
        ))?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(handles)
    }

    fn delete_user(&self, user_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", USER_TABLE_V_0.name),
            params![user_id],
        )?;
        Ok(deleted > 0)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.find_auth_token("value", value)
    }

    fn get_auth_token_by_refresh(
        &self,
        refresh_value: &AuthTokenValue,
    ) -> Result<Option<AuthToken>> {
        self.find_auth_token("refresh_value", refresh_value)
    }

    fn add_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                AUTH_TOKEN_TABLE_V_0.name, AUTH_TOKEN_COLUMNS
            ),
            params![
                token.user_id,
                token.value.0,
                token.refresh_value.0,
                system_time_to_column(token.created),
                system_time_to_column(token.expires),
                system_time_to_column(token.refresh_expires),
            ],
        )
        .context("Failed to store auth token")?;
        Ok(())
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let Some(token) = self.get_auth_token(value)? else {
            return Ok(None);
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("DELETE FROM {} WHERE value = ?1", AUTH_TOKEN_TABLE_V_0.name),
            params![value.0],
        )?;
        Ok(Some(token))
    }

    fn prune_expired_auth_tokens(&self, now: SystemTime) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE refresh_expires <= ?1",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![system_time_to_column(now)],
        )?;
        Ok(deleted)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_password_credentials(&self, user_id: usize) -> Result<Option<PasswordCredentials>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT user_id, salt, hash, hasher, created FROM {} WHERE user_id = ?1",
                    USER_PASSWORD_CREDENTIALS_V_0.name
                ),
                params![user_id],
                |row| {
                    Ok((
                        row.get::<usize, usize>(0)?,
                        row.get::<usize, String>(1)?,
                        row.get::<usize, String>(2)?,
                        row.get::<usize, String>(3)?,
                        row.get::<usize, i64>(4)?,
                    ))
                },
            )
            .optional()
            .context("Failed to read password credentials")?;

        let Some((user_id, salt, hash, hasher, created)) = row else {
            return Ok(None);
        };
        Ok(Some(PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher: PasswordHasherKind::from_str(&hasher)?,
            created: system_time_from_column_result(created),
        }))
    }

    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, salt, hash, hasher) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(user_id) DO UPDATE SET salt = excluded.salt, \
                 hash = excluded.hash, hasher = excluded.hasher",
                USER_PASSWORD_CREDENTIALS_V_0.name
            ),
            params![
                credentials.user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
            ],
        )
        .context("Failed to store password credentials")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteUserStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let temp_file_path = temp_dir.path().join("test.db");
        let store = SqliteUserStore::new(&temp_file_path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_create_user() {
        let (store, _temp_dir) = create_tmp_store();

        let user_id = store.create_user("test_user").unwrap();
        assert_eq!(user_id, 1);
        assert_eq!(store.get_user_id("test_user").unwrap(), Some(1));
        assert_eq!(
            store.get_user_handle(1).unwrap(),
            Some("test_user".to_string())
        );

        let duplicate_id = store.create_user("test_user");
        assert!(duplicate_id.is_err());
    }

    #[test]
    fn reopens_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.db");
        {
            let store = SqliteUserStore::new(&path).unwrap();
            store.create_user("admin").unwrap();
        }
        let store = SqliteUserStore::new(&path).unwrap();
        assert_eq!(store.get_all_user_handles().unwrap(), vec!["admin"]);
    }

    #[test]
    fn stores_and_replaces_password_credentials() {
        let (store, _temp_dir) = create_tmp_store();
        let user_id = store.create_user("admin").unwrap();
        assert!(store.get_password_credentials(user_id).unwrap().is_none());

        let first = PasswordCredentials::create(user_id, "one").unwrap();
        store.set_password_credentials(&first).unwrap();
        let second = PasswordCredentials::create(user_id, "two").unwrap();
        store.set_password_credentials(&second).unwrap();

        let stored = store.get_password_credentials(user_id).unwrap().unwrap();
        assert_eq!(stored.hash, second.hash);
        assert!(stored.matches("two").unwrap());
        assert!(!stored.matches("one").unwrap());
    }

    #[test]
    fn handles_auth_tokens() {
        let (store, _temp_dir) = create_tmp_store();
        let user_id = store.create_user("admin").unwrap();
        let token = AuthToken::issue(user_id, Duration::from_secs(60), Duration::from_secs(120));
        store.add_auth_token(&token).unwrap();

        let by_value = store.get_auth_token(&token.value).unwrap().unwrap();
        assert_eq!(by_value.refresh_value, token.refresh_value);
        let by_refresh = store
            .get_auth_token_by_refresh(&token.refresh_value)
            .unwrap()
            .unwrap();
        assert_eq!(by_refresh.value, token.value);

        assert!(store.delete_auth_token(&token.value).unwrap().is_some());
        assert!(store.get_auth_token(&token.value).unwrap().is_none());
        assert!(store.delete_auth_token(&token.value).unwrap().is_none());
    }

    #[test]
    fn prunes_expired_tokens() {
        let (store, _temp_dir) = create_tmp_store();
        let user_id = store.create_user("admin").unwrap();
        let token = AuthToken::issue(user_id, Duration::from_secs(1), Duration::from_secs(2));
        store.add_auth_token(&token).unwrap();

        let later = SystemTime::now() + Duration::from_secs(10);
        assert_eq!(store.prune_expired_auth_tokens(later).unwrap(), 1);
        assert!(store.get_auth_token(&token.value).unwrap().is_none());
    }

    #[test]
    fn deleting_user_cascades() {
        let (store, _temp_dir) = create_tmp_store();
        let user_id = store.create_user("admin").unwrap();
        store
            .set_password_credentials(&PasswordCredentials::create(user_id, "pw").unwrap())
            .unwrap();
        let token = AuthToken::issue(user_id, Duration::from_secs(60), Duration::from_secs(60));
        store.add_auth_token(&token).unwrap();

        assert!(store.delete_user(user_id).unwrap());
        assert!(store.get_auth_token(&token.value).unwrap().is_none());
        assert!(store.get_password_credentials(user_id).unwrap().is_none());
        assert!(!store.delete_user(user_id).unwrap());
    }
}
