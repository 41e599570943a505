use super::KeyValueStore;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// V 0
const KV_TABLE_V_0: Table = Table {
    name: "kv_store",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("value", &SqlType::Text, non_null = true),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};

const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[KV_TABLE_V_0],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteKeyValueStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn parse_value(key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Skipping unparsable value for key {}: {}", key, e);
            None
        }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", KV_TABLE_V_0.name),
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read key {}", key))?;
        Ok(raw.and_then(|raw| parse_value(key, &raw)))
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
                 updated = cast(strftime('%s','now') as int)",
                KV_TABLE_V_0.name
            ),
            params![key, value.to_string()],
        )
        .with_context(|| format!("Failed to write key {}", key))?;
        Ok(())
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT key, value FROM {} WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            KV_TABLE_V_0.name
        ))?;
        let rows = stmt
            .query_map(params![prefix], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to list prefix {}", prefix))?;
        Ok(rows
            .iter()
            .filter_map(|(key, raw)| parse_value(key, raw))
            .collect())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE key = ?1", KV_TABLE_V_0.name),
            params![key],
        )?;
        Ok(deleted > 0)
    }
}
