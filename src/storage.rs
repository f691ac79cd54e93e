//! Key/value persistence tiers.
//!
//! The session tier lives for one app run; the durable tier is a SQLite
//! table. Both speak plain string values; callers serialize with
//! [`write_json`] and read back with [`read_json`], which treats a missing or
//! malformed value as absent.

use crate::error::StorageError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const MIGRATION_SQL_0001: &str = include_str!("../migrations/0001_storage.sql");

/// Session-tier key holding the favorite product ids.
pub const FAVORITES_KEY: &str = "favorites";
/// Session-tier key holding the collection graph.
pub const COLLECTIONS_KEY: &str = "collections";
/// Durable-tier key holding the explicitly tracked products.
pub const TRACKED_PRODUCTS_KEY: &str = "selectedProducts";

pub trait KeyValueStore: Send {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
  fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
  fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Reads and decodes `key`. Missing, unreadable or malformed values yield `None`.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
  let raw = match store.get(key) {
    Ok(Some(raw)) => raw,
    Ok(None) => return None,
    Err(error) => {
      log::warn!("could not read '{}' from storage: {}", key, error);
      return None;
    }
  };

  match serde_json::from_str(&raw) {
    Ok(value) => Some(value),
    Err(error) => {
      log::warn!("discarding malformed '{}' value: {}", key, error);
      None
    }
  }
}

pub fn write_json<T: Serialize + ?Sized>(
  store: &mut dyn KeyValueStore,
  key: &str,
  value: &T,
) -> Result<(), StorageError> {
  let encoded = serde_json::to_string(value)?;
  store.set(key, &encoded)
}

/// In-process tier, gone when the app exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: HashMap<String, String>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.entries.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
    self.entries.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StorageError> {
    self.entries.remove(key);
    Ok(())
  }
}

/// Durable tier backed by a single SQLite table.
pub struct SqliteStore {
  connection: Connection,
}

impl SqliteStore {
  pub fn open(db_path: &Path) -> Result<Self, StorageError> {
    if let Some(parent) = db_path.parent() {
      fs::create_dir_all(parent)?;
    }
    Self::init(Connection::open(db_path)?)
  }

  pub fn open_in_memory() -> Result<Self, StorageError> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(connection: Connection) -> Result<Self, StorageError> {
    connection.execute_batch(MIGRATION_SQL_0001)?;
    Ok(Self { connection })
  }
}

impl KeyValueStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    let value = self
      .connection
      .query_row(
        "SELECT value FROM kv_entries WHERE key = ?1 LIMIT 1",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
    self.connection.execute(
      "INSERT INTO kv_entries (key, value, updated_at)
       VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET
         value = excluded.value,
         updated_at = excluded.updated_at",
      params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StorageError> {
    self
      .connection
      .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_store_round_trips_and_removes() {
    let mut store = MemoryStore::new();
    store.set(FAVORITES_KEY, "[1,2]").unwrap();
    assert_eq!(store.get(FAVORITES_KEY).unwrap().as_deref(), Some("[1,2]"));

    store.remove(FAVORITES_KEY).unwrap();
    assert_eq!(store.get(FAVORITES_KEY).unwrap(), None);
  }

  #[test]
  fn sqlite_store_upserts() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.set(TRACKED_PRODUCTS_KEY, "[]").unwrap();
    store.set(TRACKED_PRODUCTS_KEY, "[{\"id\":1}]").unwrap();
    assert_eq!(
      store.get(TRACKED_PRODUCTS_KEY).unwrap().as_deref(),
      Some("[{\"id\":1}]")
    );
  }

  #[test]
  fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("savr.db");

    {
      let mut store = SqliteStore::open(&path).unwrap();
      write_json(&mut store, FAVORITES_KEY, &vec![3, 5]).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let favorites: Option<Vec<i64>> = read_json(&store, FAVORITES_KEY);
    assert_eq!(favorites, Some(vec![3, 5]));
  }

  #[test]
  fn malformed_and_missing_values_read_as_absent() {
    let mut store = MemoryStore::new();
    store.set(FAVORITES_KEY, "not json").unwrap();
    assert_eq!(read_json::<Vec<i64>>(&store, FAVORITES_KEY), None);
    assert_eq!(read_json::<Vec<i64>>(&store, COLLECTIONS_KEY), None);
  }
}
