//! Session storage trait and SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{Scope, SessionError};

/// Trait for session storage backends.
///
/// Values are plain strings keyed by scope and name; structured values are
/// serialized by the caller.
pub trait SessionStorage: Send + Sync {
  fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, SessionError>;

  fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), SessionError>;

  fn remove(&self, scope: Scope, key: &str) -> Result<(), SessionError>;

  /// Remove several keys atomically.
  fn remove_all(&self, keys: &[(Scope, &str)]) -> Result<(), SessionError>;
}

/// In-process storage; nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
  values: Mutex<HashMap<(Scope, String), String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn values(&self) -> std::sync::MutexGuard<'_, HashMap<(Scope, String), String>> {
    self.values.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl SessionStorage for MemoryStorage {
  fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, SessionError> {
    Ok(self.values().get(&(scope, key.to_string())).cloned())
  }

  fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), SessionError> {
    self
      .values()
      .insert((scope, key.to_string()), value.to_string());
    Ok(())
  }

  fn remove(&self, scope: Scope, key: &str) -> Result<(), SessionError> {
    self.values().remove(&(scope, key.to_string()));
    Ok(())
  }

  fn remove_all(&self, keys: &[(Scope, &str)]) -> Result<(), SessionError> {
    let mut values = self.values();
    for (scope, key) in keys {
      values.remove(&(*scope, key.to_string()));
    }
    Ok(())
  }
}

/// SQLite-based session storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the session database at the default location.
  pub fn open_default() -> Result<Self, SessionError> {
    Self::open(&Self::default_path()?)
  }

  /// Open or create the session database at `path`.
  pub fn open(path: &Path) -> Result<Self, SessionError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        SessionError::Storage(format!("Failed to create session directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      SessionError::Storage(format!(
        "Failed to open session database at {}: {}",
        path.display(),
        e
      ))
    })?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, SessionError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| SessionError::Storage("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("storedesk").join("session.db"))
  }

  fn run_migrations(&self) -> Result<(), SessionError> {
    let conn = self.lock()?;
    conn
      .execute_batch(SESSION_SCHEMA)
      .map_err(|e| SessionError::Storage(format!("Failed to run session migrations: {}", e)))?;
    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SessionError> {
    self
      .conn
      .lock()
      .map_err(|e| SessionError::Storage(format!("Lock poisoned: {}", e)))
  }
}

/// Schema for session tables.
const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session_values (
    scope TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope, key)
);
"#;

impl SessionStorage for SqliteStorage {
  fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, SessionError> {
    let conn = self.lock()?;
    conn
      .query_row(
        "SELECT value FROM session_values WHERE scope = ? AND key = ?",
        params![scope.as_str(), key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| SessionError::Storage(format!("Failed to read {}: {}", key, e)))
  }

  fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), SessionError> {
    let conn = self.lock()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO session_values (scope, key, value, updated_at)
         VALUES (?, ?, ?, datetime('now'))",
        params![scope.as_str(), key, value],
      )
      .map_err(|e| SessionError::Storage(format!("Failed to store {}: {}", key, e)))?;
    Ok(())
  }

  fn remove(&self, scope: Scope, key: &str) -> Result<(), SessionError> {
    let conn = self.lock()?;
    conn
      .execute(
        "DELETE FROM session_values WHERE scope = ? AND key = ?",
        params![scope.as_str(), key],
      )
      .map_err(|e| SessionError::Storage(format!("Failed to remove {}: {}", key, e)))?;
    Ok(())
  }

  fn remove_all(&self, keys: &[(Scope, &str)]) -> Result<(), SessionError> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| SessionError::Storage(format!("Failed to begin transaction: {}", e)))?;

    for (scope, key) in keys {
      tx.execute(
        "DELETE FROM session_values WHERE scope = ? AND key = ?",
        params![scope.as_str(), key],
      )
      .map_err(|e| SessionError::Storage(format!("Failed to remove {}: {}", key, e)))?;
    }

    tx.commit()
      .map_err(|e| SessionError::Storage(format!("Failed to commit transaction: {}", e)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sqlite_roundtrip_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.db");

    {
      let storage = SqliteStorage::open(&path).unwrap();
      storage.set(Scope::Cookie, "token", "abc").unwrap();
      storage.set(Scope::Local, "token", "other").unwrap();
    }

    let storage = SqliteStorage::open(&path).unwrap();
    assert_eq!(
      storage.get(Scope::Cookie, "token").unwrap().as_deref(),
      Some("abc")
    );
    assert_eq!(
      storage.get(Scope::Local, "token").unwrap().as_deref(),
      Some("other")
    );
  }

  #[test]
  fn test_sqlite_remove_all() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("s.db")).unwrap();
    storage.set(Scope::Cookie, "a", "1").unwrap();
    storage.set(Scope::Local, "b", "2").unwrap();
    storage.set(Scope::Local, "c", "3").unwrap();

    storage
      .remove_all(&[(Scope::Cookie, "a"), (Scope::Local, "b"), (Scope::Local, "missing")])
      .unwrap();

    assert_eq!(storage.get(Scope::Cookie, "a").unwrap(), None);
    assert_eq!(storage.get(Scope::Local, "b").unwrap(), None);
    assert_eq!(storage.get(Scope::Local, "c").unwrap().as_deref(), Some("3"));
  }

  #[test]
  fn test_memory_overwrite_and_remove() {
    let storage = MemoryStorage::new();
    storage.set(Scope::Local, "tab", "orders").unwrap();
    storage.set(Scope::Local, "tab", "products").unwrap();
    assert_eq!(
      storage.get(Scope::Local, "tab").unwrap().as_deref(),
      Some("products")
    );

    storage.remove(Scope::Local, "tab").unwrap();
    assert_eq!(storage.get(Scope::Local, "tab").unwrap(), None);
  }
}
