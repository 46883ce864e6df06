//! Persisted client session.
//!
//! Holds the session token, the signed-in user projection, one-time tokens
//! for the password reset / email change / signup activation flows, and a few
//! client-only values (cart, checkout, UI preferences). Every value lives
//! under a fixed [`SessionKey`].

mod jwt;
mod storage;

pub use jwt::{is_expired, token_expiry};
pub use storage::{MemoryStorage, SessionStorage, SqliteStorage};

#[cfg(test)]
pub(crate) use jwt::encode_test_token;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("{0}")]
  Storage(String),
  #[error("failed to (de)serialize session value: {0}")]
  Serde(#[from] serde_json::Error),
}

/// Where a value is kept. Cookie values travel with requests; local values
/// are client-only flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
  Cookie,
  Local,
}

impl Scope {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Cookie => "cookie",
      Self::Local => "local",
    }
  }
}

/// Registry of persisted keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
  Token,
  User,
  PasswordResetToken,
  EmailChangeToken,
  SignupActivationToken,
  OtpResend,
  Cart,
  Checkout,
  SelectedTab,
  CalendarState,
}

impl SessionKey {
  pub const ALL: [SessionKey; 10] = [
    Self::Token,
    Self::User,
    Self::PasswordResetToken,
    Self::EmailChangeToken,
    Self::SignupActivationToken,
    Self::OtpResend,
    Self::Cart,
    Self::Checkout,
    Self::SelectedTab,
    Self::CalendarState,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::Token => "token",
      Self::User => "user",
      Self::PasswordResetToken => "reset_password_token",
      Self::EmailChangeToken => "change_email_token",
      Self::SignupActivationToken => "activation_token",
      Self::OtpResend => "resend_otp_payload",
      Self::Cart => "cart",
      Self::Checkout => "checkout",
      Self::SelectedTab => "selected_tab",
      Self::CalendarState => "calendar_state",
    }
  }

  pub fn scope(self) -> Scope {
    match self {
      Self::Token | Self::User => Scope::Cookie,
      _ => Scope::Local,
    }
  }
}

/// Keys cleared on logout.
pub const LOGOUT_KEYS: [SessionKey; 10] = SessionKey::ALL;

/// One-time tokens handed out during multi-step account flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneTimeToken {
  PasswordReset,
  EmailChange,
  SignupActivation,
}

impl OneTimeToken {
  fn key(self) -> SessionKey {
    match self {
      Self::PasswordReset => SessionKey::PasswordResetToken,
      Self::EmailChange => SessionKey::EmailChangeToken,
      Self::SignupActivation => SessionKey::SignupActivationToken,
    }
  }
}

/// Minimal projection of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
  #[serde(alias = "_id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub role: String,
  #[serde(default)]
  pub avatar: Option<String>,
}

/// Handle to the persisted session. Cheap to clone.
#[derive(Clone)]
pub struct Session {
  storage: Arc<dyn SessionStorage>,
}

impl Session {
  pub fn new(storage: impl SessionStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Session backed by process memory only.
  pub fn in_memory() -> Self {
    Self::new(MemoryStorage::new())
  }

  fn get_raw(&self, key: SessionKey) -> Result<Option<String>, SessionError> {
    self.storage.get(key.scope(), key.name())
  }

  fn set_raw(&self, key: SessionKey, value: &str) -> Result<(), SessionError> {
    debug!(key = key.name(), scope = key.scope().as_str(), "storing session value");
    self.storage.set(key.scope(), key.name(), value)
  }

  fn remove_raw(&self, key: SessionKey) -> Result<(), SessionError> {
    self.storage.remove(key.scope(), key.name())
  }

  /// Store any serializable value under a key.
  pub fn set_json<T: Serialize>(&self, key: SessionKey, value: &T) -> Result<(), SessionError> {
    self.set_raw(key, &serde_json::to_string(value)?)
  }

  pub fn get_json<T: DeserializeOwned>(&self, key: SessionKey) -> Result<Option<T>, SessionError> {
    match self.get_raw(key)? {
      Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
      None => Ok(None),
    }
  }

  pub fn remove(&self, key: SessionKey) -> Result<(), SessionError> {
    self.remove_raw(key)
  }

  // ==========================================================================
  // Token
  // ==========================================================================

  pub fn set_token(&self, token: &str) -> Result<(), SessionError> {
    self.set_raw(SessionKey::Token, token)
  }

  /// The stored token; empty values count as absent.
  pub fn token(&self) -> Result<Option<String>, SessionError> {
    Ok(self.get_raw(SessionKey::Token)?.filter(|t| !t.is_empty()))
  }

  pub fn remove_token(&self) -> Result<(), SessionError> {
    self.remove_raw(SessionKey::Token)
  }

  /// A token is present and not past its `exp` claim.
  ///
  /// Presence does not prove the backend still accepts the token.
  pub fn is_authenticated(&self, now: DateTime<Utc>) -> Result<bool, SessionError> {
    Ok(self.token()?.is_some_and(|t| !is_expired(&t, now)))
  }

  // ==========================================================================
  // User projection
  // ==========================================================================

  pub fn set_user(&self, user: &SessionUser) -> Result<(), SessionError> {
    self.set_json(SessionKey::User, user)
  }

  pub fn user(&self) -> Result<Option<SessionUser>, SessionError> {
    self.get_json(SessionKey::User)
  }

  pub fn remove_user(&self) -> Result<(), SessionError> {
    self.remove_raw(SessionKey::User)
  }

  // ==========================================================================
  // One-time flow tokens
  // ==========================================================================

  pub fn set_one_time(&self, kind: OneTimeToken, token: &str) -> Result<(), SessionError> {
    self.set_raw(kind.key(), token)
  }

  pub fn one_time(&self, kind: OneTimeToken) -> Result<Option<String>, SessionError> {
    self.get_raw(kind.key())
  }

  pub fn remove_one_time(&self, kind: OneTimeToken) -> Result<(), SessionError> {
    self.remove_raw(kind.key())
  }

  /// Clear every key in [`LOGOUT_KEYS`].
  pub fn logout(&self) -> Result<(), SessionError> {
    let keys: Vec<(Scope, &str)> = LOGOUT_KEYS.iter().map(|k| (k.scope(), k.name())).collect();
    self.storage.remove_all(&keys)?;
    info!("session cleared");
    Ok(())
  }
}
