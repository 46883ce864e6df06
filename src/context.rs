//! Everything a screen needs to read and write backend data.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cache::QueryClient;
use crate::config::Config;
use crate::notify::{Navigator, Notifier};
use crate::session::{Session, SessionError};

/// Shared handles for hooks: API client, query cache, session, and the
/// notification and navigation sinks. Cheap to clone.
#[derive(Clone)]
pub struct AdminContext {
  pub api: ApiClient,
  pub queries: QueryClient,
  pub session: Session,
  pub notifier: Arc<dyn Notifier>,
  pub navigator: Arc<dyn Navigator>,
}

impl AdminContext {
  pub fn new(
    config: &Config,
    session: Session,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
  ) -> Result<Self, ApiError> {
    let api = ApiClient::new(&config.api, session.clone())?;
    let queries = QueryClient::new(config.cache.stale_time());
    Ok(Self {
      api,
      queries,
      session,
      notifier,
      navigator,
    })
  }

  /// Clear the persisted session and drop every cached query, so nothing
  /// fetched under the old credential survives.
  pub fn logout(&self) -> Result<(), SessionError> {
    self.session.logout()?;
    self.queries.clear();
    Ok(())
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use super::*;
  use crate::config::ApiConfig;
  use crate::notify::testing::Recorder;

  /// Context against `base_url` with an in-memory session and a recorder
  /// for notifications and navigation.
  pub fn context(base_url: &str) -> (AdminContext, Arc<Recorder>) {
    context_with(base_url, Session::in_memory())
  }

  /// Like [`context`] over a caller-supplied session.
  pub fn context_with(base_url: &str, session: Session) -> (AdminContext, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let config = Config {
      api: ApiConfig {
        base_url: base_url.to_string(),
        ..ApiConfig::default()
      },
      ..Config::default()
    };
    let ctx = AdminContext::new(
      &config,
      session,
      recorder.clone(),
      recorder.clone(),
    )
    .unwrap();
    (ctx, recorder)
  }
}

#[cfg(test)]
mod tests {
  use super::testing::context;
  use crate::cache::{QueryKey, QueryTag};
  use crate::session::{OneTimeToken, SessionKey};

  #[test]
  fn test_logout_clears_session_and_cache() {
    let (ctx, _) = context("http://127.0.0.1:9/");
    ctx.session.set_token("abc").unwrap();
    ctx
      .session
      .set_one_time(OneTimeToken::SignupActivation, "act")
      .unwrap();
    ctx
      .session
      .set_json(SessionKey::SelectedTab, &"orders")
      .unwrap();
    ctx
      .queries
      .set_data(&QueryKey::new(QueryTag::Offers), vec![1u32]);

    ctx.logout().unwrap();

    assert_eq!(ctx.session.token().unwrap(), None);
    assert_eq!(
      ctx.session.one_time(OneTimeToken::SignupActivation).unwrap(),
      None
    );
    assert_eq!(
      ctx.session.get_json::<String>(SessionKey::SelectedTab).unwrap(),
      None
    );
    assert!(ctx.queries.is_empty());
  }
}
