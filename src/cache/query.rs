//! Query observer: one consumer's view of a cached read.
//!
//! Inspired by TanStack Query. A `Query` binds a [`QueryKey`] to a fetcher
//! and reads through the shared [`QueryClient`], so any number of observers
//! of the same key cause a single request.
//!
//! # Example
//!
//! ```ignore
//! let api = api_client.clone();
//! let mut query = Query::new(queries.clone(), QueryKey::new(QueryTag::Offers), move || {
//!     let api = api.clone();
//!     async move { api.call(endpoints::offers::offers(&params)).await?.into_result() }
//! });
//!
//! // Start fetching
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::ApiError;

use super::client::QueryClient;
use super::key::QueryKey;

/// Lifecycle of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Not started, or disabled
  Idle,
  /// A fetch is pending
  Loading,
  Success,
  Error,
}

/// Read options.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
  /// Fetches are skipped while false (e.g., until an id is known)
  pub enabled: bool,
  /// Overrides the client's default stale time
  pub stale_time: Option<Duration>,
  /// Keep showing the last data while a new key loads
  pub keep_previous_data: bool,
  /// Refetch stale data when the view regains focus
  pub refetch_on_focus: bool,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      enabled: true,
      stale_time: None,
      keep_previous_data: false,
      refetch_on_focus: true,
    }
  }
}

/// A boxed future that returns a Result<T, ApiError>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Arc<dyn Fn() -> BoxFuture<T> + Send + Sync>;

type SelectFn<T, S> = Arc<dyn Fn(&T) -> S + Send + Sync>;

/// Observer of one cache key.
///
/// `T` is the cached payload, `S` what this observer exposes after `select`.
/// Dropping the observer, or switching it to another key, aborts its pending
/// fetch so a late response is never applied to it.
pub struct Query<T, S = T> {
  client: QueryClient,
  key: QueryKey,
  fetcher: FetcherFn<T>,
  select: SelectFn<T, S>,
  options: QueryOptions,
  status: QueryStatus,
  data: Option<S>,
  error: Option<ApiError>,
  is_previous_data: bool,
  receiver: Option<mpsc::UnboundedReceiver<Result<Arc<T>, ApiError>>>,
  task: Option<JoinHandle<()>>,
}

impl<T> Query<T, T>
where
  T: Clone + Send + Sync + 'static,
{
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It is only called when
  /// the cache has no fresh data and no request in flight for `key`.
  pub fn new<F, Fut>(client: QueryClient, key: QueryKey, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    Self {
      client,
      key,
      fetcher: Arc::new(move || -> BoxFuture<T> { Box::pin(fetcher()) }),
      select: Arc::new(T::clone),
      options: QueryOptions::default(),
      status: QueryStatus::Idle,
      data: None,
      error: None,
      is_previous_data: false,
      receiver: None,
      task: None,
    }
  }
}

impl<T, S> Query<T, S>
where
  T: Send + Sync + 'static,
  S: 'static,
{
  /// Reshape the payload before it reaches this observer.
  pub fn select<S2>(self, select: impl Fn(&T) -> S2 + Send + Sync + 'static) -> Query<T, S2> {
    Query {
      client: self.client.clone(),
      key: self.key.clone(),
      fetcher: Arc::clone(&self.fetcher),
      select: Arc::new(select),
      options: self.options,
      status: QueryStatus::Idle,
      data: None,
      error: None,
      is_previous_data: false,
      receiver: None,
      task: None,
    }
  }

  pub fn with_options(mut self, options: QueryOptions) -> Self {
    self.options = options;
    self
  }

  pub fn enabled(mut self, enabled: bool) -> Self {
    self.options.enabled = enabled;
    self
  }

  pub fn with_stale_time(mut self, duration: Duration) -> Self {
    self.options.stale_time = Some(duration);
    self
  }

  pub fn keep_previous_data(mut self, keep: bool) -> Self {
    self.options.keep_previous_data = keep;
    self
  }

  pub fn refetch_on_focus(mut self, refetch: bool) -> Self {
    self.options.refetch_on_focus = refetch;
    self
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn status(&self) -> QueryStatus {
    self.status
  }

  pub fn data(&self) -> Option<&S> {
    self.data.as_ref()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  /// The data shown belongs to the previous key while the new one loads.
  pub fn is_previous_data(&self) -> bool {
    self.is_previous_data
  }

  fn stale_time(&self) -> Duration {
    self
      .options
      .stale_time
      .unwrap_or_else(|| self.client.default_stale_time())
  }

  /// Start fetching unless disabled or already loading.
  pub fn fetch(&mut self) {
    if !self.options.enabled || self.is_loading() {
      return;
    }
    self.start_fetch(self.stale_time());
  }

  /// Fetch regardless of freshness. Joins a request already in flight.
  pub fn refetch(&mut self) {
    if !self.options.enabled {
      return;
    }
    self.start_fetch(Duration::ZERO);
  }

  /// Toggle the enabled condition; enabling starts a fetch.
  pub fn set_enabled(&mut self, enabled: bool) {
    self.options.enabled = enabled;
    if enabled {
      self.fetch();
    } else {
      self.abort();
      if self.status == QueryStatus::Loading {
        self.status = if self.data.is_some() {
          QueryStatus::Success
        } else {
          QueryStatus::Idle
        };
      }
    }
  }

  /// Point the observer at another key (next page, new filter).
  pub fn set_key<F, Fut>(&mut self, key: QueryKey, fetcher: F)
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    if key == self.key {
      return;
    }

    self.abort();
    self.key = key;
    self.fetcher = Arc::new(move || -> BoxFuture<T> { Box::pin(fetcher()) });
    self.error = None;

    if self.options.keep_previous_data && self.data.is_some() {
      self.is_previous_data = true;
    } else {
      self.data = None;
      self.is_previous_data = false;
      self.status = QueryStatus::Idle;
    }

    self.fetch();
  }

  /// The consuming view regained focus.
  pub fn on_focus(&mut self) {
    if self.options.refetch_on_focus
      && !self.is_loading()
      && self.client.is_stale(&self.key, self.stale_time())
    {
      self.fetch();
    }
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    // Try to receive without blocking
    match receiver.try_recv() {
      Ok(result) => {
        self.apply(result);
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.apply(Err(ApiError::Cancelled));
        true
      }
    }
  }

  /// Wait for the pending fetch, if any, and apply its result.
  pub async fn settle(&mut self) -> &Self {
    if let Some(receiver) = &mut self.receiver {
      let result = receiver.recv().await.unwrap_or(Err(ApiError::Cancelled));
      self.apply(result);
    }
    self
  }

  fn apply(&mut self, result: Result<Arc<T>, ApiError>) {
    self.receiver = None;
    self.task = None;
    match result {
      Ok(payload) => {
        self.data = Some((self.select)(&payload));
        self.error = None;
        self.is_previous_data = false;
        self.status = QueryStatus::Success;
      }
      Err(error) => {
        self.error = Some(error);
        self.is_previous_data = false;
        self.status = QueryStatus::Error;
      }
    }
  }

  fn abort(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
    self.receiver = None;
  }

  /// Internal: start the fetch operation
  fn start_fetch(&mut self, stale_time: Duration) {
    self.abort();

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.status = QueryStatus::Loading;

    let client = self.client.clone();
    let key = self.key.clone();
    let fetcher = Arc::clone(&self.fetcher);
    self.task = Some(tokio::spawn(async move {
      let result = client.fetch_with(&key, stale_time, || fetcher()).await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    }));
  }
}

impl<T, S> Drop for Query<T, S> {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl<T, S: std::fmt::Debug> std::fmt::Debug for Query<T, S> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("status", &self.status)
      .field("data", &self.data)
      .field("options", &self.options)
      .finish_non_exhaustive()
  }
}
