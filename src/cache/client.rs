//! Process-wide query cache.
//!
//! Entries are keyed by [`QueryKey::cache_hash`]. A read that finds fresh
//! data returns it; otherwise it joins the request already in flight for the
//! key or starts one. Only one request per key is ever in flight, and every
//! caller waiting on it observes the same result.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::api::ApiError;

use super::key::{Invalidate, QueryKey, QueryTag};

type AnyData = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyData, ApiError>>>;

struct InFlight {
  id: u64,
  fetch: SharedFetch,
}

struct Entry {
  tag: QueryTag,
  data: Option<AnyData>,
  updated_at: Option<Instant>,
  invalidated: bool,
  error: Option<ApiError>,
  /// Bumped by every invalidation; a fetch started under an older
  /// generation stores its data as already stale.
  generation: u64,
  /// Stale time of the read that last stored data here.
  stale_time: Option<Duration>,
  in_flight: Option<InFlight>,
}

impl Entry {
  fn new(tag: QueryTag) -> Self {
    Self {
      tag,
      data: None,
      updated_at: None,
      invalidated: false,
      error: None,
      generation: 0,
      stale_time: None,
      in_flight: None,
    }
  }

  fn is_stale(&self, stale_time: Duration) -> bool {
    self.invalidated
      || self
        .updated_at
        .map(|t| t.elapsed() >= stale_time)
        .unwrap_or(true)
  }

  fn fresh_data(&self, stale_time: Duration) -> Option<AnyData> {
    if self.is_stale(stale_time) {
      return None;
    }
    self.data.clone()
  }
}

/// Snapshot of one cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryStatus {
  pub has_data: bool,
  pub is_stale: bool,
  pub is_fetching: bool,
  pub error: Option<ApiError>,
}

struct Inner {
  entries: Mutex<HashMap<String, Entry>>,
  next_fetch_id: AtomicU64,
}

impl Inner {
  fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
    // Entries hold plain data; a panic elsewhere cannot leave them torn
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn complete(
    &self,
    hash: &str,
    fetch_id: u64,
    generation: u64,
    stale_time: Duration,
    result: &Result<AnyData, ApiError>,
  ) {
    let mut entries = self.entries();
    let Some(entry) = entries.get_mut(hash) else {
      return;
    };

    // Cancelled or superseded; nobody owns this slot anymore
    if entry.in_flight.as_ref().map(|f| f.id) != Some(fetch_id) {
      debug!(fetch_id, "discarding result of detached fetch");
      return;
    }
    entry.in_flight = None;

    match result {
      Ok(data) => {
        entry.data = Some(Arc::clone(data));
        entry.updated_at = Some(Instant::now());
        entry.invalidated = entry.generation != generation;
        entry.stale_time = Some(stale_time);
        entry.error = None;
      }
      Err(e) => entry.error = Some(e.clone()),
    }
  }
}

/// Shared cache handle. Cheap to clone; clones see the same entries.
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<Inner>,
  default_stale_time: Duration,
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new(Duration::ZERO)
  }
}

impl QueryClient {
  pub fn new(default_stale_time: Duration) -> Self {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        next_fetch_id: AtomicU64::new(1),
      }),
      default_stale_time,
    }
  }

  pub fn default_stale_time(&self) -> Duration {
    self.default_stale_time
  }

  /// Read through the cache with the default stale time.
  pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, ApiError>
  where
    T: Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    self.fetch_with(key, self.default_stale_time, fetcher).await
  }

  /// Read through the cache.
  ///
  /// 1. Fresh data (younger than `stale_time`, not invalidated): returned as is
  /// 2. A request in flight for the key: joined, `fetcher` is not called
  /// 3. Otherwise `fetcher` starts a new request shared by later callers
  ///
  /// `fetcher` only builds the future; it runs while the cache lock is held
  /// and must not touch this client.
  pub async fn fetch_with<T, F, Fut>(
    &self,
    key: &QueryKey,
    stale_time: Duration,
    fetcher: F,
  ) -> Result<Arc<T>, ApiError>
  where
    T: Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let hash = key.cache_hash();

    let shared = {
      let mut entries = self.inner.entries();
      let entry = entries
        .entry(hash.clone())
        .or_insert_with(|| Entry::new(key.tag()));

      if let Some(data) = entry.fresh_data(stale_time) {
        debug!(%key, "cache hit");
        return downcast(data, key);
      }

      if let Some(in_flight) = &entry.in_flight {
        debug!(%key, fetch_id = in_flight.id, "joining in-flight request");
        in_flight.fetch.clone()
      } else {
        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let generation = entry.generation;
        let inner = Arc::clone(&self.inner);
        let request = fetcher();
        let hash = hash.clone();

        let fetch = async move {
          let result = request.await.map(|data| Arc::new(data) as AnyData);
          inner.complete(&hash, fetch_id, generation, stale_time, &result);
          result
        }
        .boxed()
        .shared();

        debug!(%key, fetch_id, "cache miss, fetching");
        entry.in_flight = Some(InFlight {
          id: fetch_id,
          fetch: fetch.clone(),
        });
        fetch
      }
    };

    downcast(shared.await?, key)
  }

  /// Mark matching entries stale. Their next read goes to the network; a
  /// request already in flight still completes but its data stays stale.
  ///
  /// Returns the number of entries marked.
  pub fn invalidate(&self, target: impl Into<Invalidate>) -> usize {
    let target = target.into();
    let mut marked = 0;
    for (hash, entry) in self.inner.entries().iter_mut() {
      if target.matches(entry.tag, hash) {
        entry.invalidated = true;
        entry.generation += 1;
        marked += 1;
      }
    }
    debug!(?target, marked, "invalidated queries");
    marked
  }

  /// Detach the in-flight request for `key`. Callers already waiting still
  /// get its result, but it is not stored and later reads start over.
  pub fn cancel(&self, key: &QueryKey) -> bool {
    let mut entries = self.inner.entries();
    match entries.get_mut(&key.cache_hash()) {
      Some(entry) => entry.in_flight.take().is_some(),
      None => false,
    }
  }

  /// Cached data for `key`, fresh or not.
  pub fn get_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
    let data = self.inner.entries().get(&key.cache_hash())?.data.clone()?;
    data.downcast::<T>().ok()
  }

  /// Replace cached data for `key`, e.g. for an optimistic update.
  pub fn set_data<T: Send + Sync + 'static>(&self, key: &QueryKey, data: T) {
    let mut entries = self.inner.entries();
    let entry = entries
      .entry(key.cache_hash())
      .or_insert_with(|| Entry::new(key.tag()));
    entry.data = Some(Arc::new(data));
    entry.updated_at = Some(Instant::now());
    entry.invalidated = false;
    entry.error = None;
  }

  /// Snapshot of `key`. Staleness is judged by the stale time of the read
  /// that stored the data, or the default when nothing was read.
  pub fn status(&self, key: &QueryKey) -> Option<EntryStatus> {
    let entries = self.inner.entries();
    let entry = entries.get(&key.cache_hash())?;
    let stale_time = entry.stale_time.unwrap_or(self.default_stale_time);
    Some(EntryStatus {
      has_data: entry.data.is_some(),
      is_stale: entry.is_stale(stale_time),
      is_fetching: entry.in_flight.is_some(),
      error: entry.error.clone(),
    })
  }

  /// Whether a read of `key` with `stale_time` would go to the network.
  pub fn is_stale(&self, key: &QueryKey, stale_time: Duration) -> bool {
    self
      .inner
      .entries()
      .get(&key.cache_hash())
      .map(|e| e.is_stale(stale_time))
      .unwrap_or(true)
  }

  pub fn remove(&self, key: &QueryKey) {
    self.inner.entries().remove(&key.cache_hash());
  }

  /// Drop every entry, detaching requests in flight.
  pub fn clear(&self) {
    let mut entries = self.inner.entries();
    debug!(count = entries.len(), "clearing query cache");
    entries.clear();
  }

  pub fn len(&self) -> usize {
    self.inner.entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn downcast<T: Send + Sync + 'static>(data: AnyData, key: &QueryKey) -> Result<Arc<T>, ApiError> {
  data.downcast::<T>().map_err(|_| {
    ApiError::Decode(format!(
      "cached value for {} is not a {}",
      key,
      std::any::type_name::<T>()
    ))
  })
}
