//! One-shot writes with declared side effects.
//!
//! On success a mutation announces a toast, invalidates the cache keys it
//! declared, runs its success callback and optionally navigates. On failure
//! it runs `rollback` (a no-op unless one was supplied) and announces the
//! error through [`notify_error`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::api::{ApiError, Envelope};
use crate::notify::{notify_error, Navigator, Notifier};

use super::client::QueryClient;
use super::key::Invalidate;

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<Envelope<T>, ApiError>> + Send>>;
type MutatorFn<A, T> = Arc<dyn Fn(A) -> BoxFuture<T> + Send + Sync>;
type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

const DEFAULT_SUCCESS: &str = "Saved successfully";
const DEFAULT_ERROR: &str = "Something went wrong";

/// A write bound to its side effects. Cheap to clone.
pub struct Mutation<A, T> {
  mutator: MutatorFn<A, T>,
  queries: QueryClient,
  notifier: Arc<dyn Notifier>,
  navigator: Arc<dyn Navigator>,
  invalidate: Vec<Invalidate>,
  success_message: Option<String>,
  error_fallback: String,
  navigate_to: Option<String>,
  on_success: Option<Callback<T>>,
  rollback: Arc<dyn Fn() + Send + Sync>,
}

impl<A, T> Clone for Mutation<A, T> {
  fn clone(&self) -> Self {
    Self {
      mutator: Arc::clone(&self.mutator),
      queries: self.queries.clone(),
      notifier: Arc::clone(&self.notifier),
      navigator: Arc::clone(&self.navigator),
      invalidate: self.invalidate.clone(),
      success_message: self.success_message.clone(),
      error_fallback: self.error_fallback.clone(),
      navigate_to: self.navigate_to.clone(),
      on_success: self.on_success.clone(),
      rollback: Arc::clone(&self.rollback),
    }
  }
}

impl<A, T> Mutation<A, T>
where
  A: Send + 'static,
  T: Send + 'static,
{
  pub fn new<F, Fut>(
    queries: QueryClient,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    mutator: F,
  ) -> Self
  where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Envelope<T>, ApiError>> + Send + 'static,
  {
    Self {
      mutator: Arc::new(move |args: A| -> BoxFuture<T> { Box::pin(mutator(args)) }),
      queries,
      notifier,
      navigator,
      invalidate: Vec::new(),
      success_message: None,
      error_fallback: DEFAULT_ERROR.to_string(),
      navigate_to: None,
      on_success: None,
      rollback: Arc::new(|| {}),
    }
  }

  /// Invalidate `target` after every successful write.
  pub fn invalidates(mut self, target: impl Into<Invalidate>) -> Self {
    self.invalidate.push(target.into());
    self
  }

  /// Toast shown on success instead of the server's message.
  pub fn success_message(mut self, message: &str) -> Self {
    self.success_message = Some(message.to_string());
    self
  }

  /// Toast shown when the error carries no usable message.
  pub fn error_fallback(mut self, message: &str) -> Self {
    self.error_fallback = message.to_string();
    self
  }

  pub fn navigate_to(mut self, route: &str) -> Self {
    self.navigate_to = Some(route.to_string());
    self
  }

  pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
    self.on_success = Some(Arc::new(callback));
    self
  }

  /// Undo an optimistic update when the write fails.
  pub fn with_rollback(mut self, rollback: impl Fn() + Send + Sync + 'static) -> Self {
    self.rollback = Arc::new(rollback);
    self
  }

  /// Run the write and its side effects.
  ///
  /// Invalidation only marks keys stale; it does not wait for dependent
  /// queries to refetch.
  pub async fn mutate(&self, args: A) -> Result<T, ApiError> {
    let result = (self.mutator)(args).await.and_then(|envelope| match envelope {
      Envelope::Success { payload, message } => Ok((payload, message)),
      Envelope::Failure { message } => Err(ApiError::Rejected { message }),
    });

    match result {
      Ok((payload, message)) => {
        let text = self
          .success_message
          .clone()
          .or(message)
          .unwrap_or_else(|| DEFAULT_SUCCESS.to_string());
        self.notifier.success(&text);

        for target in &self.invalidate {
          self.queries.invalidate(target.clone());
        }

        if let Some(callback) = &self.on_success {
          callback(&payload);
        }

        if let Some(route) = &self.navigate_to {
          debug!(route, "navigating after mutation");
          self.navigator.navigate(route);
        }

        Ok(payload)
      }
      Err(error) => {
        (self.rollback)();
        notify_error(self.notifier.as_ref(), &error, &self.error_fallback);
        Err(error)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::Messages;
  use crate::cache::{QueryKey, QueryTag};
  use crate::notify::testing::Recorder;
  use crate::notify::Level;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  fn mutation<T: Send + 'static>(
    queries: &QueryClient,
    recorder: &Arc<Recorder>,
    outcome: Result<Envelope<T>, ApiError>,
  ) -> Mutation<(), T>
  where
    Result<Envelope<T>, ApiError>: Clone,
    T: Sync,
  {
    let outcome = Arc::new(outcome);
    Mutation::new(
      queries.clone(),
      recorder.clone(),
      recorder.clone(),
      move |()| {
        let outcome = Arc::clone(&outcome);
        async move { (*outcome).clone() }
      },
    )
  }

  fn ok<T>(payload: T, message: Option<&str>) -> Result<Envelope<T>, ApiError> {
    Ok(Envelope::Success {
      payload,
      message: message.map(String::from),
    })
  }

  #[tokio::test]
  async fn test_success_notifies_invalidates_and_navigates() {
    let queries = QueryClient::new(Duration::from_secs(60));
    let recorder = Arc::new(Recorder::default());
    let list = QueryKey::new(QueryTag::MyShopProducts).with("page", 1);
    queries.set_data(&list, vec![1u32]);

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in_callback = Arc::clone(&seen);
    let result = mutation(&queries, &recorder, ok(7u32, Some("Product updated")))
      .invalidates(QueryTag::MyShopProducts)
      .navigate_to("/products")
      .on_success(move |v| {
        seen_in_callback.store(*v as usize, Ordering::SeqCst);
      })
      .mutate(())
      .await;

    assert_eq!(result, Ok(7));
    assert_eq!(
      recorder.notes(),
      vec![(Level::Success, "Product updated".to_string())]
    );
    assert!(queries.status(&list).unwrap().is_stale);
    assert_eq!(seen.load(Ordering::SeqCst), 7);
    assert_eq!(recorder.routes(), vec!["/products".to_string()]);
  }

  #[tokio::test]
  async fn test_invalidated_key_is_refetched_on_next_read() {
    let queries = QueryClient::new(Duration::from_secs(60));
    let recorder = Arc::new(Recorder::default());
    let key = QueryKey::new(QueryTag::Offers);
    let calls = Arc::new(AtomicUsize::new(0));

    let read = |calls: Arc<AtomicUsize>| {
      let queries = queries.clone();
      let key = key.clone();
      async move {
        queries
          .fetch(&key, move || async move {
            Ok::<_, ApiError>(calls.fetch_add(1, Ordering::SeqCst))
          })
          .await
      }
    };

    assert_eq!(*read(calls.clone()).await.unwrap(), 0);
    assert_eq!(*read(calls.clone()).await.unwrap(), 0);

    mutation(&queries, &recorder, ok((), None))
      .invalidates(QueryTag::Offers)
      .mutate(())
      .await
      .unwrap();

    assert_eq!(*read(calls.clone()).await.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_success_message_precedence() {
    let queries = QueryClient::default();
    let recorder = Arc::new(Recorder::default());

    mutation(&queries, &recorder, ok((), Some("server says")))
      .success_message("Offer created")
      .mutate(())
      .await
      .unwrap();
    mutation(&queries, &recorder, ok((), None))
      .mutate(())
      .await
      .unwrap();

    assert_eq!(
      recorder.notes(),
      vec![
        (Level::Success, "Offer created".to_string()),
        (Level::Success, DEFAULT_SUCCESS.to_string()),
      ]
    );
  }

  #[tokio::test]
  async fn test_failure_without_rollback_is_safe() {
    let queries = QueryClient::default();
    let recorder = Arc::new(Recorder::default());

    let result = mutation::<()>(
      &queries,
      &recorder,
      Err(ApiError::Network {
        message: String::new(),
      }),
    )
    .error_fallback("Could not delete product")
    .navigate_to("/products")
    .mutate(())
    .await;

    assert!(result.is_err());
    assert_eq!(
      recorder.notes(),
      vec![(Level::Error, "Could not delete product".to_string())]
    );
    assert!(recorder.routes().is_empty());
  }

  #[tokio::test]
  async fn test_rejected_envelope_rolls_back_optimistic_update() {
    let queries = QueryClient::default();
    let recorder = Arc::new(Recorder::default());
    let key = QueryKey::new(QueryTag::MenuItems);
    queries.set_data(&key, vec!["burger".to_string(), "fries".to_string()]);

    // Optimistically remove an item
    let previous = queries.get_data::<Vec<String>>(&key).unwrap();
    queries.set_data(&key, vec!["burger".to_string()]);

    let restore = queries.clone();
    let restore_key = key.clone();
    let result = mutation::<()>(
      &queries,
      &recorder,
      Ok(Envelope::Failure {
        message: Messages::Many(vec!["Item has open orders".to_string(), "Try later".to_string()]),
      }),
    )
    .invalidates(QueryTag::MenuItems)
    .with_rollback(move || restore.set_data(&restore_key, (*previous).clone()))
    .mutate(())
    .await;

    assert!(matches!(result, Err(ApiError::Rejected { .. })));
    assert_eq!(
      queries.get_data::<Vec<String>>(&key).as_deref(),
      Some(&vec!["burger".to_string(), "fries".to_string()])
    );
    assert_eq!(
      recorder.notes(),
      vec![
        (Level::Error, "Item has open orders".to_string()),
        (Level::Error, "Try later".to_string()),
      ]
    );
  }
}
