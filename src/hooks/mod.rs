//! Per-domain queries and mutations.
//!
//! Each function binds an endpoint to a registered cache key (reads) or to
//! the keys it invalidates plus its toasts and navigation (writes).

pub mod acquisitions;
pub mod auth;
pub mod bookings;
pub mod food_mart;
pub mod offers;
pub mod products;
pub mod reservations;
pub mod transactions;
pub mod withdrawals;

use serde::de::DeserializeOwned;

use crate::api::Endpoint;
use crate::cache::{Mutation, Query, QueryKey};
use crate::context::AdminContext;

/// Read `endpoint` through the cache under `key`.
pub(crate) fn query<T, E>(ctx: &AdminContext, key: QueryKey, endpoint: E) -> Query<T>
where
  T: DeserializeOwned + Clone + Send + Sync + 'static,
  E: Fn() -> Endpoint<T> + Send + Sync + 'static,
{
  let api = ctx.api.clone();
  Query::new(ctx.queries.clone(), key, move || {
    let api = api.clone();
    let endpoint = endpoint();
    async move { api.call(endpoint).await?.into_result() }
  })
}

/// Write through `endpoint` with the context's notifier and navigator.
pub(crate) fn mutation<A, T, E>(ctx: &AdminContext, endpoint: E) -> Mutation<A, T>
where
  A: Send + 'static,
  T: DeserializeOwned + Send + 'static,
  E: Fn(A) -> Endpoint<T> + Send + Sync + 'static,
{
  let api = ctx.api.clone();
  Mutation::new(
    ctx.queries.clone(),
    ctx.notifier.clone(),
    ctx.navigator.clone(),
    move |args| {
      let api = api.clone();
      let endpoint = endpoint(args);
      async move { api.call(endpoint).await }
    },
  )
}
