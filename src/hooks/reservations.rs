use crate::api::endpoints::reservations as endpoints;
use crate::api::types::{Page, Reservation};
use crate::api::ListParams;
use crate::cache::{Mutation, Query, QueryKey, QueryTag};
use crate::context::AdminContext;

use super::{mutation, query};

pub fn reservations(ctx: &AdminContext, params: ListParams) -> Query<Page<Reservation>> {
  let key = QueryKey::new(QueryTag::Reservations).with_params(&params);
  query(ctx, key, move || endpoints::reservations(&params)).keep_previous_data(true)
}

pub fn reservation(ctx: &AdminContext, id: Option<String>) -> Query<Reservation> {
  let key = QueryKey::new(QueryTag::Reservation).with("id", id.as_deref().unwrap_or_default());
  let enabled = id.is_some();
  query(ctx, key, move || {
    endpoints::reservation(id.as_deref().unwrap_or_default())
  })
  .enabled(enabled)
}

pub fn confirm_reservation(ctx: &AdminContext) -> Mutation<String, Reservation> {
  mutation(ctx, |id: String| endpoints::confirm_reservation(&id))
    .invalidates(QueryTag::Reservations)
    .invalidates(QueryTag::Reservation)
    .success_message("Reservation confirmed")
    .error_fallback("Could not confirm reservation")
}

pub fn cancel_reservation(ctx: &AdminContext) -> Mutation<String, Reservation> {
  mutation(ctx, |id: String| endpoints::cancel_reservation(&id))
    .invalidates(QueryTag::Reservations)
    .invalidates(QueryTag::Reservation)
    .success_message("Reservation cancelled")
    .error_fallback("Could not cancel reservation")
}
