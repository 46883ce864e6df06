use crate::api::endpoints::bookings as endpoints;
use crate::api::types::{Booking, BookingStatus, Page};
use crate::api::ListParams;
use crate::cache::{Mutation, Query, QueryKey, QueryTag};
use crate::context::AdminContext;

use super::{mutation, query};

pub fn bookings(ctx: &AdminContext, params: ListParams) -> Query<Page<Booking>> {
  let key = QueryKey::new(QueryTag::Bookings).with_params(&params);
  query(ctx, key, move || endpoints::bookings(&params)).keep_previous_data(true)
}

pub fn booking(ctx: &AdminContext, id: Option<String>) -> Query<Booking> {
  let key = QueryKey::new(QueryTag::Booking).with("id", id.as_deref().unwrap_or_default());
  let enabled = id.is_some();
  query(ctx, key, move || {
    endpoints::booking(id.as_deref().unwrap_or_default())
  })
  .enabled(enabled)
}

pub fn update_booking_status(ctx: &AdminContext) -> Mutation<(String, BookingStatus), Booking> {
  mutation(ctx, |(id, status): (String, BookingStatus)| {
    endpoints::update_booking_status(&id, status)
  })
  .invalidates(QueryTag::Bookings)
  .invalidates(QueryTag::Booking)
  .success_message("Booking updated")
  .error_fallback("Could not update booking")
}
