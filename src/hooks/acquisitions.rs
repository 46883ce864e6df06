//! Property listings for real-estate shops.

use crate::api::endpoints::acquisitions as endpoints;
use crate::api::types::{Acquisition, AcquisitionForm, Page};
use crate::api::ListParams;
use crate::cache::{Mutation, Query, QueryKey, QueryTag};
use crate::context::AdminContext;

use super::{mutation, query};

pub fn acquisitions(ctx: &AdminContext, params: ListParams) -> Query<Page<Acquisition>> {
  let key = QueryKey::new(QueryTag::Acquisitions).with_params(&params);
  query(ctx, key, move || endpoints::acquisitions(&params)).keep_previous_data(true)
}

pub fn acquisition(ctx: &AdminContext, id: Option<String>) -> Query<Acquisition> {
  let key = QueryKey::new(QueryTag::Acquisition).with("id", id.as_deref().unwrap_or_default());
  let enabled = id.is_some();
  query(ctx, key, move || {
    endpoints::acquisition(id.as_deref().unwrap_or_default())
  })
  .enabled(enabled)
}

pub fn create_acquisition(ctx: &AdminContext) -> Mutation<AcquisitionForm, Acquisition> {
  mutation(ctx, |form: AcquisitionForm| endpoints::create_acquisition(&form))
    .invalidates(QueryTag::Acquisitions)
    .success_message("Listing created")
    .error_fallback("Could not create listing")
    .navigate_to("/acquisitions")
}

pub fn update_acquisition(ctx: &AdminContext) -> Mutation<(String, AcquisitionForm), Acquisition> {
  mutation(ctx, |(id, form): (String, AcquisitionForm)| {
    endpoints::update_acquisition(&id, &form)
  })
  .invalidates(QueryTag::Acquisitions)
  .invalidates(QueryTag::Acquisition)
  .success_message("Listing updated")
  .error_fallback("Could not update listing")
}

pub fn delete_acquisition(ctx: &AdminContext) -> Mutation<String, ()> {
  mutation(ctx, |id: String| endpoints::delete_acquisition(&id))
    .invalidates(QueryTag::Acquisitions)
    .success_message("Listing deleted")
    .error_fallback("Could not delete listing")
}
