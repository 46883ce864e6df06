use crate::api::endpoints::offers as endpoints;
use crate::api::types::{Offer, OfferForm, Page};
use crate::api::ListParams;
use crate::cache::{Mutation, Query, QueryKey, QueryTag};
use crate::context::AdminContext;

use super::{mutation, query};

pub fn offers(ctx: &AdminContext, params: ListParams) -> Query<Page<Offer>> {
  let key = QueryKey::new(QueryTag::Offers).with_params(&params);
  query(ctx, key, move || endpoints::offers(&params)).keep_previous_data(true)
}

/// Offers discount products, so product lists are refreshed too.
pub fn create_offer(ctx: &AdminContext) -> Mutation<OfferForm, Offer> {
  mutation(ctx, |form: OfferForm| endpoints::create_offer(&form))
    .invalidates(QueryTag::Offers)
    .invalidates(QueryTag::MyShopProducts)
    .success_message("Offer created")
    .error_fallback("Could not create offer")
    .navigate_to("/offers")
}

pub fn delete_offer(ctx: &AdminContext) -> Mutation<String, ()> {
  mutation(ctx, |id: String| endpoints::delete_offer(&id))
    .invalidates(QueryTag::Offers)
    .invalidates(QueryTag::MyShopProducts)
    .success_message("Offer deleted")
    .error_fallback("Could not delete offer")
}
