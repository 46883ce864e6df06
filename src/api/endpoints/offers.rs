use crate::api::request::{Endpoint, ListParams, Request};
use crate::api::types::{Offer, OfferForm, Page};

pub fn offers(params: &ListParams) -> Endpoint<Page<Offer>> {
  Endpoint::new(Request::get("/offers/my-shop").params(params))
}

pub fn create_offer(form: &OfferForm) -> Endpoint<Offer> {
  Endpoint::new(Request::post("/offers").json(form))
}

pub fn delete_offer(id: &str) -> Endpoint<()> {
  Endpoint::new(Request::delete("/offers").segment(id))
}
