use crate::api::request::{Endpoint, ListParams, Request};
use crate::api::types::{Acquisition, AcquisitionForm, Page};

pub fn acquisitions(params: &ListParams) -> Endpoint<Page<Acquisition>> {
  Endpoint::new(Request::get("/acquisitions/merchant").params(params))
}

pub fn acquisition(id: &str) -> Endpoint<Acquisition> {
  Endpoint::new(Request::get("/acquisitions").segment(id))
}

pub fn create_acquisition(form: &AcquisitionForm) -> Endpoint<Acquisition> {
  Endpoint::new(Request::post("/acquisitions").json(form))
}

pub fn update_acquisition(id: &str, form: &AcquisitionForm) -> Endpoint<Acquisition> {
  Endpoint::new(Request::put("/acquisitions").segment(id).json(form))
}

pub fn delete_acquisition(id: &str) -> Endpoint<()> {
  Endpoint::new(Request::delete("/acquisitions").segment(id))
}
