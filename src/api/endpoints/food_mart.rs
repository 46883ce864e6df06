use crate::api::request::{Endpoint, ListParams, Request};
use crate::api::types::{FoodOrder, MenuItem, MenuItemForm, OrderStatus, Page, StatusUpdate};

pub fn menu_items(params: &ListParams) -> Endpoint<Page<MenuItem>> {
  Endpoint::new(Request::get("/food-mart/items").params(params))
}

pub fn create_menu_item(form: &MenuItemForm) -> Endpoint<MenuItem> {
  Endpoint::new(Request::post("/food-mart/items").json(form))
}

pub fn update_menu_item(id: &str, form: &MenuItemForm) -> Endpoint<MenuItem> {
  Endpoint::new(Request::put("/food-mart/items").segment(id).json(form))
}

pub fn delete_menu_item(id: &str) -> Endpoint<()> {
  Endpoint::new(Request::delete("/food-mart/items").segment(id))
}

pub fn orders(params: &ListParams) -> Endpoint<Page<FoodOrder>> {
  Endpoint::new(Request::get("/food-mart/orders").params(params))
}

pub fn update_order_status(id: &str, status: OrderStatus) -> Endpoint<FoodOrder> {
  Endpoint::new(
    Request::put("/food-mart/orders")
      .segment(id)
      .segment("status")
      .json(&StatusUpdate { status }),
  )
}
