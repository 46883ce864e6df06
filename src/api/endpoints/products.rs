use crate::api::request::{Endpoint, ListParams, Request};
use crate::api::types::{Category, Page, Product, ProductForm};

pub fn my_shop_products(params: &ListParams) -> Endpoint<Page<Product>> {
  Endpoint::new(Request::get("/products/my-shop").params(params))
}

pub fn product(id: &str) -> Endpoint<Product> {
  Endpoint::new(Request::get("/products").segment(id).public())
}

pub fn create_product(form: &ProductForm) -> Endpoint<Product> {
  Endpoint::new(Request::post("/products").json(form))
}

pub fn update_product(id: &str, form: &ProductForm) -> Endpoint<Product> {
  Endpoint::new(Request::put("/products").segment(id).json(form))
}

pub fn delete_product(id: &str) -> Endpoint<()> {
  Endpoint::new(Request::delete("/products").segment(id))
}

pub fn categories() -> Endpoint<Vec<Category>> {
  Endpoint::new(Request::get("/categories").public())
}
