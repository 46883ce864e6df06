use std::time::Duration;

use crate::api::endpoints::products as endpoints;
use crate::api::types::{Category, Page, Product, ProductForm};
use crate::api::ListParams;
use crate::cache::{Mutation, Query, QueryKey, QueryTag};
use crate::context::AdminContext;

use super::{mutation, query};

/// Products of the signed-in merchant's shop, one page per key.
pub fn my_shop_products(ctx: &AdminContext, params: ListParams) -> Query<Page<Product>> {
  let key = QueryKey::new(QueryTag::MyShopProducts).with_params(&params);
  query(ctx, key, move || endpoints::my_shop_products(&params)).keep_previous_data(true)
}

/// Single product; idle until an id is known.
pub fn product(ctx: &AdminContext, id: Option<String>) -> Query<Product> {
  let key = QueryKey::new(QueryTag::Product).with("id", id.as_deref().unwrap_or_default());
  let enabled = id.is_some();
  query(ctx, key, move || {
    endpoints::product(id.as_deref().unwrap_or_default())
  })
  .enabled(enabled)
}

pub fn categories(ctx: &AdminContext) -> Query<Vec<Category>> {
  query(ctx, QueryKey::new(QueryTag::Categories), endpoints::categories)
    .with_stale_time(Duration::from_secs(300))
    .refetch_on_focus(false)
}

pub fn create_product(ctx: &AdminContext) -> Mutation<ProductForm, Product> {
  mutation(ctx, |form: ProductForm| endpoints::create_product(&form))
    .invalidates(QueryTag::MyShopProducts)
    .success_message("Product created")
    .error_fallback("Could not create product")
    .navigate_to("/products")
}

pub fn update_product(ctx: &AdminContext) -> Mutation<(String, ProductForm), Product> {
  mutation(ctx, |(id, form): (String, ProductForm)| {
    endpoints::update_product(&id, &form)
  })
  .invalidates(QueryTag::MyShopProducts)
  .invalidates(QueryTag::Product)
  .success_message("Product updated")
  .error_fallback("Could not update product")
}

pub fn delete_product(ctx: &AdminContext) -> Mutation<String, ()> {
  mutation(ctx, |id: String| endpoints::delete_product(&id))
    .invalidates(QueryTag::MyShopProducts)
    .success_message("Product deleted")
    .error_fallback("Could not delete product")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::serve;
  use crate::context::testing::context;
  use crate::notify::Level;

  const PAGE: &str = r#"{"success":true,"data":{"items":[{"_id":"p1","name":"Lamp","price":12.5}],"total":1,"page":1,"limit":20}}"#;

  #[tokio::test]
  async fn test_list_reads_through_server() {
    let server = serve(vec![(200, PAGE)]).await;
    let (ctx, _) = context(&server.base_url);
    ctx.session.set_token("tok").unwrap();

    let mut query = my_shop_products(&ctx, ListParams::page(1, 20));
    query.fetch();
    query.settle().await;

    let page = query.data().unwrap();
    assert_eq!(page.items[0].name, "Lamp");
    let recorded = &server.requests()[0];
    assert_eq!(
      recorded.request_line(),
      "GET /products/my-shop?page=1&limit=20 HTTP/1.1"
    );
    assert_eq!(recorded.header("x-access-token"), Some("tok"));
  }

  #[tokio::test]
  async fn test_product_waits_for_id() {
    let (ctx, _) = context("http://127.0.0.1:9/");
    let mut query = product(&ctx, None);
    query.fetch();
    assert!(!query.is_loading());
  }

  #[tokio::test]
  async fn test_update_invalidates_list_and_detail() {
    let server = serve(vec![
      (200, PAGE),
      (200, r#"{"success":true,"message":"ok","data":{"_id":"p1","name":"Desk lamp","price":14}}"#),
      (200, PAGE),
    ])
    .await;
    let (ctx, recorder) = context(&server.base_url);

    let mut list = my_shop_products(&ctx, ListParams::page(1, 20)).with_stale_time(Duration::from_secs(60));
    list.fetch();
    list.settle().await;

    // Fresh for a minute: no new request
    list.fetch();
    list.settle().await;
    assert_eq!(server.requests().len(), 1);

    let updated = update_product(&ctx)
      .mutate((
        "p1".to_string(),
        ProductForm {
          name: "Desk lamp".to_string(),
          price: 14.0,
          ..ProductForm::default()
        },
      ))
      .await
      .unwrap();
    assert_eq!(updated.name, "Desk lamp");
    assert_eq!(
      recorder.notes(),
      vec![(Level::Success, "Product updated".to_string())]
    );

    list.fetch();
    list.settle().await;
    assert_eq!(server.requests().len(), 3);
    assert_eq!(server.requests()[1].request_line(), "PUT /products/p1 HTTP/1.1");
  }

  #[tokio::test]
  async fn test_delete_failure_announces_validation_messages() {
    let server = serve(vec![(
      400,
      r#"{"statusCode":400,"message":["Product has pending orders"],"error":"Bad Request"}"#,
    )])
    .await;
    let (ctx, recorder) = context(&server.base_url);

    let result = delete_product(&ctx).mutate("p1".to_string()).await;

    assert_eq!(result.unwrap_err().status(), Some(400));
    assert_eq!(
      recorder.notes(),
      vec![(Level::Error, "Product has pending orders".to_string())]
    );
  }
}
