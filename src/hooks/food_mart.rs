//! Menu and kitchen orders for food-mart shops.

use std::sync::{Arc, Mutex};

use crate::api::endpoints::food_mart as endpoints;
use crate::api::types::{FoodOrder, MenuItem, MenuItemForm, OrderStatus, Page};
use crate::api::ListParams;
use crate::cache::{Mutation, Query, QueryKey, QueryTag};
use crate::context::AdminContext;

use super::{mutation, query};

pub fn menu_items(ctx: &AdminContext, params: ListParams) -> Query<Page<MenuItem>> {
  let key = QueryKey::new(QueryTag::MenuItems).with_params(&params);
  query(ctx, key, move || endpoints::menu_items(&params)).keep_previous_data(true)
}

pub fn create_menu_item(ctx: &AdminContext) -> Mutation<MenuItemForm, MenuItem> {
  mutation(ctx, |form: MenuItemForm| endpoints::create_menu_item(&form))
    .invalidates(QueryTag::MenuItems)
    .success_message("Menu item added")
    .error_fallback("Could not add menu item")
}

pub fn update_menu_item(ctx: &AdminContext) -> Mutation<(String, MenuItemForm), MenuItem> {
  mutation(ctx, |(id, form): (String, MenuItemForm)| {
    endpoints::update_menu_item(&id, &form)
  })
  .invalidates(QueryTag::MenuItems)
  .success_message("Menu item updated")
  .error_fallback("Could not update menu item")
}

/// Drops the item from the shown menu page before the request and puts
/// the page back if the server refuses.
pub fn delete_menu_item(ctx: &AdminContext, shown: &QueryKey) -> Mutation<String, ()> {
  let api = ctx.api.clone();
  let queries = ctx.queries.clone();
  let key = shown.clone();
  let snapshot: Arc<Mutex<Option<Arc<Page<MenuItem>>>>> = Arc::new(Mutex::new(None));

  let settle = {
    let snapshot = Arc::clone(&snapshot);
    move |_: &()| {
      if let Ok(mut slot) = snapshot.lock() {
        slot.take();
      }
    }
  };

  let restore = {
    let queries = queries.clone();
    let key = key.clone();
    let snapshot = Arc::clone(&snapshot);
    move || {
      let previous = snapshot.lock().ok().and_then(|mut slot| slot.take());
      if let Some(page) = previous {
        queries.set_data(&key, (*page).clone());
      }
    }
  };

  Mutation::new(
    ctx.queries.clone(),
    ctx.notifier.clone(),
    ctx.navigator.clone(),
    move |id: String| {
      let current = queries.get_data::<Page<MenuItem>>(&key);
      if let Some(current) = &current {
        let mut page = (**current).clone();
        page.items.retain(|item| item.id != id);
        page.total = page.total.saturating_sub(1);
        queries.set_data(&key, page);
      }
      // Each call owns the slot; nothing cached means nothing to restore
      if let Ok(mut slot) = snapshot.lock() {
        *slot = current;
      }
      let api = api.clone();
      async move { api.call(endpoints::delete_menu_item(&id)).await }
    },
  )
  .invalidates(QueryTag::MenuItems)
  .success_message("Menu item removed")
  .error_fallback("Could not remove menu item")
  .on_success(settle)
  .with_rollback(restore)
}

pub fn orders(ctx: &AdminContext, params: ListParams) -> Query<Page<FoodOrder>> {
  let key = QueryKey::new(QueryTag::FoodOrders).with_params(&params);
  query(ctx, key, move || endpoints::orders(&params)).keep_previous_data(true)
}

pub fn update_order_status(ctx: &AdminContext) -> Mutation<(String, OrderStatus), FoodOrder> {
  mutation(ctx, |(id, status): (String, OrderStatus)| {
    endpoints::update_order_status(&id, status)
  })
  .invalidates(QueryTag::FoodOrders)
  .success_message("Order updated")
  .error_fallback("Could not update order")
}
