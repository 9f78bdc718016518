use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{ApiError, ApiResponse, AppState};
use crate::domain::aggregates::{Cart, CartItem, CartQuote};
use crate::domain::value_objects::Quantity;
use crate::scope::ViewScope;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: i64,
    pub category_id: i64,
    #[validate(range(min = 1))]
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CartQuoteRequest {
    #[validate]
    pub items: Vec<CartItemRequest>,
}

pub async fn cart_quote(
    State(s): State<AppState>,
    Json(r): Json<CartQuoteRequest>,
) -> Result<Json<ApiResponse<CartQuote>>, ApiError> {
    if r.items.is_empty() {
        return Err(ApiError::bad_request("cart has no items"));
    }
    r.validate()?;
    for item in &r.items {
        if item.unit_price < Decimal::ZERO {
            return Err(ApiError::bad_request(format!("unit price of product {} is negative", item.product_id)));
        }
    }

    let scope = ViewScope::new();
    let (feed, notices) = s.loader.load_promotions(&scope).await?;

    let mut cart = Cart::new(&s.currency);
    for item in r.items {
        cart.add_item(CartItem {
            product_id: item.product_id,
            category_id: item.category_id,
            quantity: Quantity::new(item.quantity),
            unit_price: item.unit_price,
        })?;
    }
    let quote = cart.quote(feed.promotions())?;
    s.bus.publish_all(cart.take_events());
    Ok(Json(ApiResponse::new(quote, notices)))
}
