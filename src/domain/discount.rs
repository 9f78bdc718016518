//! Discount resolution for catalog views.
//!
//! One rule set shared by the home, category and product pages and by the
//! automatic part of checkout: only Product and Category promotions match a
//! product, and the largest matching percentage wins. General and User
//! promotions never match here; they reach an order only through an explicit
//! coupon selection at checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::DiscountRate;
use crate::{ApplyType, Product, Promotion};

/// Result of pricing one product against a promotion list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub discount_percent: i32,
    pub final_price: Decimal,
}

impl PriceQuote {
    pub fn undiscounted(price: Decimal) -> Self {
        Self { discount_percent: 0, final_price: price }
    }

    pub fn is_discounted(&self) -> bool {
        self.discount_percent != 0
    }
}

/// Whether `promotion` applies automatically to a product with the given ids.
pub fn is_catalog_applicable(promotion: &Promotion, product_id: i64, category_id: i64) -> bool {
    match promotion.apply_type {
        ApplyType::Product => promotion.product_ids.contains(&product_id),
        ApplyType::Category => promotion.category_ids.contains(&category_id),
        ApplyType::General | ApplyType::User => false,
    }
}

/// Largest applicable discount for a product, or [`DiscountRate::NONE`].
pub fn best_auto_discount<P: AsRef<Promotion>>(
    product_id: i64,
    category_id: i64,
    promotions: &[P],
) -> DiscountRate {
    promotions
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| is_catalog_applicable(p, product_id, category_id))
        .map(|p| DiscountRate::new(p.discount_percent))
        .max()
        .unwrap_or(DiscountRate::NONE)
}

/// Price `product` against `promotions`.
///
/// Ties between equal percentages are irrelevant since only the percentage is
/// reported. No rounding is applied; formatting is the display layer's job.
pub fn resolve_discount<P: AsRef<Promotion>>(product: &Product, promotions: &[P]) -> PriceQuote {
    let rate = best_auto_discount(product.id, product.category_id, promotions);
    match rate.apply(product.price) {
        Some(final_price) => PriceQuote { discount_percent: rate.percent(), final_price },
        None => {
            tracing::warn!(product_id = product.id, %rate, "discounted price out of range, showing list price");
            PriceQuote::undiscounted(product.price)
        }
    }
}
