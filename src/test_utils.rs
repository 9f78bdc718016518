//! Builders shared by unit tests.

use rust_decimal::Decimal;

use crate::{ApplyType, OrderLine, Product, Promotion, PromotionStatus, UserPromotion};

pub fn product(id: i64, category_id: i64, price: i64) -> Product {
    Product {
        id,
        category_id,
        name: format!("Product {id}"),
        price: Decimal::from(price),
        image_url: None,
    }
}

pub fn named_product(id: i64, category_id: i64, name: &str, price: i64) -> Product {
    Product { name: name.to_string(), ..product(id, category_id, price) }
}

pub fn promotion(id: i64, apply_type: ApplyType, percent: i32) -> Promotion {
    Promotion {
        promotion_id: id,
        code: format!("PROMO{id}"),
        discount_percent: percent,
        apply_type,
        product_ids: Default::default(),
        category_ids: Default::default(),
        start_date: None,
        end_date: None,
        status: PromotionStatus::Active,
    }
}

pub fn product_promotion(id: i64, percent: i32, product_ids: &[i64]) -> Promotion {
    Promotion {
        product_ids: product_ids.iter().copied().collect(),
        ..promotion(id, ApplyType::Product, percent)
    }
}

pub fn category_promotion(id: i64, percent: i32, category_ids: &[i64]) -> Promotion {
    Promotion {
        category_ids: category_ids.iter().copied().collect(),
        ..promotion(id, ApplyType::Category, percent)
    }
}

pub fn claimed(promotion: Promotion, is_used: bool) -> UserPromotion {
    UserPromotion { promotion, is_used }
}

pub fn line(product_id: i64, category_id: i64, quantity: u32, unit_price: i64) -> OrderLine {
    OrderLine {
        product_id,
        category_id,
        quantity,
        unit_price: Decimal::from(unit_price),
    }
}
