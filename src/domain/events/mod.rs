//! Domain events
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DomainEvent {
    Cart(CartEvent),
    Checkout(CheckoutEvent),
}

impl DomainEvent {
    /// Subject suffix used when the event leaves the process.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cart(_) => "cart",
            Self::Checkout(_) => "checkout",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CartEvent {
    ItemAdded { cart_id: String, product_id: i64, quantity: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CheckoutEvent {
    PromotionSelected { order_id: i64, promotion_id: i64 },
    PromotionCleared { order_id: i64 },
    PaymentSubmitted { order_id: i64, payment_id: String, promotion_id: Option<i64>, amount: Decimal },
}
