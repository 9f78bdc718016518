//! OpenSASE Storefront
//!
//! Backend-for-frontend for the storefront and checkout screens. Fetches
//! catalog, promotion and order data from the storefront API and turns it into
//! display-ready prices.
//!
//! ## Features
//! - Catalog pricing with automatic Product/Category promotions
//! - Client-side catalog filtering and sorting
//! - Checkout totals with a user-selected coupon
//! - Cart quotes
//! - Explicit event bus for cart/checkout change signaling

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub mod api;
pub mod bus;
pub mod client;
pub mod config;
pub mod domain;
pub mod loader;
pub mod scope;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::StorefrontApiClient;
pub use domain::aggregates::{CheckoutError, CheckoutSession};
pub use domain::discount::{resolve_discount, PriceQuote};

// =============================================================================
// Core Types
// =============================================================================

/// Product as returned by the storefront API. Read-only here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    #[serde(default)]
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Scope of a promotion. Decides which eligibility list is authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplyType {
    General,
    Product,
    Category,
    User,
}

impl ApplyType {
    /// Product and Category promotions apply without any user action.
    pub fn is_automatic(self) -> bool {
        matches!(self, Self::Product | Self::Category)
    }

    /// General and User promotions must be claimed and then picked at checkout.
    pub fn is_claimable(self) -> bool {
        matches!(self, Self::General | Self::User)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionStatus {
    #[default]
    Active,
    Expired,
}

/// A discount rule.
///
/// `product_ids` is only meaningful for [`ApplyType::Product`] and
/// `category_ids` only for [`ApplyType::Category`]. The active window is
/// enforced by the API; anything handed to this crate is treated as live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub promotion_id: i64,
    pub code: String,
    pub discount_percent: i32,
    pub apply_type: ApplyType,
    #[serde(default)]
    pub product_ids: BTreeSet<i64>,
    #[serde(default)]
    pub category_ids: BTreeSet<i64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: PromotionStatus,
}

impl AsRef<Promotion> for Promotion {
    fn as_ref(&self) -> &Promotion {
        self
    }
}

/// A promotion as seen from a user's account: claimed coupons and the
/// per-product applicable list at checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromotion {
    #[serde(flatten)]
    pub promotion: Promotion,
    #[serde(default)]
    pub is_used: bool,
}

impl AsRef<Promotion> for UserPromotion {
    fn as_ref(&self) -> &Promotion {
        &self.promotion
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: i64,
    pub category_id: i64,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

/// Body of the payment-creation call. The API re-validates the promotion and
/// marks it used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: i64,
    pub user_id: i64,
    pub promotion_id: Option<i64>,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub status: String,
    #[serde(default)]
    pub payment_url: Option<String>,
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storefront API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The owning view went away before the request finished.
    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

impl StorefrontError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
