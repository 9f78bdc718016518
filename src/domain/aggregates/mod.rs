//! Aggregates module
pub mod cart;
pub mod catalog;
pub mod checkout;

pub use cart::{Cart, CartError, CartItem, CartQuote};
pub use catalog::{CatalogPage, CatalogQuery, CatalogSort, CatalogView, PricedProduct};
pub use checkout::{CheckoutError, CheckoutSession, CheckoutSummary, LineTotal, PromotionOption};
