//! Cart Aggregate

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::discount::best_auto_discount;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Money, MoneyError, Quantity};
use crate::{OrderLine, Promotion};

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    items: Vec<CartItem>,
    currency: String,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CartItem {
    pub product_id: i64,
    pub category_id: i64,
    pub quantity: Quantity,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineQuote {
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price: Money,
    pub discount_percent: i32,
    pub line_original: Money,
    pub line_final: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    pub cart_id: String,
    pub lines: Vec<CartLineQuote>,
    pub subtotal: Money,
    pub total: Money,
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self { id: Uuid::new_v4().to_string(), items: vec![], currency: currency.to_string(), events: vec![] }
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }

    /// Adds `item`, merging it into an existing line of the same product.
    /// A line for the same product at a different unit price is rejected.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        let (product_id, added) = (item.product_id, item.quantity.value());
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(existing) if existing.unit_price != item.unit_price => {
                return Err(CartError::PriceConflict {
                    product_id,
                    existing: existing.unit_price,
                    requested: item.unit_price,
                });
            }
            Some(existing) => existing.quantity = existing.quantity.add(added),
            None => self.items.push(item),
        }
        self.raise_event(DomainEvent::Cart(CartEvent::ItemAdded { cart_id: self.id.clone(), product_id, quantity: added }));
        Ok(())
    }

    pub fn subtotal(&self) -> Result<Money, CartError> {
        let lines = self
            .items
            .iter()
            .map(|i| Money::new(i.unit_price, &self.currency).multiply(i.quantity.value()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Money::total(&self.currency, &lines)?)
    }

    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|i| OrderLine {
                product_id: i.product_id,
                category_id: i.category_id,
                quantity: i.quantity.value(),
                unit_price: i.unit_price,
            })
            .collect()
    }

    /// Price the cart with the automatic catalog promotions only. Coupons are
    /// picked at checkout.
    pub fn quote<P: AsRef<Promotion>>(&self, promotions: &[P]) -> Result<CartQuote, CartError> {
        let lines = self
            .order_lines()
            .into_iter()
            .map(|line| {
                let rate = best_auto_discount(line.product_id, line.category_id, promotions);
                let unit_price = Money::new(line.unit_price, &self.currency);
                let line_original = unit_price.multiply(line.quantity)?;
                Ok(CartLineQuote {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    discount_percent: rate.percent(),
                    line_final: line_original.discounted(rate)?,
                    line_original,
                    unit_price,
                })
            })
            .collect::<Result<Vec<_>, MoneyError>>()?;
        let total = Money::total(&self.currency, lines.iter().map(|l| &l.line_final))?;
        Ok(CartQuote { cart_id: self.id.clone(), subtotal: self.subtotal()?, total, lines })
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Product {product_id} is already in the cart at {existing}, not {requested}")]
    PriceConflict { product_id: i64, existing: Decimal, requested: Decimal },
    #[error("Cart total cannot be computed: {0}")]
    Amount(#[from] MoneyError),
}
