//! Checkout Aggregate
//!
//! Prices an order by combining, per line, the automatic Product/Category
//! discount with the one coupon the user picked from their claimed
//! General/User promotions. The two sources never stack; the larger wins.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::events::{CheckoutEvent, DomainEvent};
use crate::domain::value_objects::{DiscountRate, Money, MoneyError};
use crate::{OrderDetails, OrderLine, PaymentReceipt, PaymentRequest, UserPromotion};

#[derive(Clone, Debug)]
pub struct CheckoutSession {
    order_id: i64,
    currency: String,
    lines: Vec<OrderLine>,
    // Already filtered by the API for each product.
    auto_promotions: HashMap<i64, Vec<UserPromotion>>,
    claimed: Vec<UserPromotion>,
    selected: Option<i64>,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTotal {
    pub product_id: i64,
    pub category_id: i64,
    pub quantity: u32,
    pub unit_price: Money,
    pub auto_discount: i32,
    pub general_discount: i32,
    pub effective_discount: i32,
    pub line_original: Money,
    pub line_final: Money,
}

/// A claimed promotion as offered in the coupon picker. Used coupons stay in
/// the list, flagged non-selectable, so the UI can strike them through.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionOption {
    pub promotion_id: i64,
    pub code: String,
    pub discount_percent: i32,
    pub is_used: bool,
    pub selectable: bool,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub order_id: i64,
    pub lines: Vec<LineTotal>,
    pub promotions: Vec<PromotionOption>,
    pub selected_promotion_id: Option<i64>,
    pub total_original: Money,
    pub total_final: Money,
    pub total_discount: Money,
}

impl CheckoutSession {
    pub fn new(order: OrderDetails, currency: &str) -> Self {
        Self {
            order_id: order.order_id,
            currency: currency.to_string(),
            lines: order.lines,
            auto_promotions: HashMap::new(),
            claimed: vec![],
            selected: None,
            events: vec![],
        }
    }

    pub fn order_id(&self) -> i64 { self.order_id }
    pub fn lines(&self) -> &[OrderLine] { &self.lines }
    pub fn selected_promotion_id(&self) -> Option<i64> { self.selected }
    pub fn claimed_promotions(&self) -> &[UserPromotion] { &self.claimed }

    pub fn set_auto_promotions(&mut self, product_id: i64, promotions: Vec<UserPromotion>) {
        self.auto_promotions.insert(product_id, promotions);
    }

    /// Replaces the claimed list. A selection that no longer points at a
    /// selectable promotion is dropped.
    pub fn set_claimed_promotions(&mut self, promotions: Vec<UserPromotion>) {
        self.claimed = promotions;
        if let Some(id) = self.selected {
            if self.find_selectable(id).is_err() {
                self.clear_selection();
            }
        }
    }

    /// Select the order-wide coupon. On error the current selection is kept.
    pub fn select_promotion(&mut self, promotion_id: i64) -> Result<(), CheckoutError> {
        if self.selected == Some(promotion_id) { return Ok(()); }
        self.find_selectable(promotion_id)?;
        self.selected = Some(promotion_id);
        self.raise_event(DomainEvent::Checkout(CheckoutEvent::PromotionSelected { order_id: self.order_id, promotion_id }));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.raise_event(DomainEvent::Checkout(CheckoutEvent::PromotionCleared { order_id: self.order_id }));
        }
    }

    pub fn promotion_options(&self) -> Vec<PromotionOption> {
        self.claimed
            .iter()
            .map(|p| PromotionOption {
                promotion_id: p.promotion.promotion_id,
                code: p.promotion.code.clone(),
                discount_percent: p.promotion.discount_percent,
                is_used: p.is_used,
                selectable: !p.is_used && p.promotion.apply_type.is_claimable(),
                selected: self.selected == Some(p.promotion.promotion_id),
            })
            .collect()
    }

    pub fn line_totals(&self) -> Result<Vec<LineTotal>, CheckoutError> {
        let general = self.general_discount();
        self.lines
            .iter()
            .map(|line| {
                let auto = self.auto_discount(line.product_id);
                let effective = auto.max(general);
                let unit_price = Money::new(line.unit_price, &self.currency);
                let line_original = unit_price.multiply(line.quantity)?;
                let line_final = line_original.discounted(effective)?;
                Ok(LineTotal {
                    product_id: line.product_id,
                    category_id: line.category_id,
                    quantity: line.quantity,
                    unit_price,
                    auto_discount: auto.percent(),
                    general_discount: general.percent(),
                    effective_discount: effective.percent(),
                    line_original,
                    line_final,
                })
            })
            .collect()
    }

    /// Totals are summed per line, not derived from one order-wide rate,
    /// because auto discounts differ between products.
    pub fn summary(&self) -> Result<CheckoutSummary, CheckoutError> {
        let lines = self.line_totals()?;
        let total_original = Money::total(&self.currency, lines.iter().map(|l| &l.line_original))?;
        let total_final = Money::total(&self.currency, lines.iter().map(|l| &l.line_final))?;
        Ok(CheckoutSummary {
            order_id: self.order_id,
            promotions: self.promotion_options(),
            selected_promotion_id: self.selected,
            total_discount: total_original.subtract(&total_final)?,
            total_original,
            total_final,
            lines,
        })
    }

    pub fn payment_request(&self, user_id: i64) -> Result<PaymentRequest, CheckoutError> {
        if self.lines.is_empty() { return Err(CheckoutError::NoLines); }
        Ok(PaymentRequest {
            order_id: self.order_id,
            user_id,
            promotion_id: self.selected,
            amount: self.summary()?.total_final.amount(),
        })
    }

    pub fn record_payment(&mut self, request: &PaymentRequest, receipt: &PaymentReceipt) {
        self.raise_event(DomainEvent::Checkout(CheckoutEvent::PaymentSubmitted {
            order_id: self.order_id,
            payment_id: receipt.payment_id.clone(),
            promotion_id: request.promotion_id,
            amount: request.amount,
        }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }

    fn auto_discount(&self, product_id: i64) -> DiscountRate {
        self.auto_promotions
            .get(&product_id)
            .into_iter()
            .flatten()
            .filter(|p| p.promotion.apply_type.is_automatic())
            .map(|p| DiscountRate::new(p.promotion.discount_percent))
            .max()
            .unwrap_or(DiscountRate::NONE)
    }

    fn general_discount(&self) -> DiscountRate {
        self.selected
            .and_then(|id| self.find_selectable(id).ok())
            .map(|p| DiscountRate::new(p.promotion.discount_percent))
            .unwrap_or(DiscountRate::NONE)
    }

    fn find_selectable(&self, promotion_id: i64) -> Result<&UserPromotion, CheckoutError> {
        let promo = self
            .claimed
            .iter()
            .find(|p| p.promotion.promotion_id == promotion_id)
            .ok_or(CheckoutError::UnknownPromotion(promotion_id))?;
        if promo.is_used { return Err(CheckoutError::PromotionUsed(promotion_id)); }
        if !promo.promotion.apply_type.is_claimable() { return Err(CheckoutError::NotSelectable(promotion_id)); }
        Ok(promo)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Order has no lines")]
    NoLines,
    #[error("Promotion {0} is not among the claimed promotions")]
    UnknownPromotion(i64),
    #[error("Promotion {0} has already been used")]
    PromotionUsed(i64),
    #[error("Promotion {0} cannot be selected at checkout")]
    NotSelectable(i64),
    #[error("Order total cannot be computed: {0}")]
    Amount(#[from] MoneyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{category_promotion, claimed, line, product_promotion, promotion};
    use crate::ApplyType;
    use rust_decimal::Decimal;

    fn order(lines: Vec<OrderLine>) -> OrderDetails {
        OrderDetails { order_id: 42, user_id: 7, lines }
    }

    #[test]
    fn test_selected_general_promotion() {
        let mut session = CheckoutSession::new(order(vec![line(1, 1, 3, 50_000)]), "VND");
        session.set_claimed_promotions(vec![claimed(promotion(9, ApplyType::General, 20), false)]);
        session.select_promotion(9).unwrap();
        let totals = session.line_totals().unwrap();
        assert_eq!(totals[0].effective_discount, 20);
        assert_eq!(totals[0].line_original.amount(), Decimal::new(150_000, 0));
        assert_eq!(totals[0].line_final.amount(), Decimal::new(120_000, 0));
    }

    #[test]
    fn test_used_promotion_not_selectable() {
        let mut session = CheckoutSession::new(order(vec![line(1, 1, 1, 100)]), "VND");
        session.set_claimed_promotions(vec![
            claimed(promotion(1, ApplyType::User, 10), false),
            claimed(promotion(2, ApplyType::General, 50), true),
        ]);
        session.select_promotion(1).unwrap();
        assert_eq!(session.select_promotion(2), Err(CheckoutError::PromotionUsed(2)));
        assert_eq!(session.selected_promotion_id(), Some(1));

        let options = session.promotion_options();
        let used = options.iter().find(|o| o.promotion_id == 2).unwrap();
        assert!(used.is_used);
        assert!(!used.selectable);
        assert!(options.iter().find(|o| o.promotion_id == 1).unwrap().selected);
    }

    #[test]
    fn test_unknown_and_automatic_promotions_rejected() {
        let mut session = CheckoutSession::new(order(vec![line(1, 1, 1, 100)]), "VND");
        session.set_claimed_promotions(vec![claimed(product_promotion(3, 30, &[1]), false)]);
        assert_eq!(session.select_promotion(99), Err(CheckoutError::UnknownPromotion(99)));
        assert_eq!(session.select_promotion(3), Err(CheckoutError::NotSelectable(3)));
        assert_eq!(session.selected_promotion_id(), None);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_discounts_do_not_stack() {
        let mut session = CheckoutSession::new(order(vec![line(1, 1, 1, 1_000), line(2, 5, 2, 1_000)]), "VND");
        session.set_auto_promotions(1, vec![claimed(product_promotion(1, 30, &[1]), false)]);
        session.set_auto_promotions(2, vec![claimed(category_promotion(2, 5, &[5]), false)]);
        session.set_claimed_promotions(vec![claimed(promotion(3, ApplyType::General, 10), false)]);
        session.select_promotion(3).unwrap();

        let totals = session.line_totals().unwrap();
        assert_eq!(totals[0].effective_discount, 30);
        assert_eq!(totals[0].line_final.amount(), Decimal::new(700, 0));
        assert_eq!(totals[1].auto_discount, 5);
        assert_eq!(totals[1].effective_discount, 10);
        assert_eq!(totals[1].line_final.amount(), Decimal::new(1_800, 0));
        for t in &totals {
            assert_eq!(t.effective_discount, t.auto_discount.max(t.general_discount));
        }
    }

    #[test]
    fn test_totals_summed_per_line() {
        let mut session = CheckoutSession::new(order(vec![line(1, 1, 1, 1_000), line(2, 2, 1, 1_000)]), "VND");
        session.set_auto_promotions(1, vec![claimed(product_promotion(1, 50, &[1]), false)]);
        let summary = session.summary().unwrap();
        assert_eq!(summary.total_original.amount(), Decimal::new(2_000, 0));
        assert_eq!(summary.total_final.amount(), Decimal::new(1_500, 0));
        assert_eq!(summary.total_discount.amount(), Decimal::new(500, 0));
        assert_eq!(summary.total_final.currency(), "VND");
    }

    #[test]
    fn test_no_promotions_means_full_price() {
        let session = CheckoutSession::new(order(vec![line(1, 1, 2, 250)]), "VND");
        let summary = session.summary().unwrap();
        assert_eq!(summary.total_final, summary.total_original);
        assert_eq!(summary.selected_promotion_id, None);
    }

    #[test]
    fn test_selection_events() {
        let mut session = CheckoutSession::new(order(vec![line(1, 1, 1, 100)]), "VND");
        session.set_claimed_promotions(vec![claimed(promotion(4, ApplyType::User, 10), false)]);
        session.select_promotion(4).unwrap();
        session.select_promotion(4).unwrap();
        session.clear_selection();
        session.clear_selection();
        assert_eq!(
            session.take_events(),
            vec![
                DomainEvent::Checkout(CheckoutEvent::PromotionSelected { order_id: 42, promotion_id: 4 }),
                DomainEvent::Checkout(CheckoutEvent::PromotionCleared { order_id: 42 }),
            ]
        );
    }

    #[test]
    fn test_reloading_claimed_drops_consumed_selection() {
        let mut session = CheckoutSession::new(order(vec![line(1, 1, 1, 100)]), "VND");
        session.set_claimed_promotions(vec![claimed(promotion(4, ApplyType::User, 10), false)]);
        session.select_promotion(4).unwrap();
        session.set_claimed_promotions(vec![claimed(promotion(4, ApplyType::User, 10), true)]);
        assert_eq!(session.selected_promotion_id(), None);
    }

    #[test]
    fn test_payment_request() {
        let mut session = CheckoutSession::new(order(vec![line(1, 1, 2, 500)]), "VND");
        session.set_claimed_promotions(vec![claimed(promotion(4, ApplyType::General, 10), false)]);
        session.select_promotion(4).unwrap();
        let request = session.payment_request(7).unwrap();
        assert_eq!(request.promotion_id, Some(4));
        assert_eq!(request.amount, Decimal::new(900, 0));

        let empty = CheckoutSession::new(order(vec![]), "VND");
        assert_eq!(empty.payment_request(7), Err(CheckoutError::NoLines));
    }

    #[test]
    fn test_out_of_range_order_is_an_error() {
        let mut huge = line(1, 1, 4_000_000_000, 1);
        huge.unit_price = Decimal::MAX;
        let session = CheckoutSession::new(order(vec![huge]), "VND");
        assert_eq!(session.summary(), Err(CheckoutError::Amount(MoneyError::Overflow)));
        assert_eq!(session.payment_request(7), Err(CheckoutError::Amount(MoneyError::Overflow)));
    }
}
