use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use super::{ApiError, ApiResponse, AppState};
use crate::domain::aggregates::{CheckoutSession, CheckoutSummary};
use crate::loader::Notice;
use crate::scope::ViewScope;
use crate::PaymentReceipt;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(range(min = 1))]
    pub order_id: i64,
    #[validate(range(min = 1))]
    pub user_id: i64,
    pub promotion_id: Option<i64>,
}

async fn open_session(s: &AppState, scope: &ViewScope, r: &CheckoutRequest) -> Result<(CheckoutSession, Vec<Notice>), ApiError> {
    r.validate()?;
    let load = s.loader.load_checkout(scope, r.order_id, r.user_id).await?;
    Ok(load.into_session(&s.currency))
}

/// Totals for the checkout screen. An unusable coupon leaves the selection
/// empty and is reported as a notice.
pub async fn checkout_quote(
    State(s): State<AppState>,
    Json(r): Json<CheckoutRequest>,
) -> Result<Json<ApiResponse<CheckoutSummary>>, ApiError> {
    let scope = ViewScope::new();
    let (mut session, mut notices) = open_session(&s, &scope, &r).await?;
    if let Some(promotion_id) = r.promotion_id {
        if let Err(e) = session.select_promotion(promotion_id) {
            notices.push(Notice::warning(e.to_string()));
        }
    }
    let summary = session.summary()?;
    s.bus.publish_all(session.take_events());
    Ok(Json(ApiResponse::new(summary, notices)))
}

/// Submit the payment. The API has the final word on the coupon; if it was
/// consumed since the quote, its error is passed through.
pub async fn checkout_payment(
    State(s): State<AppState>,
    Json(r): Json<CheckoutRequest>,
) -> Result<Json<ApiResponse<PaymentReceipt>>, ApiError> {
    let scope = ViewScope::new();
    let (mut session, notices) = open_session(&s, &scope, &r).await?;
    if let Some(promotion_id) = r.promotion_id {
        session.select_promotion(promotion_id)?;
    }
    let request = session.payment_request(r.user_id)?;
    let receipt = scope.run(s.loader.client().create_payment(&request)).await?;
    tracing::info!(order_id = request.order_id, payment_id = %receipt.payment_id, amount = %request.amount, "payment created");
    session.record_payment(&request, &receipt);
    s.bus.publish_all(session.take_events());
    Ok(Json(ApiResponse::new(receipt, notices)))
}
