//! JSON endpoints consumed by the storefront UI.
mod cart;
mod catalog;
mod checkout;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::bus::EventBus;
use crate::domain::aggregates::{CartError, CheckoutError};
use crate::loader::{CatalogLoader, Notice};
use crate::StorefrontError;

#[derive(Clone)]
pub struct AppState {
    pub loader: CatalogLoader,
    pub bus: EventBus,
    pub currency: String,
}

/// Success envelope. `notices` carries the toast-style messages for
/// anything that degraded while the data was assembled.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub notices: Vec<Notice>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, notices: Vec<Notice>) -> Self {
        Self { data, notices }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code: "validation_error", message: message.into() }
    }
}

impl From<StorefrontError> for ApiError {
    fn from(e: StorefrontError) -> Self {
        let (status, code) = match &e {
            StorefrontError::Api { status: 404, .. } => (StatusCode::NOT_FOUND, "not_found"),
            StorefrontError::Api { status, .. } if (400..500).contains(status) => {
                (StatusCode::CONFLICT, "upstream_rejected")
            }
            StorefrontError::Api { .. } | StorefrontError::Http(_) | StorefrontError::Deserialize { .. } => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            // Order lines come from the API.
            StorefrontError::Checkout(CheckoutError::Amount(_)) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            StorefrontError::Checkout(_) => (StatusCode::BAD_REQUEST, "checkout_rejected"),
            StorefrontError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
            StorefrontError::InvalidUrl { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        if status.is_server_error() {
            tracing::error!(error = %e, "request failed");
        } else {
            tracing::warn!(error = %e, "request rejected");
        }
        let message = match e {
            StorefrontError::Api { message, .. } => message,
            other => other.to_string(),
        };
        Self { status, code, message }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(e: CheckoutError) -> Self {
        StorefrontError::from(e).into()
    }
}

impl From<CartError> for ApiError {
    fn from(e: CartError) -> Self {
        tracing::warn!(error = %e, "cart rejected");
        Self { status: StatusCode::BAD_REQUEST, code: "cart_rejected", message: e.to_string() }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({"error": {"code": self.code, "message": self.message}});
        (self.status, Json(body)).into_response()
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-storefront"})) }))
        .route("/api/v1/catalog", get(catalog::list_catalog))
        .route("/api/v1/categories/:id/catalog", get(catalog::category_catalog))
        .route("/api/v1/products/:id", get(catalog::product_detail))
        .route("/api/v1/cart/quote", post(cart::cart_quote))
        .route("/api/v1/checkout/quote", post(checkout::checkout_quote))
        .route("/api/v1/checkout/payment", post(checkout::checkout_payment))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}
