//! HTTP client for the storefront API.
//!
//! Thin typed wrapper over `reqwest`. Every call is a single attempt: non-2xx
//! answers become [`StorefrontError::Api`] carrying the API's own message so
//! the UI can show it verbatim, and callers decide whether to degrade.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::{OrderDetails, PaymentReceipt, PaymentRequest, Product, Promotion, Result, StorefrontError, UserPromotion};

/// Client for the storefront REST API.
#[derive(Clone, Debug)]
pub struct StorefrontApiClient {
    client: Client,
    base_url: Url,
}

impl StorefrontApiClient {
    /// # Errors
    ///
    /// Returns [`StorefrontError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`StorefrontError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("opensase-storefront/0.1")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StorefrontError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Promotions currently inside their active window.
    pub async fn active_promotions(&self) -> Result<Vec<Promotion>> {
        self.get_json("promotions/active").await
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        self.get_json("products").await
    }

    pub async fn category_products(&self, category_id: i64) -> Result<Vec<Product>> {
        self.get_json(&format!("categories/{category_id}/products")).await
    }

    pub async fn product(&self, product_id: i64) -> Result<Product> {
        self.get_json(&format!("products/{product_id}")).await
    }

    /// Coupons the user has claimed, including already used ones.
    pub async fn claimed_promotions(&self, user_id: i64) -> Result<Vec<UserPromotion>> {
        self.get_json(&format!("users/{user_id}/promotions")).await
    }

    /// Product/Category promotions the API considers applicable to a product.
    pub async fn product_promotions(&self, product_id: i64) -> Result<Vec<UserPromotion>> {
        self.get_json(&format!("products/{product_id}/promotions")).await
    }

    pub async fn order_details(&self, order_id: i64) -> Result<OrderDetails> {
        self.get_json(&format!("orders/{order_id}")).await
    }

    /// Submit the payment. The API is authoritative on the promotion and
    /// marks it used; a coupon consumed in the meantime comes back as an
    /// [`StorefrontError::Api`] error.
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        let url = self.endpoint("payments")?;
        tracing::debug!(%url, order_id = request.order_id, "creating payment");
        let response = self.client.post(url).json(request).send().await?;
        Self::decode(response, "payments").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "fetching");
        let response = self.client.get(url).send().await?;
        Self::decode(response, path).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| StorefrontError::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(StorefrontError::Api {
                status: status.as_u16(),
                message: error_message(&body, status.canonical_reason().unwrap_or("request failed")),
            });
        }
        serde_json::from_slice(&body).map_err(|source| StorefrontError::Deserialize {
            context: context.to_string(),
            source,
        })
    }
}

/// Prefer the API's `message` field, then the raw body, then the status text.
fn error_message(body: &[u8], fallback: &str) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() { fallback.to_string() } else { text }
}
