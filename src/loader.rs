//! Promotion catalog loading.
//!
//! Fetches what a page needs, concurrently, inside a [`ViewScope`]. Fetch
//! failures are not fatal for pricing: products fall back to an empty list and
//! promotions to [`PromotionFeed::Unavailable`], each with a [`Notice`] for the
//! UI. An unavailable feed prices like an empty one but stays
//! distinguishable from a confirmed "no promotions".

use std::collections::{BTreeSet, HashMap};

use futures::future::join_all;
use serde::Serialize;

use crate::client::StorefrontApiClient;
use crate::domain::aggregates::{CatalogView, CheckoutSession, PricedProduct};
use crate::scope::ViewScope;
use crate::{OrderDetails, Product, Promotion, Result, UserPromotion};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-visible transient notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PromotionFeed {
    /// Confirmed by the API, possibly empty.
    Loaded(Vec<Promotion>),
    /// The API could not be reached; prices are shown undiscounted.
    Unavailable { reason: String },
}

impl PromotionFeed {
    pub fn promotions(&self) -> &[Promotion] {
        match self {
            Self::Loaded(promotions) => promotions,
            Self::Unavailable { .. } => &[],
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    fn from_result(result: Result<Vec<Promotion>>, notices: &mut Vec<Notice>) -> Self {
        match result {
            Ok(promotions) => Self::Loaded(promotions),
            Err(e) => {
                tracing::warn!(error = %e, "promotions unavailable, pricing without discounts");
                notices.push(Notice::warning(format!("Promotions could not be loaded: {e}")));
                Self::Unavailable { reason: e.to_string() }
            }
        }
    }
}

#[derive(Debug)]
pub struct CatalogLoad {
    pub products: Vec<Product>,
    pub promotions: PromotionFeed,
    pub notices: Vec<Notice>,
}

impl CatalogLoad {
    pub fn into_view(self) -> (CatalogView, PromotionFeed, Vec<Notice>) {
        let view = CatalogView::price(self.products, self.promotions.promotions());
        (view, self.promotions, self.notices)
    }
}

#[derive(Debug)]
pub struct ProductLoad {
    pub product: PricedProduct,
    pub promotions: PromotionFeed,
    pub notices: Vec<Notice>,
}

#[derive(Debug)]
pub struct CheckoutLoad {
    pub order: OrderDetails,
    pub claimed: Vec<UserPromotion>,
    pub auto: HashMap<i64, Vec<UserPromotion>>,
    pub notices: Vec<Notice>,
}

impl CheckoutLoad {
    pub fn into_session(self, currency: &str) -> (CheckoutSession, Vec<Notice>) {
        let mut session = CheckoutSession::new(self.order, currency);
        for (product_id, promotions) in self.auto {
            session.set_auto_promotions(product_id, promotions);
        }
        session.set_claimed_promotions(self.claimed);
        (session, self.notices)
    }
}

#[derive(Clone, Debug)]
pub struct CatalogLoader {
    client: StorefrontApiClient,
}

impl CatalogLoader {
    pub fn new(client: StorefrontApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &StorefrontApiClient {
        &self.client
    }

    pub async fn load_promotions(&self, scope: &ViewScope) -> Result<(PromotionFeed, Vec<Notice>)> {
        let result = scope.run(async { Ok(self.client.active_promotions().await) }).await?;
        let mut notices = vec![];
        let feed = PromotionFeed::from_result(result, &mut notices);
        Ok((feed, notices))
    }

    /// Products (all, or one category) and active promotions, fetched
    /// together. Only cancellation is an error.
    pub async fn load_catalog(&self, scope: &ViewScope, category_id: Option<i64>) -> Result<CatalogLoad> {
        let products = async {
            match category_id {
                Some(id) => self.client.category_products(id).await,
                None => self.client.products().await,
            }
        };
        let (products, promotions) = scope
            .run(async { Ok(tokio::join!(products, self.client.active_promotions())) })
            .await?;

        let mut notices = vec![];
        let products = match products {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, ?category_id, "product listing failed");
                notices.push(Notice::error(format!("Products could not be loaded: {e}")));
                vec![]
            }
        };
        let promotions = PromotionFeed::from_result(promotions, &mut notices);
        tracing::debug!(products = products.len(), confirmed = promotions.is_confirmed(), "catalog loaded");
        Ok(CatalogLoad { products, promotions, notices })
    }

    /// A single product for its detail page. The product itself is required.
    pub async fn load_product(&self, scope: &ViewScope, product_id: i64) -> Result<ProductLoad> {
        let (product, promotions) = scope
            .run(async { Ok(tokio::join!(self.client.product(product_id), self.client.active_promotions())) })
            .await?;
        let product = product?;
        let mut notices = vec![];
        let promotions = PromotionFeed::from_result(promotions, &mut notices);
        let product = PricedProduct::new(product, promotions.promotions());
        Ok(ProductLoad { product, promotions, notices })
    }

    /// Order lines, the user's claimed coupons and the automatic promotions
    /// of every product in the order. Without the order there is nothing to
    /// price, so that failure is returned; the promotion lists degrade.
    pub async fn load_checkout(&self, scope: &ViewScope, order_id: i64, user_id: i64) -> Result<CheckoutLoad> {
        let (order, claimed) = scope
            .run(async {
                Ok(tokio::join!(self.client.order_details(order_id), self.client.claimed_promotions(user_id)))
            })
            .await?;
        let order = order?;

        let mut notices = vec![];
        let claimed = match claimed {
            Ok(claimed) => claimed,
            Err(e) => {
                tracing::warn!(error = %e, user_id, "claimed promotions unavailable");
                notices.push(Notice::warning(format!("Your promotions could not be loaded: {e}")));
                vec![]
            }
        };

        let product_ids: BTreeSet<i64> = order.lines.iter().map(|l| l.product_id).collect();
        let fetches = product_ids.into_iter().map(|id| async move { (id, self.client.product_promotions(id).await) });
        let results = scope.run(async { Ok(join_all(fetches).await) }).await?;

        let mut auto = HashMap::new();
        for (product_id, result) in results {
            match result {
                Ok(promotions) => {
                    auto.insert(product_id, promotions);
                }
                Err(e) => {
                    tracing::warn!(error = %e, product_id, "product promotions unavailable");
                    notices.push(Notice::warning(format!("Promotions for product {product_id} could not be loaded")));
                }
            }
        }

        Ok(CheckoutLoad { order, claimed, auto, notices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorefrontError;
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    fn loader(server: &MockServer) -> CatalogLoader {
        CatalogLoader::new(StorefrontApiClient::new(&format!("{}/api", server.uri()), 5).unwrap())
    }

    #[tokio::test]
    async fn test_catalog_prices_with_promotions() {
        let server = MockServer::start().await;
        mount(&server, "/api/products", 200, json!([
            {"id": 1, "categoryId": 7, "name": "Tea", "price": 100000},
        ])).await;
        mount(&server, "/api/promotions/active", 200, json!([
            {"promotionId": 1, "code": "CAT10", "discountPercent": 10, "applyType": "Category", "categoryIds": [7]},
        ])).await;

        let scope = ViewScope::new();
        let load = loader(&server).load_catalog(&scope, None).await.unwrap();
        assert!(load.notices.is_empty());
        let (view, feed, _) = load.into_view();
        assert!(feed.is_confirmed());
        assert_eq!(view.entries()[0].quote.final_price, Decimal::new(90_000, 0));
    }

    #[tokio::test]
    async fn test_promotion_failure_degrades_to_unavailable() {
        let server = MockServer::start().await;
        mount(&server, "/api/categories/7/products", 200, json!([
            {"id": 1, "categoryId": 7, "name": "Tea", "price": 100000},
        ])).await;
        mount(&server, "/api/promotions/active", 503, json!({"message": "maintenance"})).await;

        let scope = ViewScope::new();
        let load = loader(&server).load_catalog(&scope, Some(7)).await.unwrap();
        assert_eq!(load.notices.len(), 1);
        assert_eq!(load.notices[0].level, NoticeLevel::Warning);
        assert!(matches!(load.promotions, PromotionFeed::Unavailable { ref reason } if reason.contains("maintenance")));
        let (view, _, _) = load.into_view();
        assert_eq!(view.entries()[0].quote.final_price, Decimal::new(100_000, 0));
    }

    #[tokio::test]
    async fn test_confirmed_empty_differs_from_unavailable() {
        let server = MockServer::start().await;
        mount(&server, "/api/promotions/active", 200, json!([])).await;
        let scope = ViewScope::new();
        let (feed, notices) = loader(&server).load_promotions(&scope).await.unwrap();
        assert_eq!(feed, PromotionFeed::Loaded(vec![]));
        assert!(notices.is_empty());
        assert_ne!(feed, PromotionFeed::Unavailable { reason: String::new() });
    }

    #[tokio::test]
    async fn test_product_failure_yields_empty_listing() {
        let server = MockServer::start().await;
        mount(&server, "/api/products", 500, json!({"message": "boom"})).await;
        mount(&server, "/api/promotions/active", 200, json!([])).await;
        let scope = ViewScope::new();
        let load = loader(&server).load_catalog(&scope, None).await.unwrap();
        assert!(load.products.is_empty());
        assert_eq!(load.notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_cancelled_scope() {
        let server = MockServer::start().await;
        let scope = ViewScope::new();
        scope.cancel();
        let result = loader(&server).load_catalog(&scope, None).await;
        assert!(matches!(result, Err(StorefrontError::Cancelled)));
    }

    #[tokio::test]
    async fn test_checkout_load_builds_session() {
        let server = MockServer::start().await;
        mount(&server, "/api/orders/42", 200, json!({
            "orderId": 42, "userId": 7,
            "lines": [
                {"productId": 1, "categoryId": 3, "quantity": 2, "unitPrice": 1000},
                {"productId": 2, "categoryId": 4, "quantity": 1, "unitPrice": 500}
            ]
        })).await;
        mount(&server, "/api/users/7/promotions", 200, json!([
            {"promotionId": 9, "code": "WELCOME", "discountPercent": 20, "applyType": "User", "isUsed": false},
        ])).await;
        mount(&server, "/api/products/1/promotions", 200, json!([
            {"promotionId": 5, "code": "P30", "discountPercent": 30, "applyType": "Product", "productIds": [1]},
        ])).await;
        mount(&server, "/api/products/2/promotions", 500, json!({})).await;

        let scope = ViewScope::new();
        let load = loader(&server).load_checkout(&scope, 42, 7).await.unwrap();
        assert_eq!(load.notices.len(), 1);
        let (mut session, _) = load.into_session("VND");
        session.select_promotion(9).unwrap();
        let summary = session.summary().unwrap();
        assert_eq!(summary.lines[0].effective_discount, 30);
        assert_eq!(summary.lines[1].effective_discount, 20);
        assert_eq!(summary.total_final.amount(), Decimal::new(1_800, 0));
    }

    #[tokio::test]
    async fn test_missing_order_is_fatal() {
        let server = MockServer::start().await;
        mount(&server, "/api/orders/1", 404, json!({"message": "Order not found"})).await;
        mount(&server, "/api/users/7/promotions", 200, json!([])).await;
        let scope = ViewScope::new();
        let err = loader(&server).load_checkout(&scope, 1, 7).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
