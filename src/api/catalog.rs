use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use super::{ApiError, ApiResponse, AppState};
use crate::domain::aggregates::{CatalogPage, CatalogQuery, PricedProduct};
use crate::loader::{CatalogLoad, PromotionFeed};
use crate::scope::ViewScope;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPayload {
    #[serde(flatten)]
    pub page: CatalogPage,
    /// False when promotions could not be loaded and prices are shown
    /// undiscounted.
    pub promotions_confirmed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(flatten)]
    pub product: PricedProduct,
    pub promotions_confirmed: bool,
}

fn render(load: CatalogLoad, query: &CatalogQuery) -> ApiResponse<CatalogPayload> {
    let (view, feed, notices) = load.into_view();
    let page = view.query(query);
    ApiResponse::new(CatalogPayload { page, promotions_confirmed: feed.is_confirmed() }, notices)
}

pub async fn list_catalog(
    State(s): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<ApiResponse<CatalogPayload>>, ApiError> {
    let scope = ViewScope::new();
    let load = s.loader.load_catalog(&scope, None).await?;
    Ok(Json(render(load, &q)))
}

pub async fn category_catalog(
    State(s): State<AppState>,
    Path(category_id): Path<i64>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<ApiResponse<CatalogPayload>>, ApiError> {
    let scope = ViewScope::new();
    let load = s.loader.load_catalog(&scope, Some(category_id)).await?;
    Ok(Json(render(load, &q)))
}

pub async fn product_detail(
    State(s): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<ProductPayload>>, ApiError> {
    let scope = ViewScope::new();
    let load = s.loader.load_product(&scope, product_id).await?;
    let promotions_confirmed = matches!(load.promotions, PromotionFeed::Loaded(_));
    Ok(Json(ApiResponse::new(ProductPayload { product: load.product, promotions_confirmed }, load.notices)))
}
