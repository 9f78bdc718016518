//! Catalog view: products priced against the active promotions, plus the
//! filtering and sorting the listing pages offer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::discount::{resolve_discount, PriceQuote};
use crate::{Product, Promotion};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: Product,
    #[serde(flatten)]
    pub quote: PriceQuote,
}

impl PricedProduct {
    pub fn new<P: AsRef<Promotion>>(product: Product, promotions: &[P]) -> Self {
        let quote = resolve_discount(&product, promotions);
        Self { product, quote }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    /// Keep the order the API returned.
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    DiscountDesc,
    NameAsc,
}

/// Listing filters. Price bounds apply to the discounted price.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub on_sale_only: bool,
    pub sort: CatalogSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// One page of a filtered, sorted listing. `total` counts every match.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub products: Vec<PricedProduct>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

impl CatalogQuery {
    pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }
    pub fn per_page(&self) -> u32 { self.per_page.unwrap_or(20).clamp(1, 100) }

    fn matches(&self, entry: &PricedProduct) -> bool {
        if let Some(category_id) = self.category_id {
            if entry.product.category_id != category_id { return false; }
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !entry.product.name.to_lowercase().contains(&search.to_lowercase()) { return false; }
        }
        if self.min_price.is_some_and(|min| entry.quote.final_price < min) { return false; }
        if self.max_price.is_some_and(|max| entry.quote.final_price > max) { return false; }
        !self.on_sale_only || entry.quote.is_discounted()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CatalogView {
    entries: Vec<PricedProduct>,
}

impl CatalogView {
    pub fn price<P: AsRef<Promotion>>(products: Vec<Product>, promotions: &[P]) -> Self {
        let entries = products.into_iter().map(|p| PricedProduct::new(p, promotions)).collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[PricedProduct] { &self.entries }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn query(self, query: &CatalogQuery) -> CatalogPage {
        let mut entries: Vec<PricedProduct> = self.entries.into_iter().filter(|e| query.matches(e)).collect();
        match query.sort {
            CatalogSort::Relevance => {}
            CatalogSort::PriceAsc => entries.sort_by(|a, b| a.quote.final_price.cmp(&b.quote.final_price)),
            CatalogSort::PriceDesc => entries.sort_by(|a, b| b.quote.final_price.cmp(&a.quote.final_price)),
            CatalogSort::DiscountDesc => entries.sort_by(|a, b| b.quote.discount_percent.cmp(&a.quote.discount_percent)),
            CatalogSort::NameAsc => entries.sort_by_key(|e| e.product.name.to_lowercase()),
        }
        let (page, per_page) = (query.page(), query.per_page());
        let total = entries.len();
        let offset = (page as usize - 1).saturating_mul(per_page as usize);
        let products = entries.into_iter().skip(offset).take(per_page as usize).collect();
        CatalogPage { products, total, page, per_page }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{category_promotion, named_product, product_promotion};

    fn view() -> CatalogView {
        let products = vec![
            named_product(1, 10, "Green Tea", 100_000),
            named_product(2, 10, "black tea", 80_000),
            named_product(3, 20, "Coffee Beans", 120_000),
        ];
        let promos = vec![category_promotion(1, 10, &[10]), product_promotion(2, 50, &[3])];
        CatalogView::price(products, &promos)
    }

    fn ids(page: &CatalogPage) -> Vec<i64> {
        page.products.iter().map(|e| e.product.id).collect()
    }

    #[test]
    fn test_prices_every_product() {
        let v = view();
        assert_eq!(v.len(), 3);
        let prices: Vec<Decimal> = v.entries().iter().map(|e| e.quote.final_price).collect();
        assert_eq!(prices, vec![Decimal::new(90_000, 0), Decimal::new(72_000, 0), Decimal::new(60_000, 0)]);
    }

    #[test]
    fn test_relevance_keeps_order() {
        assert_eq!(ids(&view().query(&CatalogQuery::default())), vec![1, 2, 3]);
    }

    #[test]
    fn test_sorts() {
        let by = |sort| ids(&view().query(&CatalogQuery { sort, ..Default::default() }));
        assert_eq!(by(CatalogSort::PriceAsc), vec![3, 2, 1]);
        assert_eq!(by(CatalogSort::PriceDesc), vec![1, 2, 3]);
        assert_eq!(by(CatalogSort::DiscountDesc), vec![3, 1, 2]);
        assert_eq!(by(CatalogSort::NameAsc), vec![2, 3, 1]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let q = CatalogQuery { search: Some("TEA".into()), ..Default::default() };
        assert_eq!(ids(&view().query(&q)), vec![1, 2]);
    }

    #[test]
    fn test_price_bounds_use_final_price() {
        // Coffee lists at 120,000 but sells at 60,000.
        let q = CatalogQuery { max_price: Some(Decimal::new(75_000, 0)), ..Default::default() };
        assert_eq!(ids(&view().query(&q)), vec![2, 3]);
        let q = CatalogQuery { min_price: Some(Decimal::new(80_000, 0)), ..Default::default() };
        assert_eq!(ids(&view().query(&q)), vec![1]);
    }

    #[test]
    fn test_category_and_sale_filters() {
        let products = vec![named_product(1, 10, "A", 10), named_product(2, 20, "B", 10)];
        let v = CatalogView::price(products, &[category_promotion(1, 10, &[10])]);
        let q = CatalogQuery { on_sale_only: true, ..Default::default() };
        assert_eq!(ids(&v.clone().query(&q)), vec![1]);
        let q = CatalogQuery { category_id: Some(20), ..Default::default() };
        assert_eq!(ids(&v.query(&q)), vec![2]);
    }

    #[test]
    fn test_pagination() {
        let q = CatalogQuery { page: Some(2), per_page: Some(2), ..Default::default() };
        let page = view().query(&q);
        assert_eq!(ids(&page), vec![3]);
        assert_eq!(page.total, 3);
        assert_eq!((page.page, page.per_page), (2, 2));

        let q = CatalogQuery { page: Some(5), per_page: Some(2), ..Default::default() };
        let page = view().query(&q);
        assert!(page.products.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_pagination_bounds_clamped() {
        let q = CatalogQuery { page: Some(0), per_page: Some(500), ..Default::default() };
        assert_eq!((q.page(), q.per_page()), (1, 100));
        let q = CatalogQuery { per_page: Some(0), ..Default::default() };
        assert_eq!(q.per_page(), 1);
        assert_eq!(CatalogQuery::default().per_page(), 20);
    }
}
