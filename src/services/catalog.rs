//! Product catalogue: browsing is public-by-auth but routed through the
//! pipeline like everything else, so catalogue traffic still feeds the
//! circuit breaker.

use std::sync::Arc;

use serde::Deserialize;

use crate::auth::{RefreshClient, TokenStore};
use crate::client::ApiClient;
use crate::config::endpoints;
use crate::error::ApiError;

/// Storefront product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub category_id: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
}

/// Product category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// Catalogue endpoints.
pub struct CatalogApi<C, S> {
    client: Arc<ApiClient<C, S>>,
}

impl<C, S> CatalogApi<C, S>
where
    C: RefreshClient + 'static,
    S: TokenStore + 'static,
{
    #[must_use]
    pub fn new(client: Arc<ApiClient<C, S>>) -> Self {
        Self { client }
    }

    /// List all products.
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.client.get(endpoints::products::LIST).await
    }

    /// Fetch one product by slug.
    pub async fn product(&self, slug: &str) -> Result<Product, ApiError> {
        self.client.get(&endpoints::products::details(slug)).await
    }

    /// List all categories.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.client.get(endpoints::categories::LIST).await
    }
}
