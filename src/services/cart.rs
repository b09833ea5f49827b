//! Shopping cart operations. All endpoints are protected, so cart calls are
//! the main consumer of the proactive-refresh path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::{RefreshClient, TokenStore};
use crate::client::ApiClient;
use crate::config::endpoints;
use crate::error::ApiError;

/// One line of the cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Request body for adding a product to the cart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// Request body for changing a line's quantity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Cart endpoints.
pub struct CartApi<C, S> {
    client: Arc<ApiClient<C, S>>,
}

impl<C, S> CartApi<C, S>
where
    C: RefreshClient + 'static,
    S: TokenStore + 'static,
{
    #[must_use]
    pub fn new(client: Arc<ApiClient<C, S>>) -> Self {
        Self { client }
    }

    /// Current cart contents.
    pub async fn items(&self) -> Result<Vec<CartItem>, ApiError> {
        self.client.get(endpoints::cart::ITEMS).await
    }

    /// Add a product, answering the created line.
    pub async fn add_item(&self, request: &AddItemRequest) -> Result<CartItem, ApiError> {
        self.client.post(endpoints::cart::ITEMS, request).await
    }

    /// Change a line's quantity, answering the updated line.
    pub async fn update_item(
        &self,
        item_id: &str,
        request: &UpdateItemRequest,
    ) -> Result<CartItem, ApiError> {
        self.client.put(&endpoints::cart::item(item_id), request).await
    }

    /// Remove one line.
    pub async fn remove_item(&self, item_id: &str) -> Result<(), ApiError> {
        self.client.delete(&endpoints::cart::item(item_id)).await
    }

    /// Empty the cart.
    pub async fn clear(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self.client.post_empty(endpoints::cart::CLEAR).await?;
        Ok(())
    }
}
