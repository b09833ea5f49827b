//! Order placement and history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::{RefreshClient, TokenStore};
use crate::client::ApiClient;
use crate::config::endpoints;
use crate::error::ApiError;

/// Request body for placing an order from the current cart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub shipping_address: String,
    pub payment_method: String,
}

/// Placed order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub status: String,
    pub total: f64,
    pub created_at: String,
}

/// Order endpoints.
pub struct OrdersApi<C, S> {
    client: Arc<ApiClient<C, S>>,
}

impl<C, S> OrdersApi<C, S>
where
    C: RefreshClient + 'static,
    S: TokenStore + 'static,
{
    #[must_use]
    pub fn new(client: Arc<ApiClient<C, S>>) -> Self {
        Self { client }
    }

    /// Place an order from the current cart.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, ApiError> {
        self.client.post(endpoints::orders::ROOT, order).await
    }

    /// List the account's orders.
    pub async fn list(&self) -> Result<Vec<Order>, ApiError> {
        self.client.get(endpoints::orders::ROOT).await
    }

    /// Fetch one order by id.
    pub async fn order(&self, order_id: &str) -> Result<Order, ApiError> {
        self.client.get(&endpoints::orders::details(order_id)).await
    }
}
