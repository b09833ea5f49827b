//! Typed service wrappers over the request pipeline.
//!
//! Each service owns one backend resource family and translates between
//! domain types and the wire DTOs. Services hold a shared [`ApiClient`]
//! and add no resilience logic of their own; the pipeline already covers
//! auth and failure handling.
//!
//! [`ApiClient`]: crate::client::ApiClient

mod cart;
mod catalog;
mod orders;
mod session;

pub use cart::{AddItemRequest, CartApi, CartItem, UpdateItemRequest};
pub use catalog::{CatalogApi, Category, Product};
pub use orders::{NewOrder, Order, OrdersApi};
pub use session::{AuthPayload, Credentials, Registration, SessionApi, User};
