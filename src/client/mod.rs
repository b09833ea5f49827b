//! HTTP request pipeline.
//!
//! [`ApiClient`] is the single entry point for backend traffic. Call sites
//! issue plain typed requests; auth attachment, proactive and reactive token
//! refresh, the bounded 401 retry loop, and circuit breaker bookkeeping all
//! happen inside the pipeline.

mod api_client;

pub use api_client::ApiClient;
