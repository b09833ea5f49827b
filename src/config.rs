//! API configuration and endpoint catalogue.
//!
//! Paths are joined as `{base_url}/api/{version}{path}`. The public endpoint
//! allow-list drives the request pipeline's auth bypass: requests to these
//! paths are sent without a bearer token and are never retried via refresh.

use std::time::Duration;

use crate::resilience::CircuitBreakerConfig;

/// Endpoints that must never require an auth header.
///
/// Matched by substring against the request path, so both bare paths and
/// fully-qualified URLs classify correctly.
const PUBLIC_ENDPOINTS: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/auth/forgot-password",
    "/auth/verify-otp",
    "/auth/reset-password",
    "/auth/logout",
    "/auth/refresh",
];

/// Check whether a request path targets a public (unauthenticated) endpoint.
#[must_use]
pub fn is_public_endpoint(path: &str) -> bool {
    PUBLIC_ENDPOINTS.iter().any(|endpoint| path.contains(endpoint))
}

/// Configuration for the API client and its collaborators.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://api.storefront.example`.
    pub base_url: String,
    /// API version segment, e.g. `v1`.
    pub version: String,
    /// Timeout for ordinary requests.
    pub request_timeout: Duration,
    /// Dedicated timeout for the token refresh call.
    pub refresh_timeout: Duration,
    /// Circuit breaker tuning.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.storefront.example".to_string(),
            version: "v1".to_string(),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(15),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create a configuration for the given backend origin with defaults for
    /// everything else.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Build the full URL for an API path.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}{}", self.base_url, self.version, path)
    }
}

/// Backend endpoint paths, grouped by resource.
pub mod endpoints {
    /// Session and credential endpoints.
    pub mod auth {
        pub const LOGIN: &str = "/auth/login";
        pub const REGISTER: &str = "/auth/register";
        pub const REFRESH: &str = "/auth/refresh";
        pub const LOGOUT: &str = "/auth/logout";
        pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
        pub const VERIFY_OTP: &str = "/auth/verify-otp";
        pub const RESET_PASSWORD: &str = "/auth/reset-password";
    }

    /// Product catalogue endpoints.
    pub mod products {
        pub const LIST: &str = "/products";

        #[must_use]
        pub fn details(slug: &str) -> String {
            format!("/products/{slug}")
        }
    }

    /// Category endpoints.
    pub mod categories {
        pub const LIST: &str = "/categories";
    }

    /// Cart endpoints.
    pub mod cart {
        pub const ITEMS: &str = "/cart/items";
        pub const CLEAR: &str = "/cart/clear";

        #[must_use]
        pub fn item(item_id: &str) -> String {
            format!("/cart/items/{item_id}")
        }
    }

    /// Order endpoints.
    pub mod orders {
        pub const ROOT: &str = "/orders";

        #[must_use]
        pub fn details(order_id: &str) -> String {
            format!("/orders/{order_id}")
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration and endpoint classification.

    use super::*;

    #[test]
    fn joins_api_urls_with_version_segment() {
        let config = ApiConfig::new("https://api.storefront.example");
        assert_eq!(
            config.api_url("/products"),
            "https://api.storefront.example/api/v1/products"
        );
    }

    #[test]
    fn classifies_public_endpoints() {
        assert!(is_public_endpoint("/auth/login"));
        assert!(is_public_endpoint("/auth/refresh"));
        assert!(is_public_endpoint("/auth/verify-otp"));
        // Full URLs classify the same way as bare paths.
        assert!(is_public_endpoint("https://api.storefront.example/api/v1/auth/logout"));
    }

    #[test]
    fn classifies_protected_endpoints() {
        assert!(!is_public_endpoint("/products"));
        assert!(!is_public_endpoint("/cart/items"));
        assert!(!is_public_endpoint("/users/42"));
    }

    #[test]
    fn default_timeouts_match_design() {
        let config = ApiConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.refresh_timeout, Duration::from_secs(15));
    }
}
