//! Resilience patterns for the API access layer.
//!
//! Currently a single pattern: a process-wide circuit breaker that stops
//! hammering a failing backend and broadcasts availability to the UI's
//! connectivity gate.

pub mod circuit_breaker;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, Clock, MockClock, SystemClock,
};
