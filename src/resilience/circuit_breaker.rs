//! Consecutive-failure circuit breaker with lazy close.
//!
//! Tracks request failures across the whole process and opens a global
//! "service unavailable" gate once a streak reaches the configured
//! threshold. There is no background timer: the open→closed transition is
//! evaluated lazily inside [`CircuitBreaker::is_open`], which is acceptable
//! because the gate is only consulted right before issuing a request.
//!
//! State changes are broadcast on a [`tokio::sync::watch`] channel so the
//! application's connectivity gate can block navigation while the flag is
//! raised.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};

/// Trait for time operations to enable deterministic testing.
///
/// Production code uses [`SystemClock`]; tests use [`MockClock`] to step
/// through the reset window without real delays.
pub trait Clock: Send + Sync + 'static {
    /// Current instant (monotonic time).
    fn now(&self) -> Instant;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Mock clock for deterministic tests.
///
/// Clones share the same elapsed offset, so a test can hold one handle and
/// advance time for a breaker holding another.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a mock clock anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failure streak length that opens the circuit.
    pub max_consecutive_failures: u32,
    /// How long the circuit stays open before the lazy reset.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { max_consecutive_failures: 5, reset_timeout: Duration::from_secs(30) }
    }
}

#[derive(Debug)]
struct BreakerState {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

/// Process-wide gate over a failing backend.
///
/// Construct once at startup and share by `Arc`; every request flow must
/// read and mutate the same instance for the streak to mean anything.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
    // watch value is the "service unavailable" flag consumed by the UI gate
    availability: watch::Sender<bool>,
    clock: C,
}

impl CircuitBreaker<SystemClock> {
    /// Create a breaker with the given configuration and the system clock.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create a breaker with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a breaker with a custom clock (useful for testing).
    #[must_use]
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> Self {
        let (availability, _) = watch::channel(false);
        Self {
            config,
            state: Mutex::new(BreakerState { consecutive_failures: 0, open_until: None }),
            availability,
            clock,
        }
    }

    /// Subscribe to the "service unavailable" broadcast.
    ///
    /// The value flips to `true` when the circuit opens and back to `false`
    /// on any reset.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.availability.subscribe()
    }

    /// Check whether the circuit is open.
    ///
    /// This is the only path that reports "open", and also the only path
    /// that performs the lazy open→closed reset once the window elapses.
    /// Callers must consult it before issuing a request; the breaker does
    /// not enforce the gate itself.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock();
        match state.open_until {
            Some(open_until) if self.clock.now() < open_until => true,
            Some(_) => {
                self.reset_locked(&mut state);
                false
            }
            None => false,
        }
    }

    /// Record a failed request, opening the circuit at the threshold.
    ///
    /// Failures past the threshold extend the open window.
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.consecutive_failures += 1;

        if state.consecutive_failures >= self.config.max_consecutive_failures {
            state.open_until = Some(self.clock.now() + self.config.reset_timeout);
            warn!(
                failures = state.consecutive_failures,
                timeout_secs = self.config.reset_timeout.as_secs(),
                "circuit breaker opened"
            );
            self.availability.send_replace(true);
        }
    }

    /// Record a successful request. Any success wipes the failure streak,
    /// even when the circuit never fully opened.
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.consecutive_failures > 0 {
            self.reset_locked(&mut state);
        }
    }

    /// Force the circuit closed and clear the streak.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        self.reset_locked(&mut state);
    }

    /// Remaining open time, for user-facing retry countdowns.
    #[must_use]
    pub fn remaining_open_time(&self) -> Duration {
        let state = self.state.lock();
        match state.open_until {
            Some(open_until) => open_until.saturating_duration_since(self.clock.now()),
            None => Duration::ZERO,
        }
    }

    /// Current failure streak length.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.state.lock().consecutive_failures
    }

    fn reset_locked(&self, state: &mut BreakerState) {
        if state.open_until.is_some() {
            info!("circuit breaker closed");
        }
        state.consecutive_failures = 0;
        state.open_until = None;
        self.availability.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for circuit breaker state transitions.

    use super::*;

    fn breaker_with_mock(
        max_consecutive_failures: u32,
        reset_timeout: Duration,
    ) -> (CircuitBreaker<MockClock>, MockClock) {
        let clock = MockClock::new();
        let config = CircuitBreakerConfig { max_consecutive_failures, reset_timeout };
        (CircuitBreaker::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn opens_exactly_at_threshold() {
        let (breaker, _clock) = breaker_with_mock(5, Duration::from_secs(30));

        for _ in 0..4 {
            breaker.record_failure();
            assert!(!breaker.is_open(), "should stay closed below the threshold");
        }

        breaker.record_failure();
        assert!(breaker.is_open(), "should open at the threshold");
    }

    #[test]
    fn lazy_close_resets_streak_after_window() {
        let (breaker, clock) = breaker_with_mock(2, Duration::from_secs(30));

        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.is_open());

        clock.advance(Duration::from_secs(29));
        assert!(breaker.is_open(), "window not elapsed yet");

        clock.advance(Duration::from_secs(2));
        assert!(!breaker.is_open(), "lazy reset once the window elapses");
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn success_wipes_partial_streak() {
        let (breaker, _clock) = breaker_with_mock(5, Duration::from_secs(30));

        breaker.record_failure();
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.failure_count(), 0);

        // The full threshold is needed again to open.
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert!(!breaker.is_open());
        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn remaining_time_counts_down_and_floors_at_zero() {
        let (breaker, clock) = breaker_with_mock(1, Duration::from_secs(30));

        assert_eq!(breaker.remaining_open_time(), Duration::ZERO);

        breaker.record_failure();
        assert_eq!(breaker.remaining_open_time(), Duration::from_secs(30));

        clock.advance(Duration::from_secs(10));
        assert_eq!(breaker.remaining_open_time(), Duration::from_secs(20));

        clock.advance(Duration::from_secs(40));
        assert_eq!(breaker.remaining_open_time(), Duration::ZERO);
    }

    #[test]
    fn failures_past_threshold_extend_the_window() {
        let (breaker, clock) = breaker_with_mock(1, Duration::from_secs(30));

        breaker.record_failure();
        clock.advance(Duration::from_secs(20));
        breaker.record_failure();

        assert_eq!(breaker.remaining_open_time(), Duration::from_secs(30));
    }

    #[test]
    fn broadcasts_availability_transitions() {
        let (breaker, clock) = breaker_with_mock(1, Duration::from_secs(30));
        let rx = breaker.subscribe();
        assert!(!*rx.borrow());

        breaker.record_failure();
        assert!(*rx.borrow(), "open should raise the unavailable flag");

        clock.advance(Duration::from_secs(31));
        assert!(!breaker.is_open());
        assert!(!*rx.borrow(), "lazy close should clear the flag");
    }

    #[test]
    fn manual_reset_closes_the_circuit() {
        let (breaker, _clock) = breaker_with_mock(1, Duration::from_secs(30));

        breaker.record_failure();
        assert!(breaker.is_open());

        breaker.reset();
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }
}
